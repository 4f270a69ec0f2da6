//! Error and result types.

use crate::qname::QName;
use std::fmt;
use strum_macros::Display;
use thiserror::Error;

/// The error type shared by parsing, serialization, and schema navigation.
///
/// Every variant that can occur mid-traversal carries the schema path at
/// which it happened, so callers can render a precise diagnostic.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    /// Malformed token stream, wrong nesting, or wrong list arity.
    #[error("malformed input at {path}: {msg}")]
    Structural {
        /// Schema path at the failure point.
        path: String,
        /// What went wrong.
        msg: String,
    },
    /// An input key did not resolve to any schema child (strict mode only).
    #[error("schema node with name '{name}' was not found under {path}")]
    UnknownElement {
        /// Schema path at the failure point.
        path: String,
        /// The offending input key.
        name: String,
    },
    /// An unprefixed input key matched children in more than one module.
    #[error(
        "name '{name}' under {path} is ambiguous; qualify it with one of the modules: {}",
        modules.join(", ")
    )]
    AmbiguousElement {
        /// Schema path at the failure point.
        path: String,
        /// The offending input key.
        name: String,
        /// Names of every module contributing a namesake child.
        modules: Vec<String>,
    },
    /// A literal did not match the declared type's wire grammar.
    #[error("invalid value at {path}: {msg}")]
    InvalidValue {
        /// Schema path of the node being decoded.
        path: String,
        /// What went wrong.
        msg: String,
    },
    /// A list entry was closed without all of its declared key leaves.
    #[error("list {list} entry is missing key leaves: {}", fmt_qnames(missing))]
    MissingKey {
        /// The list's name.
        list: QName,
        /// The key leaves absent from the entry.
        missing: Vec<QName>,
    },
    /// A value cannot be represented in the target wire variant.
    #[error("cannot encode {path}: {msg}")]
    Encode {
        /// Schema path of the node being encoded.
        path: String,
        /// The underlying structural cause.
        msg: String,
    },
    /// A schema-tree lookup failed during navigation.
    #[error("schema node {name} does not exist under {path}")]
    NotFound {
        /// Schema path at the failure point.
        path: String,
        /// The name that failed to resolve.
        name: String,
    },
}

impl CodecError {
    /// Fill in an empty path slot. Codecs produce errors without positional
    /// context; the state machines add it on the way out.
    pub(crate) fn at_path(self, at: &str) -> CodecError {
        match self {
            CodecError::Structural { path, msg } if path.is_empty() => CodecError::Structural {
                path: at.to_string(),
                msg,
            },
            CodecError::InvalidValue { path, msg } if path.is_empty() => CodecError::InvalidValue {
                path: at.to_string(),
                msg,
            },
            CodecError::Encode { path, msg } if path.is_empty() => CodecError::Encode {
                path: at.to_string(),
                msg,
            },
            other => other,
        }
    }
}

fn fmt_qnames(names: &[QName]) -> String {
    let parts: Vec<String> = names.iter().map(|q| q.to_string()).collect();
    parts.join(", ")
}

/// Shortcut for building a [`CodecError::InvalidValue`] without positional
/// context; the caller's state machine fills the path in.
pub(crate) fn invalid_value<M: Into<String>>(msg: M) -> CodecError {
    CodecError::InvalidValue {
        path: String::new(),
        msg: msg.into(),
    }
}

/// Shortcut for building a [`CodecError::Encode`] without positional context.
pub(crate) fn encode_error<M: Into<String>>(msg: M) -> CodecError {
    CodecError::Encode {
        path: String::new(),
        msg: msg.into(),
    }
}

/// A `Result` carrying a [`CodecError`].
pub type CodecResult<T> = Result<T, CodecError>;

/// Severity of an [`ErrorRecord`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display)]
#[allow(missing_docs)]
pub enum Severity {
    Error,
    Warning,
}

/// Coarse error category, suitable for mapping onto protocol-level
/// diagnostics.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display)]
#[allow(missing_docs)]
pub enum ErrorCategory {
    MalformedInput,
    UnknownElement,
    InvalidValue,
    MissingElement,
    EncodeFailure,
}

/// Structured detail attached to some error records.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorDetail {
    /// Key leaves missing from a list entry.
    MissingKeys(Vec<QName>),
    /// Module names that could disambiguate a namesake collision.
    CandidateModules(Vec<String>),
}

/// One structured error record from a failed parse.
#[derive(Debug, PartialEq)]
pub struct ErrorRecord {
    /// How serious the record is.
    pub severity: Severity,
    /// Coarse category.
    pub category: ErrorCategory,
    /// Human-readable message.
    pub message: String,
    /// Optional structured detail.
    pub detail: Option<ErrorDetail>,
}

impl From<CodecError> for ErrorRecord {
    fn from(err: CodecError) -> ErrorRecord {
        let message = err.to_string();
        let (category, detail) = match err {
            CodecError::Structural { .. } => (ErrorCategory::MalformedInput, None),
            CodecError::UnknownElement { .. } | CodecError::NotFound { .. } => {
                (ErrorCategory::UnknownElement, None)
            }
            CodecError::AmbiguousElement { modules, .. } => (
                ErrorCategory::UnknownElement,
                Some(ErrorDetail::CandidateModules(modules)),
            ),
            CodecError::InvalidValue { .. } => (ErrorCategory::InvalidValue, None),
            CodecError::MissingKey { missing, .. } => (
                ErrorCategory::MissingElement,
                Some(ErrorDetail::MissingKeys(missing)),
            ),
            CodecError::Encode { .. } => (ErrorCategory::EncodeFailure, None),
        };
        ErrorRecord {
            severity: Severity::Error,
            category,
            message,
            detail,
        }
    }
}

/// A non-empty list of error records, returned when a parse fails.
#[derive(Debug, PartialEq)]
pub struct ParseErrors(pub Vec<ErrorRecord>);

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rec) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{} [{}]: {}", rec.severity, rec.category, rec.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}

impl From<CodecError> for ParseErrors {
    fn from(err: CodecError) -> ParseErrors {
        ParseErrors(vec![err.into()])
    }
}

//! Primitive token streams: the pull-based reader the parser consumes and
//! the push-based sink the serializer fills.
//!
//! The reader interface assumes transport framing has already been stripped;
//! [`ValueReader`] walks an in-memory [`serde_json::Value`], which is how
//! JSON text enters this crate (via `serde_json::from_str` or
//! `from_reader`). The writer side produces JSON text directly, with an
//! optional pretty-print indent.

use crate::util::{CodecError, CodecResult};
use serde_json::Value as JsonValue;
use std::collections::VecDeque;
use strum_macros::Display;

/// The kind of the next token in a stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display)]
#[allow(missing_docs)]
pub enum TokenKind {
    BeginObject,
    EndObject,
    BeginArray,
    EndArray,
    Key,
    Scalar,
    EndOfInput,
}

/// A scalar wire token. The distinction between a quoted string and a bare
/// number is preserved, because the type codecs accept both forms for some
/// types and neither is re-interpreted before decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// A JSON string.
    String(String),
    /// A JSON number, kept as its literal text.
    Number(String),
    /// A JSON boolean.
    Bool(bool),
    /// A JSON null.
    Null,
}

impl Scalar {
    /// The token's text, regardless of how it was quoted.
    pub fn text(&self) -> String {
        match self {
            Scalar::String(s) => s.clone(),
            Scalar::Number(n) => n.clone(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Null => "null".to_string(),
        }
    }
}

/// A pull-based cursor over primitive JSON-family events.
pub trait TokenReader {
    /// The kind of the next token, without consuming it.
    fn peek(&self) -> TokenKind;
    /// Consume a begin-object token.
    fn begin_object(&mut self) -> CodecResult<()>;
    /// Consume an end-object token.
    fn end_object(&mut self) -> CodecResult<()>;
    /// Consume a begin-array token.
    fn begin_array(&mut self) -> CodecResult<()>;
    /// Consume an end-array token.
    fn end_array(&mut self) -> CodecResult<()>;
    /// Consume the next object key.
    fn next_key(&mut self) -> CodecResult<String>;
    /// Consume the next scalar.
    fn scalar(&mut self) -> CodecResult<Scalar>;
    /// Current nesting depth; 0 before any begin token.
    fn depth(&self) -> usize;
    /// Skip the next value (scalar or whole subtree).
    fn skip_value(&mut self) -> CodecResult<()>;
    /// Consume the next value as an opaque subtree.
    fn capture_value(&mut self) -> CodecResult<JsonValue>;
}

enum Frame<'a> {
    Root(Option<&'a JsonValue>),
    Object {
        entries: VecDeque<(&'a String, &'a JsonValue)>,
        // Set by next_key, cleared when its value is consumed.
        pending: Option<&'a JsonValue>,
    },
    Array {
        items: VecDeque<&'a JsonValue>,
    },
}

/// A [`TokenReader`] over an already-deserialized [`serde_json::Value`].
pub struct ValueReader<'a> {
    frames: Vec<Frame<'a>>,
}

impl<'a> ValueReader<'a> {
    /// Create a reader positioned before `value`.
    pub fn new(value: &'a JsonValue) -> ValueReader<'a> {
        ValueReader {
            frames: vec![Frame::Root(Some(value))],
        }
    }

    fn kind_of(value: &JsonValue) -> TokenKind {
        match value {
            JsonValue::Object(_) => TokenKind::BeginObject,
            JsonValue::Array(_) => TokenKind::BeginArray,
            _ => TokenKind::Scalar,
        }
    }

    // The value the next begin/scalar token would consume, if any.
    fn peek_value(&self) -> Option<&'a JsonValue> {
        match self.frames.last() {
            Some(Frame::Root(v)) => *v,
            Some(Frame::Object { pending, .. }) => *pending,
            Some(Frame::Array { items }) => items.front().copied(),
            None => None,
        }
    }

    fn take_value(&mut self, expected: TokenKind) -> CodecResult<&'a JsonValue> {
        let got = self.peek();
        let value = match self.frames.last_mut() {
            Some(Frame::Root(v)) => v.take(),
            Some(Frame::Object { pending, .. }) => pending.take(),
            Some(Frame::Array { items }) => items.pop_front(),
            None => None,
        };
        match value {
            Some(v) if Self::kind_of(v) == expected || expected == TokenKind::Scalar => Ok(v),
            _ => Err(self.unexpected(expected, got)),
        }
    }

    fn unexpected(&self, expected: TokenKind, got: TokenKind) -> CodecError {
        CodecError::Structural {
            path: String::new(),
            msg: format!("expected {} but found {}", expected, got),
        }
    }
}

impl TokenReader for ValueReader<'_> {
    fn peek(&self) -> TokenKind {
        match self.frames.last() {
            None | Some(Frame::Root(None)) => TokenKind::EndOfInput,
            Some(Frame::Root(Some(v))) => Self::kind_of(v),
            Some(Frame::Object { pending, entries }) => match pending {
                Some(v) => Self::kind_of(v),
                None if entries.is_empty() => TokenKind::EndObject,
                None => TokenKind::Key,
            },
            Some(Frame::Array { items }) => match items.front() {
                Some(v) => Self::kind_of(v),
                None => TokenKind::EndArray,
            },
        }
    }

    fn begin_object(&mut self) -> CodecResult<()> {
        let value = self.take_value(TokenKind::BeginObject)?;
        match value {
            JsonValue::Object(map) => {
                self.frames.push(Frame::Object {
                    entries: map.iter().collect(),
                    pending: None,
                });
                Ok(())
            }
            _ => unreachable!("take_value checked the kind"),
        }
    }

    fn end_object(&mut self) -> CodecResult<()> {
        match self.frames.last() {
            Some(Frame::Object { pending: None, entries }) if entries.is_empty() => {
                self.frames.pop();
                Ok(())
            }
            _ => Err(self.unexpected(TokenKind::EndObject, self.peek())),
        }
    }

    fn begin_array(&mut self) -> CodecResult<()> {
        let value = self.take_value(TokenKind::BeginArray)?;
        match value {
            JsonValue::Array(items) => {
                self.frames.push(Frame::Array {
                    items: items.iter().collect(),
                });
                Ok(())
            }
            _ => unreachable!("take_value checked the kind"),
        }
    }

    fn end_array(&mut self) -> CodecResult<()> {
        match self.frames.last() {
            Some(Frame::Array { items }) if items.is_empty() => {
                self.frames.pop();
                Ok(())
            }
            _ => Err(self.unexpected(TokenKind::EndArray, self.peek())),
        }
    }

    fn next_key(&mut self) -> CodecResult<String> {
        let got = self.peek();
        match self.frames.last_mut() {
            Some(Frame::Object { entries, pending }) if pending.is_none() => {
                match entries.pop_front() {
                    Some((key, value)) => {
                        *pending = Some(value);
                        Ok(key.clone())
                    }
                    None => Err(self.unexpected(TokenKind::Key, got)),
                }
            }
            _ => Err(self.unexpected(TokenKind::Key, got)),
        }
    }

    fn scalar(&mut self) -> CodecResult<Scalar> {
        let value = self.take_value(TokenKind::Scalar)?;
        match value {
            JsonValue::Null => Ok(Scalar::Null),
            JsonValue::Bool(b) => Ok(Scalar::Bool(*b)),
            JsonValue::Number(n) => Ok(Scalar::Number(n.to_string())),
            JsonValue::String(s) => Ok(Scalar::String(s.clone())),
            _ => Err(self.unexpected(TokenKind::Scalar, TokenKind::BeginObject)),
        }
    }

    fn depth(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    fn skip_value(&mut self) -> CodecResult<()> {
        self.take_value(TokenKind::Scalar).map(|_| ())
    }

    fn capture_value(&mut self) -> CodecResult<JsonValue> {
        self.take_value(TokenKind::Scalar).map(Clone::clone)
    }
}

/// A push-based sink accepting the same primitive event set.
pub trait TokenWriter {
    /// Begin a JSON object.
    fn begin_object(&mut self) -> CodecResult<()>;
    /// End the current object.
    fn end_object(&mut self) -> CodecResult<()>;
    /// Begin a JSON array.
    fn begin_array(&mut self) -> CodecResult<()>;
    /// End the current array.
    fn end_array(&mut self) -> CodecResult<()>;
    /// Write an object key.
    fn key(&mut self, name: &str) -> CodecResult<()>;
    /// Write a string value.
    fn string_value(&mut self, value: &str) -> CodecResult<()>;
    /// Write a pre-validated numeric literal.
    fn number_value(&mut self, literal: &str) -> CodecResult<()>;
    /// Write a boolean value.
    fn bool_value(&mut self, value: bool) -> CodecResult<()>;
    /// Write a null.
    fn null_value(&mut self) -> CodecResult<()>;
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum ScopeKind {
    Object,
    Array,
}

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    members: usize,
    // An object key has been written and its value is due next.
    key_pending: bool,
}

/// A [`TokenWriter`] producing JSON text in a `String`.
///
/// An indent width of 0 produces compact output; N produces pretty output
/// with N-space indents.
#[derive(Debug)]
pub struct JsonWriter {
    out: String,
    indent: usize,
    scopes: Vec<Scope>,
}

impl JsonWriter {
    /// Create a compact writer.
    pub fn new() -> JsonWriter {
        JsonWriter::with_indent(0)
    }

    /// Create a writer with the given pretty-print indent width.
    pub fn with_indent(indent: usize) -> JsonWriter {
        JsonWriter {
            out: String::new(),
            indent,
            scopes: Vec::new(),
        }
    }

    /// The text produced so far.
    pub fn as_str(&self) -> &str {
        &self.out
    }

    /// Consume the writer, returning the produced text.
    pub fn into_string(self) -> String {
        self.out
    }

    fn pretty(&self) -> bool {
        self.indent > 0
    }

    fn newline_pad(&mut self, level: usize) {
        self.out.push('\n');
        for _ in 0..(level * self.indent) {
            self.out.push(' ');
        }
    }

    // Separator before a new member (key or array element).
    fn before_member(&mut self) {
        let level = self.scopes.len();
        if let Some(scope) = self.scopes.last_mut() {
            if scope.members > 0 {
                self.out.push(',');
            }
            scope.members += 1;
        }
        if self.pretty() && !self.scopes.is_empty() {
            self.newline_pad(level);
        }
    }

    // Bookkeeping before any value token (scalar, begin-object,
    // begin-array).
    fn before_value(&mut self) -> CodecResult<()> {
        match self.scopes.last_mut() {
            Some(scope) if scope.kind == ScopeKind::Object => {
                if !scope.key_pending {
                    return Err(structural("value written without a key"));
                }
                scope.key_pending = false;
                Ok(())
            }
            Some(_) => {
                self.before_member();
                Ok(())
            }
            None => Ok(()),
        }
    }

    // Quotes and escapes per RFC 8259, delegated to serde_json.
    fn push_escaped(&mut self, text: &str) -> CodecResult<()> {
        let quoted = serde_json::to_string(text)
            .map_err(|e| structural(format!("unencodable string: {}", e)))?;
        self.out.push_str(&quoted);
        Ok(())
    }

    fn close_scope(&mut self, kind: ScopeKind, token: char) -> CodecResult<()> {
        match self.scopes.last() {
            Some(scope) if scope.kind == kind && !scope.key_pending => {
                let members = scope.members;
                self.scopes.pop();
                if self.pretty() && members > 0 {
                    let level = self.scopes.len();
                    self.newline_pad(level);
                }
                self.out.push(token);
                Ok(())
            }
            _ => Err(structural(format!("unbalanced '{}'", token))),
        }
    }
}

impl Default for JsonWriter {
    fn default() -> Self {
        JsonWriter::new()
    }
}

fn structural<M: Into<String>>(msg: M) -> CodecError {
    CodecError::Structural {
        path: String::new(),
        msg: msg.into(),
    }
}

impl TokenWriter for JsonWriter {
    fn begin_object(&mut self) -> CodecResult<()> {
        self.before_value()?;
        self.out.push('{');
        self.scopes.push(Scope {
            kind: ScopeKind::Object,
            members: 0,
            key_pending: false,
        });
        Ok(())
    }

    fn end_object(&mut self) -> CodecResult<()> {
        self.close_scope(ScopeKind::Object, '}')
    }

    fn begin_array(&mut self) -> CodecResult<()> {
        self.before_value()?;
        self.out.push('[');
        self.scopes.push(Scope {
            kind: ScopeKind::Array,
            members: 0,
            key_pending: false,
        });
        Ok(())
    }

    fn end_array(&mut self) -> CodecResult<()> {
        self.close_scope(ScopeKind::Array, ']')
    }

    fn key(&mut self, name: &str) -> CodecResult<()> {
        match self.scopes.last() {
            Some(scope) if scope.kind == ScopeKind::Object && !scope.key_pending => {}
            _ => return Err(structural("key written outside an object")),
        }
        self.before_member();
        self.push_escaped(name)?;
        self.out.push(':');
        if self.pretty() {
            self.out.push(' ');
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.key_pending = true;
        }
        Ok(())
    }

    fn string_value(&mut self, value: &str) -> CodecResult<()> {
        self.before_value()?;
        self.push_escaped(value)
    }

    fn number_value(&mut self, literal: &str) -> CodecResult<()> {
        self.before_value()?;
        self.out.push_str(literal);
        Ok(())
    }

    fn bool_value(&mut self, value: bool) -> CodecResult<()> {
        self.before_value()?;
        self.out.push_str(if value { "true" } else { "false" });
        Ok(())
    }

    fn null_value(&mut self) -> CodecResult<()> {
        self.before_value()?;
        self.out.push_str("null");
        Ok(())
    }
}

/// Re-emit an opaque captured subtree (anydata/anyxml bodies) through a
/// token writer.
pub(crate) fn write_json_value(out: &mut dyn TokenWriter, value: &JsonValue) -> CodecResult<()> {
    match value {
        JsonValue::Null => out.null_value(),
        JsonValue::Bool(b) => out.bool_value(*b),
        JsonValue::Number(n) => out.number_value(&n.to_string()),
        JsonValue::String(s) => out.string_value(s),
        JsonValue::Array(items) => {
            out.begin_array()?;
            for item in items {
                write_json_value(out, item)?;
            }
            out.end_array()
        }
        JsonValue::Object(map) => {
            out.begin_object()?;
            for (key, item) in map {
                out.key(key)?;
                write_json_value(out, item)?;
            }
            out.end_object()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_walks_nested_structure() {
        let value: JsonValue =
            serde_json::from_str(r#"{"a": [1, "x"], "b": {"c": true}}"#).unwrap();
        let mut r = ValueReader::new(&value);

        assert_eq!(r.peek(), TokenKind::BeginObject);
        r.begin_object().unwrap();
        assert_eq!(r.next_key().unwrap(), "a");
        r.begin_array().unwrap();
        assert_eq!(r.scalar().unwrap(), Scalar::Number("1".into()));
        assert_eq!(r.scalar().unwrap(), Scalar::String("x".into()));
        assert_eq!(r.peek(), TokenKind::EndArray);
        r.end_array().unwrap();
        assert_eq!(r.next_key().unwrap(), "b");
        assert_eq!(r.depth(), 1);
        r.skip_value().unwrap();
        r.end_object().unwrap();
        assert_eq!(r.peek(), TokenKind::EndOfInput);
    }

    #[test]
    fn reader_rejects_mismatched_tokens() {
        let value: JsonValue = serde_json::from_str("[1]").unwrap();
        let mut r = ValueReader::new(&value);
        assert!(r.begin_object().is_err());
    }

    #[test]
    fn writer_compact_output() {
        let mut w = JsonWriter::new();
        w.begin_object().unwrap();
        w.key("a").unwrap();
        w.number_value("1").unwrap();
        w.key("b").unwrap();
        w.begin_array().unwrap();
        w.string_value("x\"y").unwrap();
        w.end_array().unwrap();
        w.end_object().unwrap();
        assert_eq!(w.as_str(), r#"{"a":1,"b":["x\"y"]}"#);
    }

    #[test]
    fn writer_pretty_output() {
        let mut w = JsonWriter::with_indent(2);
        w.begin_object().unwrap();
        w.key("a").unwrap();
        w.number_value("1").unwrap();
        w.end_object().unwrap();
        assert_eq!(w.as_str(), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn writer_rejects_unbalanced_scopes() {
        let mut w = JsonWriter::new();
        w.begin_object().unwrap();
        assert!(w.end_array().is_err());
        assert!(w.string_value("no key").is_err());
    }
}

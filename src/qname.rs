//! Qualified names, the identity of every schema node and data node.
//!
//! A [`QName`] is a (namespace, optional revision, local name) triple.
//! Equality and ordering ignore any textual prefix the name may have been
//! written with on the wire; two references to the same schema node always
//! compare equal, no matter which module prefix the input used.

use std::fmt;

/// The identity of a module: its namespace URI plus an optional revision
/// date. This is the half of a [`QName`] that prefixes stand in for.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId {
    /// The module's namespace URI.
    pub namespace: String,
    /// The module revision, as a `YYYY-MM-DD` date, if any.
    pub revision: Option<String>,
}

impl ModuleId {
    /// Create a module identity without a revision.
    pub fn new<S: Into<String>>(namespace: S) -> ModuleId {
        ModuleId {
            namespace: namespace.into(),
            revision: None,
        }
    }

    /// Create a module identity with a revision date.
    pub fn with_revision<S: Into<String>, R: Into<String>>(namespace: S, revision: R) -> ModuleId {
        ModuleId {
            namespace: namespace.into(),
            revision: Some(revision.into()),
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.revision {
            Some(rev) => write!(f, "{}?revision={}", self.namespace, rev),
            None => write!(f, "{}", self.namespace),
        }
    }
}

/// A qualified name: module identity plus local name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    /// The module this name belongs to.
    pub module: ModuleId,
    /// The local name within the module.
    pub local_name: String,
}

impl QName {
    /// Create a qualified name in an unrevisioned module namespace.
    pub fn new<S: Into<String>, L: Into<String>>(namespace: S, local_name: L) -> QName {
        QName {
            module: ModuleId::new(namespace),
            local_name: local_name.into(),
        }
    }

    /// Create a qualified name from an existing module identity.
    pub fn of_module<L: Into<String>>(module: ModuleId, local_name: L) -> QName {
        QName {
            module,
            local_name: local_name.into(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}){}", self.module, self.local_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qname_identity_ignores_prefix_spelling() {
        // Two QNames built from different textual sources are equal as long
        // as namespace and local name agree.
        let a = QName::new("urn:example:net", "hop");
        let b = QName::of_module(ModuleId::new("urn:example:net"), "hop");
        assert_eq!(a, b);

        let c = QName::of_module(
            ModuleId::with_revision("urn:example:net", "2024-01-15"),
            "hop",
        );
        assert_ne!(a, c);
    }

    #[test]
    fn qname_display() {
        let q = QName::new("urn:example:net", "hop");
        assert_eq!(format!("{}", q), "(urn:example:net)hop");
    }
}

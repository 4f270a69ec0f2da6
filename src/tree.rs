//! The normalized data tree.
//!
//! Nodes are built bottom-up during parsing and never mutated after their
//! closing event, so downstream consumers can hold them without defensive
//! copies. Choice and case schema nodes are routing only: a selected case's
//! children appear directly under the choice's parent, and parsing never
//! materializes a [`DataNode::Choice`] (the variant exists for callers that
//! assemble trees by hand; the serializer writes its children flat).

use crate::qname::QName;
use crate::value::Value;
use strum_macros::IntoStaticStr;

/// Key predicates of one list entry: one (key leaf, value) pair per declared
/// key, in the list's declared key order.
pub type KeyPredicates = Vec<(QName, Value)>;

/// One node of the normalized tree.
#[derive(Clone, Debug, PartialEq, IntoStaticStr)]
pub enum DataNode {
    /// A container and its children, in input order.
    Container {
        /// The container's name.
        qname: QName,
        /// Child nodes.
        children: Vec<DataNode>,
    },
    /// A keyed list; entries are always [`DataNode::ListEntry`].
    List {
        /// The list's name.
        qname: QName,
        /// Entries in input order.
        entries: Vec<DataNode>,
    },
    /// One list entry. `keys` always contains exactly the list's declared
    /// key leaves; the key leaves also appear among `children`.
    ListEntry {
        /// The list's name.
        qname: QName,
        /// Key predicates in declared key order.
        keys: KeyPredicates,
        /// Child nodes, key leaves included.
        children: Vec<DataNode>,
    },
    /// A leaf-list; entries are always [`DataNode::LeafListEntry`].
    LeafList {
        /// The leaf-list's name.
        qname: QName,
        /// Entries in input order.
        entries: Vec<DataNode>,
    },
    /// One leaf-list entry.
    LeafListEntry {
        /// The leaf-list's name.
        qname: QName,
        /// The entry's value.
        value: Value,
    },
    /// A leaf and its value.
    Leaf {
        /// The leaf's name.
        qname: QName,
        /// The decoded value.
        value: Value,
    },
    /// A choice holding the selected case's children. Never produced by
    /// parsing; serialized transparently.
    Choice {
        /// The choice's name.
        qname: QName,
        /// The selected case's children.
        children: Vec<DataNode>,
    },
    /// An anydata node with an opaque, schema-agnostic body.
    Anydata {
        /// The node's name.
        qname: QName,
        /// The verbatim body.
        body: serde_json::Value,
    },
    /// An anyxml node with an opaque body.
    Anyxml {
        /// The node's name.
        qname: QName,
        /// The verbatim body.
        body: serde_json::Value,
    },
}

impl DataNode {
    /// The node's qualified name.
    pub fn qname(&self) -> &QName {
        match self {
            DataNode::Container { qname, .. }
            | DataNode::List { qname, .. }
            | DataNode::ListEntry { qname, .. }
            | DataNode::LeafList { qname, .. }
            | DataNode::LeafListEntry { qname, .. }
            | DataNode::Leaf { qname, .. }
            | DataNode::Choice { qname, .. }
            | DataNode::Anydata { qname, .. }
            | DataNode::Anyxml { qname, .. } => qname,
        }
    }

    /// Child nodes, if this node has any.
    pub fn children(&self) -> &[DataNode] {
        match self {
            DataNode::Container { children, .. }
            | DataNode::ListEntry { children, .. }
            | DataNode::Choice { children, .. } => children,
            DataNode::List { entries, .. } | DataNode::LeafList { entries, .. } => entries,
            _ => &[],
        }
    }

    /// Find a direct child by qualified name.
    pub fn find_child(&self, qname: &QName) -> Option<&DataNode> {
        self.children().iter().find(|c| c.qname() == qname)
    }

    /// Shortcut for a leaf node.
    pub fn leaf(qname: QName, value: Value) -> DataNode {
        DataNode::Leaf { qname, value }
    }

    /// Shortcut for a container node.
    pub fn container(qname: QName, children: Vec<DataNode>) -> DataNode {
        DataNode::Container { qname, children }
    }

    /// Shortcut for a list node.
    pub fn list(qname: QName, entries: Vec<DataNode>) -> DataNode {
        DataNode::List { qname, entries }
    }
}

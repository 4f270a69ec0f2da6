//! The effective schema model consumed by the parser and serializer.
//!
//! The model is immutable and read-only: it is produced elsewhere (the
//! schema-source compiler is not part of this crate) and queried here while
//! converting between wire form and the normalized tree. All types can be
//! constructed by hand, which is how the tests build their fixtures.

use crate::qname::{ModuleId, QName};
use strum_macros::Display;

/// The kind of a schema node.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display)]
#[allow(missing_docs)]
pub enum NodeKind {
    Container,
    List,
    Leaf,
    LeafList,
    Choice,
    Case,
    Anydata,
    Anyxml,
    RpcInput,
    RpcOutput,
    Action,
    Notification,
}

impl NodeKind {
    /// Kinds that expose named schema-tree children.
    pub fn is_composite(self) -> bool {
        matches!(
            self,
            NodeKind::Container
                | NodeKind::List
                | NodeKind::Choice
                | NodeKind::Case
                | NodeKind::RpcInput
                | NodeKind::RpcOutput
                | NodeKind::Action
                | NodeKind::Notification
        )
    }

    /// Kinds that correspond to a wire-visible data node. Choice and case
    /// nodes are schema-level routing only and never appear in input keys.
    pub fn is_data(self) -> bool {
        !matches!(self, NodeKind::Choice | NodeKind::Case)
    }
}

/// A leaf type descriptor: the type category plus the constraints the codecs
/// need. Range/length/pattern restrictions are enforced by the schema
/// compiler, not here; a restricted type keeps only its base category.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum TypeDesc {
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    /// Fixed-point decimal with 1..=18 fraction digits.
    Decimal64 { fraction_digits: u8 },
    Boolean,
    Empty,
    String,
    /// Opaque binary, base64-encoded on the wire.
    Binary,
    /// Named bits with their declared positions, in declaration order.
    Bits { bits: Vec<(String, u32)> },
    Enumeration { names: Vec<String> },
    /// A reference to an identity derived from `base`.
    IdentityRef { base: QName },
    InstanceIdentifier,
    /// Member types in declared order; decode tries them first to last.
    Union { members: Vec<TypeDesc> },
    /// A type derived from another; codecs delegate to the base.
    Derived(Box<TypeDesc>),
}

/// One node of the schema tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    /// The node's identity.
    pub qname: QName,
    /// What kind of node this is.
    pub kind: NodeKind,
    /// Declared type; present only on leaf and leaf-list nodes.
    pub type_desc: Option<TypeDesc>,
    /// Declared key leaves, in key order; present only on lists.
    pub keys: Vec<QName>,
    /// Named schema-tree children of composite nodes.
    pub children: Vec<SchemaNode>,
}

impl SchemaNode {
    /// Shortcut for a container node.
    pub fn container(qname: QName, children: Vec<SchemaNode>) -> SchemaNode {
        SchemaNode {
            qname,
            kind: NodeKind::Container,
            type_desc: None,
            keys: Vec::new(),
            children,
        }
    }

    /// Shortcut for a keyed list node.
    pub fn list(qname: QName, keys: Vec<QName>, children: Vec<SchemaNode>) -> SchemaNode {
        SchemaNode {
            qname,
            kind: NodeKind::List,
            type_desc: None,
            keys,
            children,
        }
    }

    /// Shortcut for a leaf node.
    pub fn leaf(qname: QName, type_desc: TypeDesc) -> SchemaNode {
        SchemaNode {
            qname,
            kind: NodeKind::Leaf,
            type_desc: Some(type_desc),
            keys: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Shortcut for a leaf-list node.
    pub fn leaf_list(qname: QName, type_desc: TypeDesc) -> SchemaNode {
        SchemaNode {
            qname,
            kind: NodeKind::LeafList,
            type_desc: Some(type_desc),
            keys: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Shortcut for a choice node; children must be cases.
    pub fn choice(qname: QName, cases: Vec<SchemaNode>) -> SchemaNode {
        SchemaNode {
            qname,
            kind: NodeKind::Choice,
            type_desc: None,
            keys: Vec::new(),
            children: cases,
        }
    }

    /// Shortcut for a case node.
    pub fn case(qname: QName, children: Vec<SchemaNode>) -> SchemaNode {
        SchemaNode {
            qname,
            kind: NodeKind::Case,
            type_desc: None,
            keys: Vec::new(),
            children,
        }
    }

    /// Shortcut for an anydata node.
    pub fn anydata(qname: QName) -> SchemaNode {
        SchemaNode {
            qname,
            kind: NodeKind::Anydata,
            type_desc: None,
            keys: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Shortcut for an anyxml node.
    pub fn anyxml(qname: QName) -> SchemaNode {
        SchemaNode {
            qname,
            kind: NodeKind::Anyxml,
            type_desc: None,
            keys: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// An identity declaration, possibly derived from one or more bases.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    /// The identity's name.
    pub qname: QName,
    /// Direct base identities.
    pub bases: Vec<QName>,
}

/// One module of the effective model.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    /// The module name; JSON wire prefixes use this, never the namespace.
    pub name: String,
    /// Namespace plus revision.
    pub id: ModuleId,
    /// Top-level schema-tree nodes.
    pub children: Vec<SchemaNode>,
    /// Module-level grouping definitions.
    pub groupings: Vec<SchemaNode>,
    /// Identity declarations.
    pub identities: Vec<Identity>,
}

impl Module {
    /// Create a module with top-level children and no groupings or
    /// identities.
    pub fn new<S: Into<String>>(name: S, id: ModuleId, children: Vec<SchemaNode>) -> Module {
        Module {
            name: name.into(),
            id,
            children,
            groupings: Vec::new(),
            identities: Vec::new(),
        }
    }
}

/// The immutable, queryable model. Shared read-only by any number of
/// concurrent parse and serialize operations.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaContext {
    modules: Vec<Module>,
}

impl SchemaContext {
    /// Create a model from its modules.
    pub fn new(modules: Vec<Module>) -> SchemaContext {
        SchemaContext { modules }
    }

    /// All modules of the model.
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Look up a module by its name, as used in JSON wire prefixes.
    pub fn find_module_by_name(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Look up a module by namespace and revision.
    pub fn find_module(&self, id: &ModuleId) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == *id)
    }

    /// Look up the module owning a qualified name. A name without a revision
    /// matches any revision of the namespace.
    pub fn module_of(&self, qname: &QName) -> Option<&Module> {
        if qname.module.revision.is_some() {
            self.find_module(&qname.module)
        } else {
            self.modules
                .iter()
                .find(|m| m.id.namespace == qname.module.namespace)
        }
    }

    /// The wire prefix (module name) for a qualified name.
    pub fn module_name_of(&self, qname: &QName) -> Option<&str> {
        self.module_of(qname).map(|m| m.name.as_str())
    }

    /// Look up an identity declaration.
    pub fn find_identity(&self, qname: &QName) -> Option<&Identity> {
        self.module_of(qname)
            .and_then(|m| m.identities.iter().find(|i| i.qname == *qname))
    }

    /// True if `ident` is `base` or transitively derived from it.
    pub fn identity_derived_from(&self, ident: &QName, base: &QName) -> bool {
        if ident == base {
            return true;
        }
        match self.find_identity(ident) {
            Some(decl) => decl
                .bases
                .iter()
                .any(|b| self.identity_derived_from(b, base)),
            None => false,
        }
    }
}

/// Find a wire-visible descendant by namespace and local name, stepping
/// transparently through interposed choice and case nodes. Returns the chain
/// of schema nodes from just below the parent down to the target, so callers
/// can tell which choices and cases were crossed.
pub(crate) fn find_data_child<'a, I>(
    children: I,
    namespace: &str,
    local_name: &str,
) -> Option<Vec<&'a SchemaNode>>
where
    I: IntoIterator<Item = &'a SchemaNode>,
{
    for child in children {
        if child.kind == NodeKind::Choice {
            for case in &child.children {
                if let Some(mut chain) = find_data_child(&case.children, namespace, local_name) {
                    let mut full = vec![child, case];
                    full.append(&mut chain);
                    return Some(full);
                }
            }
        } else if child.kind.is_data()
            && child.qname.local_name == local_name
            && child.qname.module.namespace == namespace
        {
            return Some(vec![child]);
        }
    }
    None
}

/// Find a schema-tree descendant by full qualified name. Unlike
/// [`find_data_child`] this also matches choice and case nodes by their own
/// names, since they are legitimate schema-tree steps.
pub(crate) fn find_schema_child<'a, I>(children: I, qname: &QName) -> Option<Vec<&'a SchemaNode>>
where
    I: IntoIterator<Item = &'a SchemaNode> + Copy,
{
    for child in children {
        if child.qname == *qname {
            return Some(vec![child]);
        }
    }
    // Case children are reachable directly from the choice's parent.
    for child in children {
        if child.kind == NodeKind::Choice {
            for case in &child.children {
                if let Some(mut chain) = find_schema_child_slice(&case.children, qname) {
                    let mut full = vec![child, case];
                    full.append(&mut chain);
                    return Some(full);
                }
            }
        }
    }
    None
}

fn find_schema_child_slice<'a>(
    children: &'a [SchemaNode],
    qname: &QName,
) -> Option<Vec<&'a SchemaNode>> {
    find_schema_child(children, qname)
}

/// Collect the namespaces of every wire-visible child with the given local
/// name, recursing into choices and cases. More than one entry in the result
/// means the unprefixed name is a namesake collision.
pub(crate) fn collect_child_namespaces<'a, I>(children: I, local_name: &str, out: &mut Vec<String>)
where
    I: IntoIterator<Item = &'a SchemaNode>,
{
    for child in children {
        if child.kind == NodeKind::Choice {
            for case in &child.children {
                collect_child_namespaces(&case.children, local_name, out);
            }
        } else if child.kind.is_data() && child.qname.local_name == local_name {
            let ns = &child.qname.module.namespace;
            if !out.contains(ns) {
                out.push(ns.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns() -> &'static str {
        "urn:example:a"
    }

    #[test]
    fn data_child_sees_through_choice() {
        let choice = SchemaNode::choice(
            QName::new(ns(), "transport"),
            vec![SchemaNode::case(
                QName::new(ns(), "tcp"),
                vec![SchemaNode::leaf(QName::new(ns(), "port"), TypeDesc::Uint16)],
            )],
        );
        let children = vec![choice];

        let chain = find_data_child(&children, ns(), "port").unwrap();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain[0].kind, NodeKind::Choice);
        assert_eq!(chain[1].kind, NodeKind::Case);
        assert_eq!(chain[2].qname.local_name, "port");
    }

    #[test]
    fn identity_derivation_is_transitive() {
        let base = QName::new(ns(), "crypto-alg");
        let mid = QName::new(ns(), "aes");
        let leaf_ident = QName::new(ns(), "aes-256");
        let module = Module {
            name: "a".into(),
            id: ModuleId::new(ns()),
            children: Vec::new(),
            groupings: Vec::new(),
            identities: vec![
                Identity {
                    qname: base.clone(),
                    bases: Vec::new(),
                },
                Identity {
                    qname: mid.clone(),
                    bases: vec![base.clone()],
                },
                Identity {
                    qname: leaf_ident.clone(),
                    bases: vec![mid],
                },
            ],
        };
        let ctx = SchemaContext::new(vec![module]);
        assert!(ctx.identity_derived_from(&leaf_ident, &base));
        assert!(!ctx.identity_derived_from(&base, &leaf_ident));
    }
}

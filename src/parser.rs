//! The schema-driven JSON parser.
//!
//! Input arrives as a primitive token stream and leaves as normalized
//! [`DataNode`] trees. The schema drives everything: object keys resolve to
//! schema children (stepping transparently through choices and cases),
//! scalars decode through the per-type codecs, and list entries are checked
//! for key completeness when they close.
//!
//! Member names may carry a `module-name:` prefix. An unprefixed name is
//! resolved against the enclosing node's module first; if namesakes from
//! several modules are visible and the enclosing module is not among them,
//! the name is rejected as ambiguous rather than guessed at.

use crate::codec::JsonCodecFactory;
use crate::qname::QName;
use crate::schema::{collect_child_namespaces, find_data_child, NodeKind, SchemaNode};
use crate::stack::SchemaStack;
use crate::token::{Scalar, TokenKind, TokenReader};
use crate::tree::DataNode;
use crate::util::{CodecError, CodecResult, ParseErrors};
use crate::value::Value;
use std::collections::HashSet;

/// Parses wire-form JSON into normalized data trees.
///
/// A parser is cheap to construct and holds no per-document state; one
/// factory can back any number of parsers.
pub struct JsonParser<'a> {
    codecs: &'a JsonCodecFactory<'a>,
    lenient: bool,
}

impl<'a> JsonParser<'a> {
    /// Create a strict parser: unresolvable member names are errors.
    pub fn new(codecs: &'a JsonCodecFactory<'a>) -> JsonParser<'a> {
        JsonParser {
            codecs,
            lenient: false,
        }
    }

    /// Create a lenient parser: members whose names cannot be resolved are
    /// skipped instead of rejected. All other checks still apply.
    pub fn new_lenient(codecs: &'a JsonCodecFactory<'a>) -> JsonParser<'a> {
        JsonParser {
            codecs,
            lenient: true,
        }
    }

    /// Parse a whole document into top-level nodes.
    ///
    /// Empty input is a valid empty document and yields no nodes.
    pub fn parse(&self, reader: &mut dyn TokenReader) -> Result<Vec<DataNode>, ParseErrors> {
        self.parse_at(reader, &[])
    }

    /// Parse a document whose content lives below `path`, for example the
    /// input of an RPC. Member names at the first level resolve against the
    /// node the path addresses.
    pub fn parse_at(
        &self,
        reader: &mut dyn TokenReader,
        path: &[QName],
    ) -> Result<Vec<DataNode>, ParseErrors> {
        if reader.peek() == TokenKind::EndOfInput {
            return Ok(Vec::new());
        }
        let mut stack = SchemaStack::of_path(self.codecs.model(), path)?;
        let mut parsing = self.start(reader, path);
        parsing.parse_document(&mut stack).map_err(ParseErrors::from)
    }

    /// Parse exactly one entry of the list addressed by `path`. The input
    /// may spell the entry as a bare object or as a one-element array;
    /// any other arity is rejected.
    pub fn parse_list_entry(
        &self,
        reader: &mut dyn TokenReader,
        path: &[QName],
    ) -> Result<DataNode, ParseErrors> {
        let mut stack = SchemaStack::of_path(self.codecs.model(), path)?;
        let node = match stack.current() {
            Some(node) if node.kind == NodeKind::List => node,
            Some(node) => {
                return Err(ParseErrors::from(CodecError::Structural {
                    path: stack.path_string(),
                    msg: format!("{} is a {}, not a list", node.qname, node.kind),
                }))
            }
            None => {
                return Err(ParseErrors::from(CodecError::Structural {
                    path: "/".to_string(),
                    msg: "list entry parsing needs a non-empty path".to_string(),
                }))
            }
        };
        let mut parsing = self.start(reader, path);
        let mut entries = parsing
            .parse_list(node, &mut stack)
            .map_err(ParseErrors::from)?;
        if entries.len() == 1 {
            Ok(entries.remove(0))
        } else {
            Err(ParseErrors::from(CodecError::Structural {
                path: stack.path_string(),
                msg: format!(
                    "expected exactly 1 entry for list {}, found {}",
                    node.qname,
                    entries.len()
                ),
            }))
        }
    }

    fn start<'r>(&self, reader: &'r mut dyn TokenReader, path: &[QName]) -> Parsing<'a, 'r> {
        Parsing {
            codecs: self.codecs,
            lenient: self.lenient,
            reader,
            ns_scope: path.iter().map(|q| q.module.namespace.clone()).collect(),
        }
    }
}

// State of one in-progress parse: the token cursor plus the namespace scope
// used to resolve unprefixed member names.
struct Parsing<'a, 'r> {
    codecs: &'a JsonCodecFactory<'a>,
    lenient: bool,
    reader: &'r mut dyn TokenReader,
    ns_scope: Vec<String>,
}

impl<'a> Parsing<'a, '_> {
    fn parse_document(&mut self, stack: &mut SchemaStack<'a>) -> CodecResult<Vec<DataNode>> {
        self.reader
            .begin_object()
            .map_err(|e| e.at_path(&stack.path_string()))?;
        let nodes = self.parse_body(stack)?;
        self.reader
            .end_object()
            .map_err(|e| e.at_path(&stack.path_string()))?;
        Ok(nodes)
    }

    fn parse_body(&mut self, stack: &mut SchemaStack<'a>) -> CodecResult<Vec<DataNode>> {
        let mut out = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        while self.reader.peek() == TokenKind::Key {
            let key = self.reader.next_key()?;
            if !seen.insert(key.clone()) {
                return Err(CodecError::Structural {
                    path: stack.path_string(),
                    msg: format!("duplicate member '{}'", key),
                });
            }
            let target = match self.resolve(&key, stack)? {
                Some(qname) => qname,
                None => {
                    self.reader.skip_value()?;
                    continue;
                }
            };
            let node = stack.enter_schema(&target)?;
            self.ns_scope.push(node.qname.module.namespace.clone());
            let parsed = self.parse_node(node, stack);
            self.ns_scope.pop();
            match parsed {
                Ok(data) => {
                    stack.exit()?;
                    out.push(data);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }

    // Turn a raw member name into the qualified name of a schema child, or
    // None when the parser is lenient and the name does not resolve.
    fn resolve(&mut self, key: &str, stack: &SchemaStack<'a>) -> CodecResult<Option<QName>> {
        let model = self.codecs.model();
        // A prefix is everything before the last colon; local names never
        // contain one.
        let (prefix, local) = match key.rsplit_once(':') {
            Some((p, l)) => (Some(p), l),
            None => (None, key),
        };
        let namespace = match prefix {
            Some(p) => match model.find_module_by_name(p) {
                Some(module) => module.id.namespace.clone(),
                None if self.lenient => return Ok(None),
                None => return Err(self.unknown(stack, key)),
            },
            None => {
                let mut candidates: Vec<String> = Vec::new();
                match stack.current() {
                    None => {
                        for module in model.modules() {
                            collect_child_namespaces(&module.children, local, &mut candidates);
                        }
                    }
                    Some(node) => {
                        collect_child_namespaces(&node.children, local, &mut candidates)
                    }
                }
                match candidates.len() {
                    0 if self.lenient => return Ok(None),
                    0 => return Err(self.unknown(stack, key)),
                    1 => candidates.remove(0),
                    _ => {
                        // The enclosing module wins a namesake race; without
                        // it the name stays ambiguous.
                        let current = self
                            .ns_scope
                            .last()
                            .filter(|c| candidates.iter().any(|n| n == *c));
                        match current {
                            Some(ns) => ns.clone(),
                            None => {
                                let modules = candidates
                                    .iter()
                                    .filter_map(|ns| {
                                        model.modules().iter().find(|m| m.id.namespace == *ns)
                                    })
                                    .map(|m| m.name.clone())
                                    .collect();
                                return Err(CodecError::AmbiguousElement {
                                    path: stack.path_string(),
                                    name: key.to_string(),
                                    modules,
                                });
                            }
                        }
                    }
                }
            }
        };
        let chain = match stack.current() {
            None => model
                .modules()
                .iter()
                .find(|m| m.id.namespace == namespace)
                .and_then(|m| find_data_child(&m.children, &namespace, local)),
            Some(node) => find_data_child(&node.children, &namespace, local),
        };
        match chain {
            Some(chain) => {
                let target = *chain.last().expect("non-empty chain");
                Ok(Some(target.qname.clone()))
            }
            None if self.lenient => Ok(None),
            None => Err(self.unknown(stack, key)),
        }
    }

    fn parse_node(
        &mut self,
        node: &'a SchemaNode,
        stack: &mut SchemaStack<'a>,
    ) -> CodecResult<DataNode> {
        match node.kind {
            NodeKind::Container
            | NodeKind::RpcInput
            | NodeKind::RpcOutput
            | NodeKind::Action
            | NodeKind::Notification => {
                let children = self.parse_document(stack)?;
                Ok(DataNode::Container {
                    qname: node.qname.clone(),
                    children,
                })
            }
            NodeKind::List => {
                let entries = self.parse_list(node, stack)?;
                Ok(DataNode::List {
                    qname: node.qname.clone(),
                    entries,
                })
            }
            NodeKind::LeafList => {
                let path = stack.path_string();
                self.reader.begin_array().map_err(|e| e.at_path(&path))?;
                let mut entries = Vec::new();
                while self.reader.peek() != TokenKind::EndArray {
                    let value = self.parse_leaf_value(node, stack)?;
                    entries.push(DataNode::LeafListEntry {
                        qname: node.qname.clone(),
                        value,
                    });
                }
                self.reader.end_array().map_err(|e| e.at_path(&path))?;
                Ok(DataNode::LeafList {
                    qname: node.qname.clone(),
                    entries,
                })
            }
            NodeKind::Leaf => {
                let value = self.parse_leaf_value(node, stack)?;
                Ok(DataNode::Leaf {
                    qname: node.qname.clone(),
                    value,
                })
            }
            NodeKind::Anydata => Ok(DataNode::Anydata {
                qname: node.qname.clone(),
                body: self.reader.capture_value()?,
            }),
            NodeKind::Anyxml => Ok(DataNode::Anyxml {
                qname: node.qname.clone(),
                body: self.reader.capture_value()?,
            }),
            NodeKind::Choice | NodeKind::Case => Err(CodecError::Structural {
                path: stack.path_string(),
                msg: format!("{} {} is not a wire-visible node", node.kind, node.qname),
            }),
        }
    }

    fn parse_list(
        &mut self,
        node: &'a SchemaNode,
        stack: &mut SchemaStack<'a>,
    ) -> CodecResult<Vec<DataNode>> {
        let mut entries = Vec::new();
        match self.reader.peek() {
            TokenKind::BeginArray => {
                self.reader
                    .begin_array()
                    .map_err(|e| e.at_path(&stack.path_string()))?;
                while self.reader.peek() != TokenKind::EndArray {
                    entries.push(self.parse_entry(node, stack)?);
                }
                self.reader
                    .end_array()
                    .map_err(|e| e.at_path(&stack.path_string()))?;
            }
            // A bare object is accepted as a single-entry list.
            TokenKind::BeginObject => entries.push(self.parse_entry(node, stack)?),
            other => {
                return Err(CodecError::Structural {
                    path: stack.path_string(),
                    msg: format!("expected an array for list {}, found {}", node.qname, other),
                })
            }
        }
        Ok(entries)
    }

    fn parse_entry(
        &mut self,
        node: &'a SchemaNode,
        stack: &mut SchemaStack<'a>,
    ) -> CodecResult<DataNode> {
        let children = self.parse_document(stack)?;
        let mut keys = Vec::with_capacity(node.keys.len());
        let mut missing = Vec::new();
        for key in &node.keys {
            match children.iter().find(|c| c.qname() == key) {
                Some(DataNode::Leaf { value, .. }) => keys.push((key.clone(), value.clone())),
                _ => missing.push(key.clone()),
            }
        }
        if !missing.is_empty() {
            return Err(CodecError::MissingKey {
                list: node.qname.clone(),
                missing,
            });
        }
        Ok(DataNode::ListEntry {
            qname: node.qname.clone(),
            keys,
            children,
        })
    }

    fn parse_leaf_value(
        &mut self,
        node: &'a SchemaNode,
        stack: &SchemaStack<'a>,
    ) -> CodecResult<Value> {
        let path = stack.path_string();
        let ty = node.type_desc.as_ref().ok_or_else(|| CodecError::Structural {
            path: path.clone(),
            msg: format!("{} has no type", node.qname),
        })?;
        let codec = self.codecs.codec_for(ty, &node.qname.module);
        if self.reader.peek() == TokenKind::BeginArray {
            // The empty type is spelled [null].
            if !codec.has_empty() {
                return Err(CodecError::InvalidValue {
                    path,
                    msg: "unexpected array value".to_string(),
                });
            }
            self.reader.begin_array().map_err(|e| e.at_path(&path))?;
            let scalar = self.reader.scalar().map_err(|e| e.at_path(&path))?;
            self.reader.end_array().map_err(|e| e.at_path(&path))?;
            return match scalar {
                Scalar::Null => Ok(Value::Empty),
                other => Err(CodecError::InvalidValue {
                    path,
                    msg: format!("expected [null], found '{}'", other.text()),
                }),
            };
        }
        let scalar = self.reader.scalar().map_err(|e| e.at_path(&path))?;
        codec
            .decode(&scalar, self.codecs.model())
            .map_err(|e| e.at_path(&path))
    }

    fn unknown(&self, stack: &SchemaStack<'a>, key: &str) -> CodecError {
        CodecError::UnknownElement {
            path: stack.path_string(),
            name: key.to_string(),
        }
    }
}

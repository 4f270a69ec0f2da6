//! The schema-driven JSON serializer.
//!
//! Writes normalized [`DataNode`] trees back into wire-form JSON through a
//! [`TokenWriter`]. Member names carry a `module-name:` prefix exactly when
//! the member's module differs from its parent's; choice nodes are written
//! transparently, so their presence in a hand-built tree leaves no trace on
//! the wire.

use crate::codec::JsonCodecFactory;
use crate::qname::QName;
use crate::stack::SchemaStack;
use crate::token::{write_json_value, JsonWriter, TokenWriter};
use crate::tree::DataNode;
use crate::util::{encode_error, CodecError, CodecResult};
use crate::value::Value;

enum Mode {
    Exclusive,
    Nested {
        path: Vec<QName>,
        // Module name for first-level bare emission, overriding the one
        // derived from the path.
        module: Option<String>,
    },
}

/// Serializes data trees to wire-form JSON.
pub struct JsonStreamWriter<'a> {
    codecs: &'a JsonCodecFactory<'a>,
    mode: Mode,
}

impl<'a> JsonStreamWriter<'a> {
    /// A writer that emits a complete document: the given nodes become the
    /// members of a fresh top-level object, each qualified with its module
    /// name.
    pub fn exclusive(codecs: &'a JsonCodecFactory<'a>) -> JsonStreamWriter<'a> {
        JsonStreamWriter {
            codecs,
            mode: Mode::Exclusive,
        }
    }

    /// A writer that emits the body of one node as an object, for splicing
    /// into an enclosing document. `path` addresses the node whose body is
    /// written; first-level members of the same module stay unprefixed.
    pub fn nested(codecs: &'a JsonCodecFactory<'a>, path: &[QName]) -> JsonStreamWriter<'a> {
        JsonStreamWriter {
            codecs,
            mode: Mode::Nested {
                path: path.to_vec(),
                module: None,
            },
        }
    }

    /// Like [`JsonStreamWriter::nested`], but with an explicit context
    /// module for first-level members instead of the one derived from the
    /// path's last step.
    pub fn nested_in_module(
        codecs: &'a JsonCodecFactory<'a>,
        path: &[QName],
        module: &str,
    ) -> JsonStreamWriter<'a> {
        JsonStreamWriter {
            codecs,
            mode: Mode::Nested {
                path: path.to_vec(),
                module: Some(module.to_string()),
            },
        }
    }

    /// Write through a token sink.
    pub fn write(&self, nodes: &[DataNode], out: &mut dyn TokenWriter) -> CodecResult<()> {
        match &self.mode {
            Mode::Exclusive => {
                let mut stack = SchemaStack::new(self.codecs.model());
                out.begin_object()?;
                for node in nodes {
                    self.write_node(node, &mut stack, None, out)?;
                }
                out.end_object()
            }
            Mode::Nested { path, module } => {
                let mut stack = SchemaStack::of_path(self.codecs.model(), path)?;
                let parent = match module {
                    Some(name) => Some(name.as_str()),
                    None => path
                        .last()
                        .and_then(|q| self.codecs.model().module_name_of(q)),
                };
                let body = match nodes {
                    [node] => node.children(),
                    _ => {
                        return Err(encode_error(format!(
                            "nested output takes exactly one node, got {}",
                            nodes.len()
                        )))
                    }
                };
                out.begin_object()?;
                for child in body {
                    self.write_node(child, &mut stack, parent, out)?;
                }
                out.end_object()
            }
        }
    }

    /// Convenience: write into a fresh compact [`JsonWriter`] and return the
    /// text.
    pub fn write_string(&self, nodes: &[DataNode]) -> CodecResult<String> {
        let mut out = JsonWriter::new();
        self.write(nodes, &mut out)?;
        Ok(out.into_string())
    }

    fn write_node(
        &self,
        node: &DataNode,
        stack: &mut SchemaStack<'a>,
        parent: Option<&str>,
        out: &mut dyn TokenWriter,
    ) -> CodecResult<()> {
        // A choice routes straight to its children; the schema stack finds
        // them transparently from the choice's parent.
        if let DataNode::Choice { children, .. } = node {
            for child in children {
                self.write_node(child, stack, parent, out)?;
            }
            return Ok(());
        }
        stack.enter_schema(node.qname())?;
        let result = self
            .write_entered(node, stack, parent, out)
            .map_err(|e| e.at_path(&stack.path_string()));
        stack.exit()?;
        result
    }

    fn write_entered(
        &self,
        node: &DataNode,
        stack: &mut SchemaStack<'a>,
        parent: Option<&str>,
        out: &mut dyn TokenWriter,
    ) -> CodecResult<()> {
        let model = self.codecs.model();
        let qname = node.qname();
        let prefix = model
            .module_name_of(qname)
            .ok_or_else(|| encode_error(format!("no module for {}", qname)))?;
        let key = if parent == Some(prefix) {
            qname.local_name.clone()
        } else {
            format!("{}:{}", prefix, qname.local_name)
        };
        match node {
            DataNode::Container { children, .. } => {
                out.key(&key)?;
                out.begin_object()?;
                for child in children {
                    self.write_node(child, stack, Some(prefix), out)?;
                }
                out.end_object()
            }
            DataNode::List { entries, .. } => {
                out.key(&key)?;
                out.begin_array()?;
                for entry in entries {
                    match entry {
                        DataNode::ListEntry { children, .. } => {
                            out.begin_object()?;
                            for child in children {
                                self.write_node(child, stack, Some(prefix), out)?;
                            }
                            out.end_object()?;
                        }
                        other => {
                            return Err(encode_error(format!(
                                "list {} holds a non-entry {} node",
                                qname,
                                <&str>::from(other)
                            )))
                        }
                    }
                }
                out.end_array()
            }
            // A bare entry is written as a single-entry list.
            DataNode::ListEntry { children, .. } => {
                out.key(&key)?;
                out.begin_array()?;
                out.begin_object()?;
                for child in children {
                    self.write_node(child, stack, Some(prefix), out)?;
                }
                out.end_object()?;
                out.end_array()
            }
            DataNode::LeafList { entries, .. } => {
                out.key(&key)?;
                out.begin_array()?;
                for entry in entries {
                    match entry {
                        DataNode::LeafListEntry { value, .. } => {
                            self.write_leaf_value(stack, value, out)?
                        }
                        other => {
                            return Err(encode_error(format!(
                                "leaf-list {} holds a non-entry {} node",
                                qname,
                                <&str>::from(other)
                            )))
                        }
                    }
                }
                out.end_array()
            }
            DataNode::Leaf { value, .. } => {
                out.key(&key)?;
                self.write_leaf_value(stack, value, out)
            }
            DataNode::LeafListEntry { .. } => Err(encode_error(format!(
                "leaf-list entry {} outside its leaf-list",
                qname
            ))),
            DataNode::Anydata { body, .. } | DataNode::Anyxml { body, .. } => {
                out.key(&key)?;
                write_json_value(out, body)
            }
            DataNode::Choice { .. } => unreachable!("handled before entering"),
        }
    }

    fn write_leaf_value(
        &self,
        stack: &SchemaStack<'a>,
        value: &Value,
        out: &mut dyn TokenWriter,
    ) -> CodecResult<()> {
        let schema = stack.current().ok_or_else(|| CodecError::Structural {
            path: "/".to_string(),
            msg: "leaf value written at the root".to_string(),
        })?;
        let ty = schema
            .type_desc
            .as_ref()
            .ok_or_else(|| encode_error(format!("{} has no type", schema.qname)))?;
        let codec = self.codecs.codec_for(ty, &schema.qname.module);
        codec.encode(value, self.codecs.model(), out)
    }
}

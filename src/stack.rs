//! Incremental schema position tracking.
//!
//! JSON input does not repeat the full schema path at every nesting level,
//! and choice/case transparency means one input key can resolve to a node
//! two schema levels below the visible parent. A [`SchemaStack`] makes that
//! positional knowledge explicit: both the parser and the serializer push
//! before recursing into a child and pop on the way out.
//!
//! A stack is exclusively owned by one in-progress traversal. The model it
//! points at is immutable and freely shared.

use crate::qname::QName;
use crate::schema::{find_schema_child, Module, NodeKind, SchemaContext, SchemaNode};
use crate::util::{CodecError, CodecResult};

// One logical push. Entering a node through a choice/case boundary records
// the crossed nodes too, so absolute paths stay complete, but exit() pops
// the whole frame at once to stay symmetric with enter.
#[derive(Clone, Debug)]
struct Frame<'a> {
    chain: Vec<&'a SchemaNode>,
    grouping: bool,
}

/// A mutable cursor over an immutable schema model.
#[derive(Clone, Debug)]
pub struct SchemaStack<'a> {
    model: &'a SchemaContext,
    frames: Vec<Frame<'a>>,
    // Fixed to the module owning the bottom-most entry while non-empty.
    module: Option<&'a Module>,
    grouping_depth: usize,
}

impl<'a> SchemaStack<'a> {
    /// Create a stack positioned above all modules (the pre-traversal
    /// state).
    pub fn new(model: &'a SchemaContext) -> SchemaStack<'a> {
        SchemaStack {
            model,
            frames: Vec::new(),
            module: None,
            grouping_depth: 0,
        }
    }

    /// Create a stack already descended along `path`.
    pub fn of_path(model: &'a SchemaContext, path: &[QName]) -> CodecResult<SchemaStack<'a>> {
        let mut stack = SchemaStack::new(model);
        for qname in path {
            stack.enter_schema(qname)?;
        }
        Ok(stack)
    }

    /// The model this stack navigates.
    pub fn model(&self) -> &'a SchemaContext {
        self.model
    }

    /// True in the pre-traversal state.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The current schema node, or `None` at the root sentinel.
    pub fn current(&self) -> Option<&'a SchemaNode> {
        self.frames.last().map(|f| *f.chain.last().expect("non-empty chain"))
    }

    /// The module owning the bottom-most entry, fixed until the stack
    /// empties again.
    pub fn current_module(&self) -> Option<&'a Module> {
        self.module
    }

    /// True while positioned inside an uninvoked grouping definition.
    pub fn in_grouping(&self) -> bool {
        self.grouping_depth > 0
    }

    /// Descend into the named schema-tree child.
    ///
    /// With an empty stack the name's module is resolved as an owning-module
    /// root. Otherwise the current node must expose schema-tree children;
    /// choice/case boundaries are transparent, so a case's child is found
    /// directly from the choice's parent.
    pub fn enter_schema(&mut self, qname: &QName) -> CodecResult<&'a SchemaNode> {
        let chain = match self.current() {
            None => {
                let module = self
                    .model
                    .module_of(qname)
                    .ok_or_else(|| self.not_found(qname))?;
                let chain =
                    find_schema_child(&module.children, qname).ok_or_else(|| self.not_found(qname))?;
                self.module = Some(module);
                chain
            }
            Some(node) => {
                if !node.kind.is_composite() {
                    return Err(CodecError::Structural {
                        path: self.path_string(),
                        msg: format!("{} node {} has no children", node.kind, node.qname),
                    });
                }
                find_schema_child(&node.children, qname).ok_or_else(|| self.not_found(qname))?
            }
        };
        let node = *chain.last().expect("non-empty chain");
        self.frames.push(Frame {
            chain,
            grouping: false,
        });
        Ok(node)
    }

    /// Descend into a grouping definition. Resolution happens against the
    /// grouping namespace of the name's owning module, never against the
    /// schema tree; used only when materializing grouping-derived subtrees.
    pub fn enter_grouping(&mut self, qname: &QName) -> CodecResult<&'a SchemaNode> {
        let module = self
            .model
            .module_of(qname)
            .ok_or_else(|| self.not_found(qname))?;
        let grouping = module
            .groupings
            .iter()
            .find(|g| g.qname == *qname)
            .ok_or_else(|| self.not_found(qname))?;
        if self.is_empty() {
            self.module = Some(module);
        }
        self.frames.push(Frame {
            chain: vec![grouping],
            grouping: true,
        });
        self.grouping_depth += 1;
        Ok(grouping)
    }

    /// Pop one entry, returning the node that was left.
    pub fn exit(&mut self) -> CodecResult<&'a SchemaNode> {
        let frame = self.frames.pop().ok_or_else(|| CodecError::Structural {
            path: "/".to_string(),
            msg: "exit from an empty schema stack".to_string(),
        })?;
        if frame.grouping {
            self.grouping_depth -= 1;
        }
        if self.frames.is_empty() {
            self.module = None;
        }
        Ok(*frame.chain.last().expect("non-empty chain"))
    }

    /// The root-to-current qualified-name sequence, including any crossed
    /// choice and case steps. Fails while inside an uninvoked grouping,
    /// which has no instantiated location.
    pub fn to_absolute_path(&self) -> CodecResult<Vec<QName>> {
        if self.in_grouping() {
            return Err(CodecError::Structural {
                path: self.path_string(),
                msg: "schema position inside a grouping has no absolute path".to_string(),
            });
        }
        Ok(self
            .frames
            .iter()
            .flat_map(|f| f.chain.iter().map(|n| n.qname.clone()))
            .collect())
    }

    /// A human-readable `/a/b/c` rendering of the current position, for
    /// diagnostics.
    pub fn path_string(&self) -> String {
        if self.frames.is_empty() {
            return "/".to_string();
        }
        let mut out = String::new();
        for frame in &self.frames {
            for node in &frame.chain {
                out.push('/');
                out.push_str(&node.qname.local_name);
            }
        }
        out
    }

    fn not_found(&self, qname: &QName) -> CodecError {
        CodecError::NotFound {
            path: self.path_string(),
            name: qname.to_string(),
        }
    }
}

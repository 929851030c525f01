//! Compiled command tree.

use std::sync::Arc;

use serde_json::json;

use crate::model::{KeywordType, Value};
use crate::registry::{KeywordDefinition, SlotSpec};

/// What currently occupies a parameter slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Empty,
    Value(Value),
    /// Filled at run time by the value the child node produces.
    Deferred,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub ty: KeywordType,
    pub required: bool,
    pub arg: Arg,
}

impl Slot {
    fn open(spec: SlotSpec) -> Self {
        Self {
            ty: spec.ty,
            required: spec.required,
            arg: Arg::Empty,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.arg == Arg::Empty
    }
}

/// One resolved invocable keyword, its parameter slots, and the node it wraps.
/// A node exclusively owns its child.
#[derive(Debug, Clone)]
pub struct CompiledNode {
    definition: Arc<KeywordDefinition>,
    slots: Vec<Slot>,
    child: Option<Box<CompiledNode>>,
}

impl CompiledNode {
    pub(crate) fn open(definition: Arc<KeywordDefinition>) -> Self {
        let slots = definition.slots().into_iter().map(Slot::open).collect();
        Self {
            definition,
            slots,
            child: None,
        }
    }

    pub fn definition(&self) -> &Arc<KeywordDefinition> {
        &self.definition
    }

    pub fn keyword(&self) -> &str {
        self.definition.canonical_id()
    }

    pub fn ty(&self) -> KeywordType {
        self.definition.ty()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn child(&self) -> Option<&CompiledNode> {
        self.child.as_deref()
    }

    /// Value bound to slot `index`, if it holds one.
    pub fn value(&self, index: usize) -> Option<&Value> {
        match self.slots.get(index).map(|s| &s.arg) {
            Some(Arg::Value(v)) => Some(v),
            _ => None,
        }
    }

    /// First empty slot of type `ty`, in declared order.
    pub(crate) fn open_slot(&self, ty: KeywordType) -> Option<usize> {
        self.slots.iter().position(|s| s.ty == ty && s.is_empty())
    }

    pub(crate) fn fill(&mut self, index: usize, value: Value) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.arg = Arg::Value(value);
        }
    }

    pub(crate) fn defer(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.arg = Arg::Deferred;
        }
    }

    pub(crate) fn set_child(&mut self, child: CompiledNode) {
        self.child = Some(Box::new(child));
    }

    /// Type of the first required slot still empty.
    pub fn missing_required(&self) -> Option<KeywordType> {
        self.slots
            .iter()
            .find(|s| s.required && s.is_empty())
            .map(|s| s.ty)
    }

    /// This node followed by its descendants, outermost first.
    pub fn chain(&self) -> impl Iterator<Item = &CompiledNode> {
        std::iter::successors(Some(self), |node| node.child())
    }

    pub fn depth(&self) -> usize {
        self.chain().count()
    }

    pub fn to_json(&self) -> serde_json::Value {
        let args: Vec<serde_json::Value> = self
            .slots
            .iter()
            .map(|slot| {
                let value = match &slot.arg {
                    Arg::Empty => serde_json::Value::Null,
                    Arg::Value(v) => serde_json::to_value(v).unwrap_or(serde_json::Value::Null),
                    Arg::Deferred => json!("<produced>"),
                };
                json!({ "type": slot.ty, "required": slot.required, "value": value })
            })
            .collect();
        json!({
            "keyword": self.keyword(),
            "type": self.ty(),
            "args": args,
            "child": self.child().map(CompiledNode::to_json),
        })
    }
}

/// Result of compiling one command.
#[derive(Debug, Clone, Default)]
pub struct CompiledCommand {
    /// First keyword of the command; `None` when nothing resolved.
    pub root: Option<CompiledNode>,
    /// Tokens that resolved to nothing, in order.
    pub skipped: Vec<String>,
}

impl CompiledCommand {
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }
}

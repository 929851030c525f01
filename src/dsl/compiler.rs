use std::sync::Arc;

use crate::model::Value;
use crate::registry::{KeywordDefinition, Registry};
use crate::settings::UnknownWordPolicy;

use super::ast::{CompiledCommand, CompiledNode};
use super::error::CompileError;
use super::literal;

/// What one token resolved to.
enum Resolved {
    /// A FUNCTION/EVENT keyword: opens a node.
    Keyword(Arc<KeywordDefinition>),
    /// A parameter value for an open node.
    Value(Value),
}

/// Compiles token sequences against a registry.
///
/// Two passes: a flat left-to-right pass that resolves tokens into nodes and
/// binds values to the innermost open slot, then a right-to-left fold that
/// makes each node the child of the one before it. Nothing is invoked here.
pub struct Compiler<'r> {
    registry: &'r Registry,
    unknown_words: UnknownWordPolicy,
}

impl<'r> Compiler<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            unknown_words: UnknownWordPolicy::default(),
        }
    }

    pub fn with_unknown_words(mut self, policy: UnknownWordPolicy) -> Self {
        self.unknown_words = policy;
        self
    }

    pub fn compile<S: AsRef<str>>(&self, tokens: &[S]) -> Result<CompiledCommand, CompileError> {
        let mut nodes: Vec<CompiledNode> = Vec::new();
        let mut skipped = Vec::new();

        for token in tokens {
            let token = token.as_ref();
            match self.resolve(token)? {
                Some(Resolved::Keyword(definition)) => {
                    tracing::debug!(keyword = %definition.canonical_id(), ty = %definition.ty(), "open node");
                    nodes.push(CompiledNode::open(definition));
                }
                Some(Resolved::Value(value)) => bind_value(&mut nodes, value)?,
                None => {
                    if self.unknown_words == UnknownWordPolicy::Warn {
                        tracing::warn!(word = token, "skipping unknown word");
                    }
                    skipped.push(token.to_string());
                }
            }
        }

        let root = fold(nodes);
        if let Some(root) = &root {
            check_required(root)?;
        }
        Ok(CompiledCommand { root, skipped })
    }

    /// Tokens that resolve to nothing. Unlike `compile`, this never fails,
    /// so a caller can still report them when the command does not compile.
    pub fn skipped<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<String> {
        tokens
            .iter()
            .map(|token| token.as_ref())
            .filter(|token| matches!(self.resolve(token), Ok(None)))
            .map(str::to_string)
            .collect()
    }

    fn resolve(&self, token: &str) -> Result<Option<Resolved>, CompileError> {
        if let Some(entry) = self.registry.resolve(token) {
            let definition = self.registry.definition_for(&entry.canonical_id, entry.ty)?;
            let resolved = if entry.ty.is_value() {
                Resolved::Value(Value::word(entry.ty, definition.canonical_id()))
            } else {
                Resolved::Keyword(Arc::clone(definition))
            };
            return Ok(Some(resolved));
        }
        Ok(literal::parse_literal(token, self.registry).map(Resolved::Value))
    }
}

/// Compile one tokenized command with default settings.
pub fn compile<S: AsRef<str>>(
    registry: &Registry,
    tokens: &[S],
) -> Result<Option<CompiledNode>, CompileError> {
    Compiler::new(registry).compile(tokens).map(|c| c.root)
}

/// Bind to the innermost open node with a free slot of the value's type.
fn bind_value(nodes: &mut [CompiledNode], value: Value) -> Result<(), CompileError> {
    let ty = value.ty();
    for node in nodes.iter_mut().rev() {
        if let Some(index) = node.open_slot(ty) {
            tracing::debug!(keyword = %node.keyword(), slot = index, value = %value, "bind value");
            node.fill(index, value);
            return Ok(());
        }
    }
    Err(CompileError::UnexpectedKeyword {
        word: value.to_string(),
        ty,
    })
}

/// Fold right-to-left: node[i + 1] becomes the child of node[i]. When a
/// FUNCTION wraps a FUNCTION that produces a value, the outer function's
/// first empty slot of that type is deferred to the produced value.
/// Wrappers (EVENT) keep their child whole and never defer.
fn fold(nodes: Vec<CompiledNode>) -> Option<CompiledNode> {
    nodes.into_iter().rev().fold(None, |inner, mut node| {
        if let Some(inner) = inner {
            if !node.ty().is_wrapper() {
                if let Some(index) = inner.definition().produces().and_then(|ty| node.open_slot(ty)) {
                    tracing::debug!(keyword = %node.keyword(), producer = %inner.keyword(), slot = index, "defer slot");
                    node.defer(index);
                }
            }
            node.set_child(inner);
        }
        Some(node)
    })
}

fn check_required(root: &CompiledNode) -> Result<(), CompileError> {
    for node in root.chain() {
        if let Some(missing) = node.missing_required() {
            return Err(CompileError::IncompleteCommand {
                keyword: node.keyword().to_string(),
                missing,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::dsl::ast::Arg;
    use crate::model::{Color, KeywordType};
    use crate::registry::{BindTarget, KeywordDraft};

    use crate::model::KeywordType::{Color as COLOR, Dimension as DIMENSION, Element as ELEMENT, Shape as SHAPE};

    fn registry() -> Registry {
        let mut r = Registry::new();
        r.register(
            KeywordDraft::function(["create", "make"])
                .required([SHAPE])
                .optional([DIMENSION, COLOR])
                .produces(SHAPE)
                .exec(|_| Ok(None)),
        )
        .unwrap();
        r.register(
            KeywordDraft::function(["fill"])
                .required([SHAPE, COLOR])
                .exec(|_| Ok(None)),
        )
        .unwrap();
        r.register(
            KeywordDraft::function(["write"])
                .required([KeywordType::String, ELEMENT])
                .exec(|_| Ok(None)),
        )
        .unwrap();
        r.register(KeywordDraft::event(["load"]).bind_to(BindTarget::host("document")))
            .unwrap();
        r.register(KeywordDraft::event(["click"]).requires_bound_element())
            .unwrap();
        r.register(KeywordDraft::new(SHAPE, ["circle", "round"])).unwrap();
        r.register(KeywordDraft::new(SHAPE, ["block", "square"])).unwrap();
        r.register(KeywordDraft::new(COLOR, ["red"])).unwrap();
        r.register(KeywordDraft::new(ELEMENT, ["banner", "header"])).unwrap();
        r
    }

    fn compile_words(r: &Registry, words: &str) -> Result<CompiledCommand, CompileError> {
        let tokens: Vec<&str> = words.split_whitespace().collect();
        Compiler::new(r).compile(&tokens)
    }

    fn shape(word: &str) -> Value {
        Value::word(SHAPE, word)
    }

    #[test]
    fn event_wraps_function() {
        let r = registry();
        let root = compile(&r, &["load", "create", "circle"]).unwrap().unwrap();
        assert_eq!(root.keyword(), "load");
        assert_eq!(root.ty(), KeywordType::Event);
        let child = root.child().unwrap();
        assert_eq!(child.keyword(), "create");
        assert_eq!(child.value(0), Some(&shape("circle")));
        assert!(child.child().is_none());
    }

    #[test]
    fn fillers_are_skipped() {
        let r = registry();
        let with_filler = compile_words(&r, "the create a circle").unwrap();
        let without = compile_words(&r, "create circle").unwrap();
        let a = with_filler.root.unwrap();
        let b = without.root.unwrap();
        assert_eq!(a.keyword(), b.keyword());
        assert_eq!(a.slots(), b.slots());
        assert_eq!(with_filler.skipped, vec!["the", "a"]);
        assert!(without.skipped.is_empty());
    }

    #[test]
    fn typed_literal_matches_registered_word() {
        let r = registry();
        let a = compile(&r, &["load", "create", "shape=circle"]).unwrap().unwrap();
        let b = compile(&r, &["load", "create", "circle"]).unwrap().unwrap();
        assert_eq!(a.child().unwrap().slots(), b.child().unwrap().slots());
    }

    #[test]
    fn aliases_bind_canonical_values() {
        let r = registry();
        let root = compile(&r, &["make", "round"]).unwrap().unwrap();
        assert_eq!(root.keyword(), "create");
        assert_eq!(root.value(0), Some(&shape("circle")));
    }

    #[test]
    fn optional_slots_stay_empty() {
        let r = registry();
        let root = compile(&r, &["create", "circle"]).unwrap().unwrap();
        let slots = root.slots();
        assert_eq!(slots.len(), 3);
        assert_eq!(slots[1].arg, Arg::Empty);
        assert_eq!(slots[2].arg, Arg::Empty);
    }

    #[test]
    fn values_bind_by_type_not_position() {
        let r = registry();
        let root = compile_words(&r, "create red 10cm block").unwrap().root.unwrap();
        assert_eq!(root.value(0), Some(&shape("block")));
        assert_eq!(root.value(1).unwrap().to_string(), "10cm");
        assert_eq!(root.value(2), Some(&Value::word(COLOR, "red")));
    }

    #[test]
    fn missing_required_slot_fails() {
        let r = registry();
        let err = compile(&r, &["load", "create"]).unwrap_err();
        assert_eq!(
            err,
            CompileError::IncompleteCommand {
                keyword: "create".into(),
                missing: SHAPE
            }
        );
    }

    #[test]
    fn bound_element_event_needs_element() {
        let r = registry();
        let err = compile(&r, &["click", "create", "circle"]).unwrap_err();
        assert_eq!(
            err,
            CompileError::IncompleteCommand {
                keyword: "click".into(),
                missing: ELEMENT
            }
        );
        let root = compile(&r, &["click", "banner", "create", "circle"]).unwrap().unwrap();
        assert_eq!(root.value(0), Some(&Value::word(ELEMENT, "banner")));
    }

    #[test]
    fn innermost_open_node_wins() {
        let r = registry();
        // Both `fill` and `create` have a free COLOR slot; `red` goes to `create`.
        let root = compile_words(&r, "fill create circle red").unwrap_err();
        assert_eq!(
            root,
            CompileError::IncompleteCommand {
                keyword: "fill".into(),
                missing: COLOR
            }
        );
        let root = compile_words(&r, "fill red create circle").unwrap().root.unwrap();
        assert_eq!(root.value(1), Some(&Value::word(COLOR, "red")));
        let inner = root.child().unwrap();
        assert_eq!(inner.value(0), Some(&shape("circle")));
        assert_eq!(inner.value(2), None);
    }

    #[test]
    fn producer_fills_outer_slot() {
        let r = registry();
        let root = compile_words(&r, "fill red create circle").unwrap().root.unwrap();
        assert_eq!(root.slots()[0].arg, Arg::Deferred);
        assert_eq!(root.missing_required(), None);
    }

    #[test]
    fn value_without_open_slot_is_rejected() {
        let r = registry();
        let err = compile(&r, &["circle"]).unwrap_err();
        assert_eq!(
            err,
            CompileError::UnexpectedKeyword {
                word: "circle".into(),
                ty: SHAPE
            }
        );
        let err = compile(&r, &["create", "circle", "block"]).unwrap_err();
        assert!(matches!(err, CompileError::UnexpectedKeyword { .. }));
    }

    #[test]
    fn no_keywords_is_a_no_op() {
        let r = registry();
        let compiled = compile_words(&r, "please be nice").unwrap();
        assert!(compiled.is_empty());
        assert_eq!(compiled.skipped.len(), 3);
        assert!(compile::<&str>(&r, &[]).unwrap().is_none());
    }

    #[test]
    fn chain_follows_token_order() {
        let r = registry();
        let root = compile_words(&r, "load click banner write \"hi\" header")
            .unwrap()
            .root
            .unwrap();
        let order: Vec<&str> = root.chain().map(CompiledNode::keyword).collect();
        assert_eq!(order, vec!["load", "click", "write"]);
        assert_eq!(root.depth(), 3);
        let write = root.child().unwrap().child().unwrap();
        assert_eq!(write.value(0), Some(&Value::text("hi")));
        assert_eq!(write.value(1), Some(&Value::word(ELEMENT, "banner")));
    }

    #[test]
    fn event_slots_are_never_deferred() {
        let mut r = registry();
        r.register(
            KeywordDraft::function(["find"])
                .required([ELEMENT])
                .produces(ELEMENT)
                .exec(|_| Ok(None)),
        )
        .unwrap();
        let err = compile(&r, &["click", "find", "banner"]).unwrap_err();
        assert_eq!(
            err,
            CompileError::IncompleteCommand {
                keyword: "click".into(),
                missing: ELEMENT
            }
        );
    }

    #[test]
    fn skipped_words_survive_a_failed_compile() {
        let r = registry();
        let tokens = ["pleese", "craete", "a", "circle"];
        assert!(Compiler::new(&r).compile(&tokens).is_err());
        assert_eq!(Compiler::new(&r).skipped(&tokens), vec!["pleese", "craete", "a"]);
    }

    #[test]
    fn hex_color_literal_binds() {
        let r = registry();
        let root = compile_words(&r, "create circle #00ff00").unwrap().root.unwrap();
        assert_eq!(root.value(2), Some(&Value::Color(Color::rgb(0, 255, 0))));
    }
}

use crate::model::{KeywordType, Value};
use crate::registry::{
    Args, BindTarget, Handler, HandlerError, HandlerTable, KeywordDraft, Registry, RegistrationError,
};
use crate::state::StageHandle;

use crate::model::KeywordType::{Color, Dimension, Direction, Element, Position, Shape};

/// Element `add` writes to when none is named. Not a keyword: "the page"
/// in a sentence is filler.
pub const DEFAULT_ELEMENT: &str = "page";

/// Value vocabulary: type and alias groups, canonical word first.
const LITERALS: &[(KeywordType, &[&str])] = &[
    (Shape, &["circle", "round"]),
    (Shape, &["block", "square", "box"]),
    (Shape, &["triangle"]),
    (Color, &["red"]),
    (Color, &["green"]),
    (Color, &["blue"]),
    (Color, &["yellow"]),
    (Color, &["black"]),
    (Color, &["white"]),
    (Position, &["center", "middle"]),
    (Position, &["above"]),
    (Position, &["below"]),
    (Element, &["banner", "header", "top"]),
    (Element, &["sidebar"]),
    (Element, &["footer", "bottom"]),
    (Direction, &["up", "north"]),
    (Direction, &["down", "south"]),
    (Direction, &["left", "west"]),
    (Direction, &["right", "east"]),
];

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct DemoError(&'static str);

fn text(args: &Args, index: usize) -> Option<String> {
    args.get(index).map(ToString::to_string)
}

fn word(args: &Args, index: usize) -> Result<&str, HandlerError> {
    args.str(index).ok_or_else(|| "missing argument".into())
}

// ── Handlers ────────────────────────────────────────────────────────

/// create SHAPE [DIMENSION] [COLOR] [POSITION] → SHAPE handle
fn create(stage: &StageHandle) -> Handler {
    let stage = stage.clone();
    Handler::new(4, move |args| {
        let shape = word(args, 0)?;
        let size = match args.get(1) {
            Some(Value::Dimension(d)) => Some(*d),
            _ => None,
        };
        let handle = stage.with_stage_mut(|s| s.draw(shape, size, text(args, 2), text(args, 3)));
        Ok(Some(Value::word(Shape, handle)))
    })
}

/// fill SHAPE COLOR
fn fill(stage: &StageHandle) -> Handler {
    let stage = stage.clone();
    Handler::new(2, move |args| {
        let shape = word(args, 0)?;
        let color = text(args, 1).unwrap_or_default();
        stage.with_stage_mut(|s| s.fill(shape, color))?;
        Ok(None)
    })
}

/// write STRING ELEMENT
fn write(stage: &StageHandle) -> Handler {
    let stage = stage.clone();
    Handler::new(2, move |args| {
        let text = word(args, 0)?;
        let element = word(args, 1)?;
        stage.with_stage_mut(|s| s.write(element, text));
        Ok(None)
    })
}

/// add [ELEMENT] [STRING]
fn add(stage: &StageHandle) -> Handler {
    let stage = stage.clone();
    Handler::new(2, move |args| {
        let element = args.str(0).unwrap_or(DEFAULT_ELEMENT);
        let text = args.str(1).ok_or(DemoError("Add what?"))?;
        stage.with_stage_mut(|s| s.append(element, text));
        Ok(None)
    })
}

/// move DIRECTION
fn move_to(stage: &StageHandle) -> Handler {
    let stage = stage.clone();
    Handler::new(1, move |args| {
        let direction = word(args, 0)?;
        stage.with_stage_mut(|s| s.move_last(direction))?;
        Ok(None)
    })
}

/// Native actions of the demo vocabulary, by name, for keyword catalogs.
pub fn demo_handlers(stage: &StageHandle) -> HandlerTable {
    let mut table = HandlerTable::new();
    table.insert("create", create(stage));
    table.insert("fill", fill(stage));
    table.insert("write", write(stage));
    table.insert("add", add(stage));
    table.insert("move", move_to(stage));
    table
}

/// Register the bootstrapping vocabulary, drawing onto `stage`.
pub fn register_demo_keywords(
    registry: &mut Registry,
    stage: &StageHandle,
) -> Result<(), RegistrationError> {
    let drafts = [
        KeywordDraft::function(["create", "make", "draw"])
            .required([Shape])
            .optional([Dimension, Color, Position])
            .produces(Shape)
            .handler(create(stage)),
        KeywordDraft::function(["fill", "paint"])
            .required([Shape, Color])
            .handler(fill(stage)),
        KeywordDraft::function(["write", "say"])
            .required([KeywordType::String, Element])
            .handler(write(stage)),
        KeywordDraft::function(["add", "append"])
            .optional([Element, KeywordType::String])
            .handler(add(stage)),
        KeywordDraft::function(["move", "shift"])
            .required([Direction])
            .handler(move_to(stage)),
        KeywordDraft::event(["load", "loads", "loaded"]).bind_to(BindTarget::host("document")),
        KeywordDraft::event(["click", "clicks", "clicked"]).requires_bound_element(),
    ];
    for draft in drafts {
        registry.register(draft)?;
    }
    for (ty, words) in LITERALS {
        registry.register(KeywordDraft::new(*ty, words.iter().copied()))?;
    }
    tracing::debug!(keywords = registry.len(), "registered demo vocabulary");
    Ok(())
}

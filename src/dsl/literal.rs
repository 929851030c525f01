//! Literal-shaped tokens that resolve to values without being registered:
//! `type=value`, dimensions (`10cm`), hex colors (`#f80`), quoted strings.

use crate::model::{Color, Dimension, KeywordType, Value};
use crate::registry::Registry;

pub fn parse_literal(token: &str, registry: &Registry) -> Option<Value> {
    if let Some(text) = quoted(token) {
        return Some(Value::text(text));
    }
    if token.starts_with('#') {
        return Color::from_hex(token).map(Value::Color);
    }
    if let Ok(d) = token.parse::<Dimension>() {
        return Some(Value::Dimension(d));
    }
    typed(token, registry)
}

fn quoted(token: &str) -> Option<&str> {
    token
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
}

/// `shape=circle`, `string=hello`, `dimension=10cm`, `color=#ff0000`.
/// A value that is a registered word of the same type resolves to its
/// canonical id.
fn typed(token: &str, registry: &Registry) -> Option<Value> {
    let (ty, raw) = token.split_once('=')?;
    let ty: KeywordType = ty.parse().ok()?;
    if !ty.is_value() || raw.is_empty() {
        return None;
    }
    match ty {
        KeywordType::String => Some(Value::text(quoted(raw).unwrap_or(raw))),
        KeywordType::Dimension => raw.parse::<Dimension>().ok().map(Value::Dimension),
        KeywordType::Color if raw.starts_with('#') => Color::from_hex(raw).map(Value::Color),
        _ => {
            let word = registry
                .resolve(raw)
                .filter(|entry| entry.ty == ty)
                .map_or(raw, |entry| entry.canonical_id.as_str());
            Some(Value::word(ty, word))
        }
    }
}

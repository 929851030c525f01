use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Semantic category of a keyword. Closed set, fixed at compile time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeywordType {
    Function,
    Event,
    Loop,
    Conditional,
    String,
    Color,
    Shape,
    Dimension,
    Position,
    Element,
    Direction,
}

impl KeywordType {
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Event => "event",
            Self::Loop => "loop",
            Self::Conditional => "conditional",
            Self::String => "string",
            Self::Color => "color",
            Self::Shape => "shape",
            Self::Dimension => "dimension",
            Self::Position => "position",
            Self::Element => "element",
            Self::Direction => "direction",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Function => "Function",
            Self::Event => "Event",
            Self::Loop => "Loop",
            Self::Conditional => "Conditional",
            Self::String => "String",
            Self::Color => "Color",
            Self::Shape => "Shape",
            Self::Dimension => "Dimension",
            Self::Position => "Position",
            Self::Element => "Element",
            Self::Direction => "Direction",
        }
    }

    pub fn all() -> &'static [KeywordType] {
        &[
            Self::Function,
            Self::Event,
            Self::Loop,
            Self::Conditional,
            Self::String,
            Self::Color,
            Self::Shape,
            Self::Dimension,
            Self::Position,
            Self::Element,
            Self::Direction,
        ]
    }

    /// Types whose keywords open a compiled node instead of filling a slot.
    pub fn is_invocable(self) -> bool {
        !self.is_value()
    }

    /// Types that defer their child until an external trigger fires.
    pub fn is_wrapper(self) -> bool {
        matches!(self, Self::Event | Self::Loop | Self::Conditional)
    }

    /// Types that resolve to parameter values.
    pub fn is_value(self) -> bool {
        !matches!(
            self,
            Self::Function | Self::Event | Self::Loop | Self::Conditional
        )
    }
}

impl fmt::Display for KeywordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown keyword type \"{0}\"")]
pub struct ParseKeywordTypeError(pub String);

impl FromStr for KeywordType {
    type Err = ParseKeywordTypeError;

    /// Case-insensitive. `if` is accepted for `Conditional`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "if" {
            return Ok(Self::Conditional);
        }
        Self::all()
            .iter()
            .copied()
            .find(|ty| ty.slug() == lower)
            .ok_or_else(|| ParseKeywordTypeError(s.to_string()))
    }
}

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::{Color, KeywordType};

/// A resolved parameter value handed to keyword handlers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Value {
    /// A value keyword, identified by its canonical id.
    Word { ty: KeywordType, word: String },
    /// Free text, e.g. a quoted string.
    Text { text: String },
    Dimension(Dimension),
    Color(Color),
}

impl Value {
    pub fn word(ty: KeywordType, word: impl Into<String>) -> Self {
        Self::Word {
            ty,
            word: word.into(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// The slot type this value can fill.
    pub fn ty(&self) -> KeywordType {
        match self {
            Self::Word { ty, .. } => *ty,
            Self::Text { .. } => KeywordType::String,
            Self::Dimension(_) => KeywordType::Dimension,
            Self::Color(_) => KeywordType::Color,
        }
    }

    /// Word or text content, if this value carries one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Word { word, .. } => Some(word),
            Self::Text { text } => Some(text),
            Self::Dimension(_) | Self::Color(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word { word, .. } => f.write_str(word),
            Self::Text { text } => write!(f, "\"{text}\""),
            Self::Dimension(d) => write!(f, "{d}"),
            Self::Color(c) => write!(f, "{c}"),
        }
    }
}

// ── Dimension ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Px,
    Cm,
    Mm,
    Em,
    Percent,
}

impl Unit {
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Px => "px",
            Self::Cm => "cm",
            Self::Mm => "mm",
            Self::Em => "em",
            Self::Percent => "%",
        }
    }

    fn all() -> &'static [Unit] {
        &[Self::Px, Self::Cm, Self::Mm, Self::Em, Self::Percent]
    }
}

/// A measured length such as `10cm` or `50%`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Dimension {
    pub amount: f64,
    pub unit: Unit,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit.suffix())
    }
}

impl FromStr for Dimension {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unit = Unit::all()
            .iter()
            .copied()
            .find(|u| s.ends_with(u.suffix()))
            .ok_or(())?;
        let number = s.strip_suffix(unit.suffix()).ok_or(())?;
        if number.is_empty() || !number.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(());
        }
        let amount: f64 = number.parse().map_err(|_| ())?;
        if !amount.is_finite() {
            return Err(());
        }
        Ok(Self { amount, unit })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn dimension_units() {
        let d: Dimension = "10cm".parse().unwrap();
        assert_eq!(d, Dimension { amount: 10.0, unit: Unit::Cm });
        let d: Dimension = "2.5em".parse().unwrap();
        assert_eq!(d.unit, Unit::Em);
        let d: Dimension = "50%".parse().unwrap();
        assert_eq!(d.to_string(), "50%");
    }

    #[test]
    fn dimension_rejects_words() {
        assert!("cm".parse::<Dimension>().is_err());
        assert!("tencm".parse::<Dimension>().is_err());
        assert!("10".parse::<Dimension>().is_err());
        assert!("-3px".parse::<Dimension>().is_err());
    }

    #[test]
    fn value_types() {
        assert_eq!(Value::word(KeywordType::Shape, "circle").ty(), KeywordType::Shape);
        assert_eq!(Value::text("hi").ty(), KeywordType::String);
        assert_eq!(Value::Color(Color::rgb(0, 0, 0)).ty(), KeywordType::Color);
        assert_eq!(Value::text("hi").as_str(), Some("hi"));
    }
}

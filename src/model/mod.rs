pub mod color;
pub mod keyword_type;
pub mod value;

// Re-export commonly used types at the model level.
pub use color::Color;
pub use keyword_type::{KeywordType, ParseKeywordTypeError};
pub use value::{Dimension, Unit, Value};

use crate::model::KeywordType;
use crate::registry::InvariantViolation;

/// Why a single command failed to compile. Other commands are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// A keyword ended the command with a required slot still empty.
    #[error("\"{keyword}\" is missing a required {missing} parameter")]
    IncompleteCommand { keyword: String, missing: KeywordType },

    /// A known value word that no open keyword has a slot for.
    #[error("{ty} \"{word}\" does not fit any open parameter slot")]
    UnexpectedKeyword { word: String, ty: KeywordType },

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

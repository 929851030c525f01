use crate::model::KeywordType;

/// Why a `register` call was refused. The registry is untouched in every case.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("the keyword \"{word}\" already exists (owned by \"{owner}\"), please choose another")]
    DuplicateKeyword { word: String, owner: String },

    #[error("no type specified for keyword(s): {keywords}")]
    MissingType { keywords: String },

    #[error("no keywords specified in {ty} definition")]
    EmptyKeywordList { ty: String },

    #[error("type not supported: {0}")]
    UnsupportedType(String),

    #[error("invalid definition for \"{keyword}\": {reason}")]
    InvalidDefinition { keyword: String, reason: String },
}

impl RegistrationError {
    pub(crate) fn invalid(keyword: &str, reason: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            keyword: keyword.to_string(),
            reason: reason.into(),
        }
    }
}

/// An index entry points at a definition the library does not hold.
/// Unreachable while the registry's consistency invariant holds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("internal error: keyword \"{canonical_id}\" ({ty}) is indexed but missing from the library")]
pub struct InvariantViolation {
    pub canonical_id: String,
    pub ty: KeywordType,
}

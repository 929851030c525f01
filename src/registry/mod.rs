pub mod catalog;
pub mod definition;
pub mod error;
pub mod validation;

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::Serialize;

use crate::model::KeywordType;

pub use catalog::{CatalogError, HandlerTable};
pub use definition::{
    Args, BindTarget, EventSpec, FunctionSpec, Handler, HandlerError, HandlerResult,
    KeywordDefinition, KeywordDraft, Payload, SlotSpec,
};
pub use error::{InvariantViolation, RegistrationError};

/// Where a surface word points: the canonical id and type of its definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct IndexEntry {
    pub canonical_id: String,
    #[serde(rename = "type")]
    pub ty: KeywordType,
}

/// Registry shared between a session and anything that registers late.
/// Registration takes the single write lock, so readers never observe a
/// definition that is in the library but not yet indexed.
pub type SharedRegistry = Arc<RwLock<Registry>>;

/// Keyword index + library.
///
/// Invariant: every index entry's `(canonical_id, type)` exists in the
/// library, and every library definition is indexed under its canonical id.
#[derive(Debug, Default)]
pub struct Registry {
    /// surface word → canonical id + type, in registration order
    index: IndexMap<String, IndexEntry>,
    /// type → canonical id → definition
    library: HashMap<KeywordType, IndexMap<String, Arc<KeywordDefinition>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_shared(self) -> SharedRegistry {
        Arc::new(RwLock::new(self))
    }

    /// Validate `draft` and insert it. Either every surface word and the
    /// definition go in, or nothing does.
    pub fn register(
        &mut self,
        draft: KeywordDraft,
    ) -> Result<Arc<KeywordDefinition>, RegistrationError> {
        let ty = draft.ty.ok_or_else(|| RegistrationError::MissingType {
            keywords: draft.keyword_list(),
        })?;
        if draft.keywords.is_empty() {
            return Err(RegistrationError::EmptyKeywordList {
                ty: ty.label().to_string(),
            });
        }
        validation::validate_keywords(&draft)?;
        self.check_unique(&draft.keywords)?;

        let keywords = draft.keywords.clone();
        let payload = validation::validate(ty, draft)?;
        let definition = Arc::new(KeywordDefinition::new(ty, keywords, payload));

        // Nothing below can fail.
        let canonical_id = definition.canonical_id().to_string();
        self.library
            .entry(ty)
            .or_default()
            .insert(canonical_id.clone(), Arc::clone(&definition));
        for word in definition.surface_words() {
            self.index.insert(
                word.clone(),
                IndexEntry {
                    canonical_id: canonical_id.clone(),
                    ty,
                },
            );
        }

        tracing::debug!(
            keyword = %canonical_id,
            ty = %ty,
            aliases = definition.surface_words().len(),
            "registered keyword"
        );
        Ok(definition)
    }

    fn check_unique(&self, words: &[String]) -> Result<(), RegistrationError> {
        for (i, word) in words.iter().enumerate() {
            if let Some(existing) = self.index.get(word) {
                return Err(RegistrationError::DuplicateKeyword {
                    word: word.clone(),
                    owner: existing.canonical_id.clone(),
                });
            }
            if words.iter().take(i).any(|w| w == word) {
                return Err(RegistrationError::DuplicateKeyword {
                    word: word.clone(),
                    owner: words.first().cloned().unwrap_or_default(),
                });
            }
        }
        Ok(())
    }

    /// Look a surface word up. Unknown words are expected (most words in a
    /// sentence are filler), so this is an `Option`, not an error.
    pub fn resolve(&self, word: &str) -> Option<&IndexEntry> {
        self.index.get(word)
    }

    pub fn definition_for(
        &self,
        canonical_id: &str,
        ty: KeywordType,
    ) -> Result<&Arc<KeywordDefinition>, InvariantViolation> {
        self.library
            .get(&ty)
            .and_then(|defs| defs.get(canonical_id))
            .ok_or_else(|| InvariantViolation {
                canonical_id: canonical_id.to_string(),
                ty,
            })
    }

    /// `resolve` followed by `definition_for`.
    pub fn lookup(&self, word: &str) -> Result<Option<&Arc<KeywordDefinition>>, InvariantViolation> {
        match self.resolve(word) {
            Some(entry) => self.definition_for(&entry.canonical_id, entry.ty).map(Some),
            None => Ok(None),
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    /// Number of registered definitions (not surface words).
    pub fn len(&self) -> usize {
        self.library.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Surface words with their index entries, in registration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &IndexEntry)> {
        self.index.iter().map(|(word, entry)| (word.as_str(), entry))
    }

    /// Definitions in registration order.
    pub fn definitions(&self) -> impl Iterator<Item = &Arc<KeywordDefinition>> {
        self.index
            .iter()
            .filter(|(word, entry)| **word == entry.canonical_id)
            .filter_map(|(_, entry)| self.definition_for(&entry.canonical_id, entry.ty).ok())
    }

    /// Definitions of one type, in registration order.
    pub fn definitions_of(&self, ty: KeywordType) -> impl Iterator<Item = &Arc<KeywordDefinition>> {
        self.library.get(&ty).into_iter().flat_map(IndexMap::values)
    }

    /// Check the index/library invariant in both directions.
    pub fn verify_consistency(&self) -> Result<(), InvariantViolation> {
        for entry in self.index.values() {
            let def = self.definition_for(&entry.canonical_id, entry.ty)?;
            if def.ty() != entry.ty {
                return Err(InvariantViolation {
                    canonical_id: entry.canonical_id.clone(),
                    ty: entry.ty,
                });
            }
        }
        for (ty, defs) in &self.library {
            for (id, def) in defs {
                let indexed = self
                    .index
                    .get(id)
                    .is_some_and(|e| e.canonical_id == *id && e.ty == *ty);
                let aliases_indexed = def
                    .surface_words()
                    .iter()
                    .all(|w| self.index.get(w).is_some_and(|e| e.canonical_id == *id));
                if !indexed || !aliases_indexed {
                    return Err(InvariantViolation {
                        canonical_id: id.clone(),
                        ty: *ty,
                    });
                }
            }
        }
        Ok(())
    }
}

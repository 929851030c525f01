//! Keyword catalog files: keyword declarations as JSON, with FUNCTION
//! handlers referenced by name from a [`HandlerTable`] of native actions.

use std::collections::HashMap;
use std::path::Path;

use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::KeywordType;

use super::definition::{BindTarget, Handler, KeywordDraft};
use super::error::RegistrationError;
use super::Registry;

/// One keyword declaration. Keywords always go under `keywords`; other
/// spellings (`keyword`, `words`, `word`) are rejected as unknown fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct KeywordDecl {
    /// Keyword type name, e.g. "FUNCTION", "event", "Shape".
    #[serde(rename = "type", default)]
    pub ty: Option<String>,
    /// Surface words; the first is the canonical id.
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optional: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub produces: Option<String>,
    /// Name of a native handler in the handler table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    /// Host object name, or `element:<name>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_to: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub requires_bound_element: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CatalogFile {
    pub keywords: Vec<KeywordDecl>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("catalog declaration #{position} ({keywords}): {source}")]
    Declaration {
        position: usize,
        keywords: String,
        #[source]
        source: RegistrationError,
    },
}

/// Native actions a catalog may reference by name.
#[derive(Debug, Clone, Default)]
pub struct HandlerTable {
    handlers: HashMap<String, Handler>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, handler: Handler) {
        self.handlers.insert(name.into(), handler);
    }

    pub fn get(&self, name: &str) -> Option<&Handler> {
        self.handlers.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn parse_type(keyword: &str, raw: &str) -> Result<KeywordType, RegistrationError> {
    raw.parse::<KeywordType>()
        .map_err(|e| RegistrationError::invalid(keyword, e.to_string()))
}

fn parse_types(keyword: &str, raw: &[String]) -> Result<Vec<KeywordType>, RegistrationError> {
    raw.iter().map(|t| parse_type(keyword, t)).collect()
}

impl KeywordDecl {
    /// Resolve type names and the handler reference into a draft.
    pub fn to_draft(&self, handlers: &HandlerTable) -> Result<KeywordDraft, RegistrationError> {
        let keyword = self.keywords.first().map_or("", String::as_str);
        let ty = match &self.ty {
            Some(raw) => Some(
                raw.parse::<KeywordType>()
                    .map_err(|_| RegistrationError::UnsupportedType(raw.clone()))?,
            ),
            None => None,
        };
        let handler = match &self.handler {
            Some(name) => Some(handlers.get(name).cloned().ok_or_else(|| {
                RegistrationError::invalid(keyword, format!("no native handler named \"{name}\""))
            })?),
            None => None,
        };
        let bind_to = match &self.bind_to {
            Some(raw) => Some(
                raw.parse::<BindTarget>()
                    .map_err(|e| RegistrationError::invalid(keyword, e))?,
            ),
            None => None,
        };

        Ok(KeywordDraft {
            ty,
            keywords: self.keywords.clone(),
            required: self
                .required
                .as_deref()
                .map(|r| parse_types(keyword, r))
                .transpose()?,
            optional: parse_types(keyword, &self.optional)?,
            produces: self
                .produces
                .as_deref()
                .map(|p| parse_type(keyword, p))
                .transpose()?,
            handler,
            bind_to,
            requires_bound_element: self.requires_bound_element,
        })
    }
}

pub fn parse_catalog(json: &str) -> Result<CatalogFile, CatalogError> {
    Ok(serde_json::from_str(json)?)
}

pub fn read_catalog(path: &Path) -> Result<CatalogFile, CatalogError> {
    let text = std::fs::read_to_string(path)?;
    parse_catalog(&text)
}

/// Register every declaration in order. Stops at the first failure; the
/// declarations before it stay registered.
pub fn load_catalog(
    registry: &mut Registry,
    catalog: &CatalogFile,
    handlers: &HandlerTable,
) -> Result<usize, CatalogError> {
    for (i, decl) in catalog.keywords.iter().enumerate() {
        let wrap = |source| CatalogError::Declaration {
            position: i + 1,
            keywords: decl.keywords.join(", "),
            source,
        };
        let draft = decl.to_draft(handlers).map_err(wrap)?;
        registry.register(draft).map_err(wrap)?;
    }
    tracing::info!(count = catalog.keywords.len(), "loaded keyword catalog");
    Ok(catalog.keywords.len())
}

/// JSON schema of the catalog file format.
pub fn catalog_schema() -> Value {
    let root = schema_for!(CatalogFile);
    serde_json::to_value(root).unwrap_or_else(|_| serde_json::json!({ "type": "object" }))
}

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use crate::model::{KeywordType, Value};

/// Error type native handlers return. Passed through to the caller untouched.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;
pub type HandlerResult = Result<Option<Value>, HandlerError>;

type HandlerFn = dyn Fn(&Args) -> HandlerResult + Send + Sync;

// ── Handler ─────────────────────────────────────────────────────

/// A native action bound to a FUNCTION keyword. `arity` is the number of
/// positional arguments the action consumes, absent optionals included.
#[derive(Clone)]
pub struct Handler {
    arity: usize,
    call: Arc<HandlerFn>,
}

impl Handler {
    pub fn new<F>(arity: usize, f: F) -> Self
    where
        F: Fn(&Args) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            arity,
            call: Arc::new(f),
        }
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn invoke(&self, args: &Args) -> HandlerResult {
        (self.call)(args)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler(arity={})", self.arity)
    }
}

// ── Args ────────────────────────────────────────────────────────

/// Positional handler arguments: required slots first, then optionals.
/// An unfilled optional is `None`, never a stand-in value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args(Vec<Option<Value>>);

impl Args {
    pub fn new(values: Vec<Option<Value>>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index).and_then(Option::as_ref)
    }

    /// True when the slot exists but was left unfilled.
    pub fn is_absent(&self, index: usize) -> bool {
        matches!(self.0.get(index), Some(None))
    }

    /// Word or text content of the argument at `index`.
    pub fn str(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(Value::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&Value>> {
        self.0.iter().map(Option::as_ref)
    }
}

// ── Bind targets ────────────────────────────────────────────────

/// Host object an EVENT binds to: a fixed host object such as `document`,
/// or an element named in the command.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum BindTarget {
    Host(String),
    Element(String),
}

impl BindTarget {
    pub fn host(name: impl Into<String>) -> Self {
        Self::Host(name.into())
    }

    pub fn element(name: impl Into<String>) -> Self {
        Self::Element(name.into())
    }
}

impl fmt::Display for BindTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host(name) => f.write_str(name),
            Self::Element(name) => write!(f, "element:{name}"),
        }
    }
}

impl FromStr for BindTarget {
    type Err = String;

    /// `element:<name>` names an element, anything else a host object.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty bind target".to_string());
        }
        match s.strip_prefix("element:") {
            Some("") => Err("element bind target needs a name".to_string()),
            Some(name) => Ok(Self::element(name)),
            None => Ok(Self::host(s)),
        }
    }
}

// ── Definitions ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FunctionSpec {
    pub required: Vec<KeywordType>,
    pub optional: Vec<KeywordType>,
    /// Type of the value the handler returns, when it feeds an outer keyword.
    pub produces: Option<KeywordType>,
    pub handler: Handler,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventSpec {
    /// Bound to a host object fixed at registration.
    Target(BindTarget),
    /// Bound to the ELEMENT supplied by each command.
    BoundElement,
}

#[derive(Debug, Clone)]
pub enum Payload {
    Function(FunctionSpec),
    Event(EventSpec),
    /// Value keywords carry no behavior; their canonical id is the value.
    Literal,
}

/// Declared parameter slot of an invocable keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotSpec {
    pub ty: KeywordType,
    pub required: bool,
}

/// A registered keyword. Immutable once inside the registry.
#[derive(Debug, Clone)]
pub struct KeywordDefinition {
    canonical_id: String,
    ty: KeywordType,
    surface_words: Vec<String>,
    payload: Payload,
}

impl KeywordDefinition {
    pub(super) fn new(ty: KeywordType, surface_words: Vec<String>, payload: Payload) -> Self {
        let canonical_id = surface_words.first().cloned().unwrap_or_default();
        Self {
            canonical_id,
            ty,
            surface_words,
            payload,
        }
    }

    pub fn canonical_id(&self) -> &str {
        &self.canonical_id
    }

    pub fn ty(&self) -> KeywordType {
        self.ty
    }

    pub fn surface_words(&self) -> &[String] {
        &self.surface_words
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn function(&self) -> Option<&FunctionSpec> {
        match &self.payload {
            Payload::Function(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn event(&self) -> Option<&EventSpec> {
        match &self.payload {
            Payload::Event(spec) => Some(spec),
            _ => None,
        }
    }

    /// Value type a FUNCTION hands to its parent when run.
    pub fn produces(&self) -> Option<KeywordType> {
        self.function().and_then(|f| f.produces)
    }

    /// Parameter slots in positional order. A bound-element EVENT takes its
    /// target as one required ELEMENT slot.
    pub fn slots(&self) -> Vec<SlotSpec> {
        match &self.payload {
            Payload::Function(f) => f
                .required
                .iter()
                .map(|&ty| SlotSpec { ty, required: true })
                .chain(f.optional.iter().map(|&ty| SlotSpec { ty, required: false }))
                .collect(),
            Payload::Event(EventSpec::BoundElement) => vec![SlotSpec {
                ty: KeywordType::Element,
                required: true,
            }],
            Payload::Event(EventSpec::Target(_)) | Payload::Literal => Vec::new(),
        }
    }
}

// ── Drafts ──────────────────────────────────────────────────────

/// Unvalidated registration payload. `Registry::register` turns it into a
/// [`KeywordDefinition`] or rejects it without touching the registry.
#[derive(Debug, Clone, Default)]
pub struct KeywordDraft {
    pub ty: Option<KeywordType>,
    pub keywords: Vec<String>,
    /// `None` means no required slots.
    pub required: Option<Vec<KeywordType>>,
    pub optional: Vec<KeywordType>,
    pub produces: Option<KeywordType>,
    pub handler: Option<Handler>,
    pub bind_to: Option<BindTarget>,
    pub requires_bound_element: bool,
}

impl KeywordDraft {
    pub fn new<I, S>(ty: KeywordType, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ty: Some(ty),
            keywords: keywords.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn function<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(KeywordType::Function, keywords)
    }

    pub fn event<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(KeywordType::Event, keywords)
    }

    pub fn required(mut self, types: impl IntoIterator<Item = KeywordType>) -> Self {
        self.required = Some(types.into_iter().collect());
        self
    }

    pub fn optional(mut self, types: impl IntoIterator<Item = KeywordType>) -> Self {
        self.optional = types.into_iter().collect();
        self
    }

    pub fn produces(mut self, ty: KeywordType) -> Self {
        self.produces = Some(ty);
        self
    }

    pub fn handler(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Attach a handler whose arity is the slot count declared so far.
    pub fn exec<F>(self, f: F) -> Self
    where
        F: Fn(&Args) -> HandlerResult + Send + Sync + 'static,
    {
        let arity = self.required.as_ref().map_or(0, Vec::len) + self.optional.len();
        self.handler(Handler::new(arity, f))
    }

    pub fn bind_to(mut self, target: BindTarget) -> Self {
        self.bind_to = Some(target);
        self
    }

    pub fn requires_bound_element(mut self) -> Self {
        self.requires_bound_element = true;
        self
    }

    /// Keywords joined for error messages.
    pub(super) fn keyword_list(&self) -> String {
        self.keywords.join(", ")
    }
}

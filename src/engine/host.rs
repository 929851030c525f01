use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::dsl::ast::CompiledNode;
use crate::registry::BindTarget;

use super::trigger::{self, ExecError, Outcome};

pub type HostError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A subscription request: when `target` raises `signal`, run `body`.
/// The body lives as long as the binding.
#[derive(Debug, Clone)]
pub struct Binding {
    pub signal: String,
    pub target: BindTarget,
    pub body: Option<Arc<CompiledNode>>,
}

impl Binding {
    /// Run the bound body. Events nested in the body bind again on `host`
    /// every time this fires, so firing twice leaves two nested bindings.
    pub fn fire(&self, host: &mut dyn Host) -> Result<Option<Outcome>, ExecError> {
        self.body
            .as_deref()
            .map(|body| trigger::execute(body, host))
            .transpose()
    }
}

/// The host environment's subscription mechanism. Unsubscribing and
/// re-entrancy are the host's business.
pub trait Host {
    fn subscribe(&mut self, binding: Binding) -> Result<SubscriptionId, HostError>;
}

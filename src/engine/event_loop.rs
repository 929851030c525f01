use indexmap::IndexMap;

use crate::registry::BindTarget;

use super::host::{Binding, Host, HostError, SubscriptionId};
use super::trigger::ExecError;

/// In-memory host: holds bindings until something fires them.
#[derive(Debug, Default)]
pub struct EventLoop {
    next_id: u64,
    bindings: IndexMap<SubscriptionId, Binding>,
}

impl EventLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every binding on `target` for `signal`, in subscription order, and
    /// return how many ran. Bindings made while firing wait for the next
    /// `fire`. Stops at the first failing body.
    pub fn fire(&mut self, target: &BindTarget, signal: &str) -> Result<usize, ExecError> {
        let matching: Vec<Binding> = self
            .bindings
            .values()
            .filter(|b| b.target == *target && b.signal == signal)
            .cloned()
            .collect();
        tracing::info!(%target, signal, bindings = matching.len(), "fire");
        for binding in &matching {
            binding.fire(self)?;
        }
        Ok(matching.len())
    }

    /// Drop a binding. Returns false if it was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bindings.shift_remove(&id).is_some()
    }

    pub fn bindings(&self) -> impl Iterator<Item = (SubscriptionId, &Binding)> {
        self.bindings.iter().map(|(id, b)| (*id, b))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Host for EventLoop {
    fn subscribe(&mut self, binding: Binding) -> Result<SubscriptionId, HostError> {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.bindings.insert(id, binding);
        Ok(id)
    }
}

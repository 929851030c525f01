//! Runs compiled command trees: FUNCTION roots run now, EVENT roots bind to
//! a [`Host`] and run their body when the host fires the signal.

pub mod event_loop;
pub mod host;
pub mod trigger;

pub use event_loop::EventLoop;
pub use host::{Binding, Host, HostError, SubscriptionId};
pub use trigger::{bind, execute, run, ExecError, Outcome};

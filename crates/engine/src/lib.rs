//! The approval-flow state machine.
//!
//! Every transition (initiate, route, reject, delegate) executes as a single
//! database transaction: flow fields, document status flip, log append, and
//! chat-room changes all commit or none do. The flow row is locked with
//! `SELECT ... FOR UPDATE`, so two concurrent actions on the same flow
//! serialize and the loser sees an "already complete" / invalid-state error
//! instead of double-advancing.
//!
//! Email delivery goes through the [`Notifier`](notify::Notifier) port and
//! runs after commit; a delivery failure is logged, never rolled back into
//! the transition.

pub mod chat;
pub mod engine;
pub mod error;
pub mod maintenance;
pub mod notify;
pub mod stats;

pub use engine::FlowEngine;
pub use error::EngineError;
pub use notify::{Notifier, NullNotifier};

//! Event bus and notification delivery for the Signoff platform.
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`; handlers publish `flow.*` events after each
//!   committed transition so dashboards and the chat frontend can react.
//! - [`EmailNotifier`] -- SMTP implementation of the engine's
//!   [`Notifier`](signoff_engine::Notifier) port; constructed only when
//!   `SMTP_HOST` is configured.

pub mod bus;
pub mod email;

pub use bus::{EventBus, WorkflowEvent};
pub use email::{EmailConfig, EmailDelivery, EmailNotifier};

use std::sync::Arc;

use signoff_engine::Notifier;
use signoff_events::EventBus;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: signoff_db::DbPool,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// Centralized event bus for publishing workflow events.
    pub event_bus: Arc<EventBus>,
    /// Outbound email port; `NullNotifier` when SMTP is not configured.
    pub notifier: Arc<dyn Notifier>,
}

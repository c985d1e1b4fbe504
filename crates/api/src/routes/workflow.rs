use axum::routing::{get, post};
use axum::Router;

use crate::handlers::workflow;
use crate::state::AppState;

/// Flow lifecycle routes: submission, actions, detail, history, listing.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/documents/{document_id}/submit",
            post(workflow::submit_document),
        )
        .route("/flows", get(workflow::list_flows))
        .route("/flows/{flow_id}", get(workflow::get_flow))
        .route("/flows/{flow_id}/history", get(workflow::get_flow_history))
        .route("/flows/{flow_id}/action", post(workflow::flow_action))
}

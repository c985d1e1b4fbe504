pub mod health;
pub mod template;
pub mod workflow;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /documents/{document_id}/submit                  submit for approval (POST)
///
/// /flows?pending=true                              caller's open flows (GET)
/// /flows/{id}                                      flow detail (GET)
/// /flows/{id}/history                              document action log (GET)
/// /flows/{id}/action                               route / reject / delegate (POST)
///
/// /organizations/{org_id}/workflow-templates       list, create (GET, POST)
/// /organizations/{org_id}/workflow-stats           aggregate statistics (GET)
/// /workflow-templates/{id}                         template with steps (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Flow lifecycle: submit, action, detail, history, listing.
        .merge(workflow::router())
        // Template management and organization statistics.
        .merge(template::router())
}

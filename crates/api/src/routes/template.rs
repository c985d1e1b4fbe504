use axum::routing::get;
use axum::Router;

use crate::handlers::template;
use crate::state::AppState;

/// Template management and organization statistics routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/organizations/{org_id}/workflow-templates",
            get(template::list_templates).post(template::create_template),
        )
        .route(
            "/organizations/{org_id}/workflow-stats",
            get(template::workflow_stats),
        )
        .route(
            "/workflow-templates/{template_id}",
            get(template::get_template),
        )
}

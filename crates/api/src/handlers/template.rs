//! Handlers for workflow template management and organization statistics.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use signoff_core::error::CoreError;
use signoff_core::roles::OrgRole;
use signoff_core::types::{DbId, Timestamp};
use signoff_db::models::workflow::CreateTemplate;
use signoff_db::repositories::{MembershipRepo, TemplateRepo};
use signoff_engine::stats::compute_stats;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for the workflow stats endpoint.
#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
}

/// Require that the caller holds at least the given role in the organization.
async fn require_role(
    state: &AppState,
    organization_id: DbId,
    user_id: DbId,
    minimum: OrgRole,
) -> Result<OrgRole, AppError> {
    let role = MembershipRepo::resolve_role(&state.pool, organization_id, user_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Forbidden(
                "not an active member of this organization".into(),
            ))
        })?;
    if role.level() < minimum.level() {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "requires at least the {} role",
            minimum.as_str()
        ))));
    }
    Ok(role)
}

/// POST /api/v1/organizations/{org_id}/workflow-templates
///
/// Create a template with its steps. All routing violations are collected and
/// returned together; nothing is persisted on failure.
pub async fn create_template(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(org_id): Path<DbId>,
    Json(input): Json<CreateTemplate>,
) -> AppResult<impl IntoResponse> {
    require_role(&state, org_id, auth.user_id, OrgRole::Admin).await?;

    let created = TemplateRepo::create(&state.pool, org_id, &input).await?;

    tracing::info!(
        user_id = auth.user_id,
        organization_id = org_id,
        template_id = created.template.id,
        steps = created.steps.len(),
        "Workflow template created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// GET /api/v1/organizations/{org_id}/workflow-templates
pub async fn list_templates(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(org_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    require_role(&state, org_id, auth.user_id, OrgRole::Viewer).await?;
    let templates = TemplateRepo::list_for_org(&state.pool, org_id).await?;
    Ok(Json(DataResponse { data: templates }))
}

/// GET /api/v1/workflow-templates/{template_id}
///
/// A template with its ordered steps.
pub async fn get_template(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(template_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let found = TemplateRepo::find_with_steps(&state.pool, template_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "WorkflowTemplate",
                id: template_id,
            })
        })?;
    require_role(
        &state,
        found.template.organization_id,
        auth.user_id,
        OrgRole::Viewer,
    )
    .await?;
    Ok(Json(DataResponse { data: found }))
}

/// GET /api/v1/organizations/{org_id}/workflow-stats
///
/// Aggregate workflow statistics for an organization, optionally bounded to
/// flows started within `[from, to]`.
pub async fn workflow_stats(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(org_id): Path<DbId>,
    Query(query): Query<StatsQuery>,
) -> AppResult<impl IntoResponse> {
    require_role(&state, org_id, auth.user_id, OrgRole::Manager).await?;
    let stats = compute_stats(&state.pool, org_id, query.from, query.to).await?;
    Ok(Json(DataResponse { data: stats }))
}

//! Handlers for approval flow submission, actions, and history.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use signoff_core::roles::OrgRole;
use signoff_core::types::DbId;
use signoff_db::models::workflow::ApprovalFlow;
use signoff_db::repositories::{FlowRepo, LogRepo, MembershipRepo};
use signoff_engine::FlowEngine;
use signoff_events::WorkflowEvent;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for the submit endpoint.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub template_id: DbId,
}

/// Request body for the flow action endpoint.
#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    /// One of `route`, `reject`, `delegate`.
    pub action: String,
    /// Decision key, required for `route`.
    pub decision: Option<String>,
    /// Free-text comment, preserved verbatim in the log.
    pub comments: Option<String>,
    /// Delegation target, required for `delegate`.
    pub target_user_id: Option<DbId>,
}

/// Query parameters for the flow list endpoint.
#[derive(Debug, Deserialize)]
pub struct ListFlowsQuery {
    #[serde(default)]
    pub pending: bool,
    /// With an owner role in this organization, lists the whole org's open
    /// flows instead of just the caller's.
    pub organization_id: Option<DbId>,
}

/// POST /api/v1/documents/{document_id}/submit
///
/// Create an approval flow for a document against a template. The caller
/// becomes the submitter.
pub async fn submit_document(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(document_id): Path<DbId>,
    Json(input): Json<SubmitRequest>,
) -> AppResult<impl IntoResponse> {
    let flow =
        FlowEngine::initiate(&state.pool, document_id, input.template_id, auth.user_id).await?;

    state.event_bus.publish(
        WorkflowEvent::new("flow.initiated")
            .with_flow(flow.id)
            .with_actor(auth.user_id)
            .with_payload(json!({ "document_id": document_id })),
    );

    tracing::info!(
        user_id = auth.user_id,
        document_id,
        flow_id = flow.id,
        "Document submitted for approval"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: flow })))
}

/// POST /api/v1/flows/{flow_id}/action
///
/// Dispatch a workflow action (`route`, `reject`, `delegate`) to the engine.
pub async fn flow_action(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(flow_id): Path<DbId>,
    Json(input): Json<ActionRequest>,
) -> AppResult<impl IntoResponse> {
    let (flow, event_type) = match input.action.as_str() {
        "route" => {
            let decision = input
                .decision
                .as_deref()
                .ok_or_else(|| AppError::BadRequest("'route' requires a decision".into()))?;
            let flow = FlowEngine::route(
                &state.pool,
                state.notifier.as_ref(),
                flow_id,
                auth.user_id,
                decision,
                input.comments.as_deref(),
            )
            .await?;
            let event = if flow.is_approved {
                "flow.approved"
            } else {
                "flow.routed"
            };
            (flow, event)
        }
        "reject" => {
            let flow = FlowEngine::reject(
                &state.pool,
                state.notifier.as_ref(),
                flow_id,
                auth.user_id,
                input.comments.as_deref(),
            )
            .await?;
            (flow, "flow.rejected")
        }
        "delegate" => {
            let target = input.target_user_id.ok_or_else(|| {
                AppError::BadRequest("'delegate' requires a target_user_id".into())
            })?;
            let flow = FlowEngine::delegate(
                &state.pool,
                flow_id,
                auth.user_id,
                target,
                input.comments.as_deref(),
            )
            .await?;
            (flow, "flow.delegated")
        }
        other => {
            return Err(AppError::BadRequest(format!(
                "unknown action '{other}'; expected route, reject, or delegate"
            )));
        }
    };

    state.event_bus.publish(
        WorkflowEvent::new(event_type)
            .with_flow(flow.id)
            .with_actor(auth.user_id)
            .with_payload(json!({ "status": flow.status })),
    );

    Ok(Json(DataResponse { data: flow }))
}

/// GET /api/v1/flows/{flow_id}
pub async fn get_flow(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(flow_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let flow = FlowRepo::find_by_id(&state.pool, flow_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(signoff_core::error::CoreError::NotFound {
                entity: "ApprovalFlow",
                id: flow_id,
            })
        })?;
    Ok(Json(DataResponse { data: flow }))
}

/// GET /api/v1/flows/{flow_id}/history
///
/// The document's ordered, append-only action log.
pub async fn get_flow_history(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(flow_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let flow = FlowRepo::find_by_id(&state.pool, flow_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(signoff_core::error::CoreError::NotFound {
                entity: "ApprovalFlow",
                id: flow_id,
            })
        })?;
    let logs = LogRepo::list_for_document(&state.pool, flow.document_id).await?;
    Ok(Json(DataResponse { data: logs }))
}

/// GET /api/v1/flows?pending=true
///
/// The caller's open flows; with `organization_id` and an owner role there,
/// every open flow in the organization.
pub async fn list_flows(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListFlowsQuery>,
) -> AppResult<impl IntoResponse> {
    if !query.pending {
        return Err(AppError::BadRequest(
            "only pending=true is supported".into(),
        ));
    }

    let flows: Vec<ApprovalFlow> = match query.organization_id {
        Some(org_id) => {
            let role = MembershipRepo::resolve_role(&state.pool, org_id, auth.user_id).await?;
            if role != Some(OrgRole::Owner) {
                return Err(AppError::Core(signoff_core::error::CoreError::Forbidden(
                    "organization-wide listing requires the owner role".into(),
                )));
            }
            FlowRepo::list_open_for_org(&state.pool, org_id).await?
        }
        None => FlowRepo::list_pending_for_approver(&state.pool, auth.user_id).await?,
    };

    Ok(Json(DataResponse { data: flows }))
}

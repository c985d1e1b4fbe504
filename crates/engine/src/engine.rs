//! Transition operations of the approval flow state machine.

use chrono::Utc;
use signoff_core::error::CoreError;
use signoff_core::flow::{
    compute_deadline, FlowStatus, ACTION_DELEGATE, ACTION_REJECT, ACTION_ROUTE,
    DOC_STATUS_PENDING_APPROVAL, DOC_STATUS_REJECTED, DOC_STATUS_SIGNED,
};
use signoff_core::roles::OrgRole;
use signoff_core::routing::RouteTarget;
use signoff_core::types::DbId;
use signoff_db::models::document::Document;
use signoff_db::models::organization::{Membership, User};
use signoff_db::models::workflow::{ApprovalFlow, TemplateStep};
use signoff_db::repositories::{DocumentRepo, FlowRepo, LogRepo, MembershipRepo, TemplateRepo};
use signoff_db::DbPool;

use crate::chat;
use crate::error::{EngineError, EngineResult};
use crate::notify::Notifier;

/// The approval flow engine.
///
/// Each operation is a single all-or-nothing transaction; see the crate
/// docs for the concurrency contract.
pub struct FlowEngine;

impl FlowEngine {
    /// Start a flow for a document against a template.
    ///
    /// Guards, checked before anything is written: the document must exist
    /// and not already have a flow; the template must exist, be active, and
    /// belong to the document's organization; the template's first step must
    /// have an eligible approver.
    pub async fn initiate(
        pool: &DbPool,
        document_id: DbId,
        template_id: DbId,
        submitted_by: DbId,
    ) -> EngineResult<ApprovalFlow> {
        let document = DocumentRepo::find_by_id(pool, document_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Document",
                id: document_id,
            })?;

        if FlowRepo::find_by_document(pool, document_id).await?.is_some() {
            return Err(CoreError::Conflict(format!(
                "document {document_id} already has an approval flow"
            ))
            .into());
        }

        let template =
            TemplateRepo::find_by_id(pool, template_id)
                .await?
                .ok_or(CoreError::NotFound {
                    entity: "WorkflowTemplate",
                    id: template_id,
                })?;
        if !template.is_active {
            return Err(
                CoreError::Configuration(format!("template '{}' is inactive", template.name))
                    .into(),
            );
        }
        if template.organization_id != document.organization_id {
            return Err(CoreError::Configuration(format!(
                "template '{}' belongs to organization {}, document belongs to {}",
                template.name, template.organization_id, document.organization_id
            ))
            .into());
        }

        let first_step = TemplateRepo::first_step(pool, template_id)
            .await?
            .ok_or_else(|| {
                CoreError::Configuration(format!("template '{}' has no steps", template.name))
            })?;

        let approver =
            resolve_approver(pool, document.organization_id, &first_step).await?;
        let approver_user = load_user(pool, approver.user_id).await?;

        let now = Utc::now();
        let deadline = compute_deadline(now, first_step.timeout_days);

        let mut tx = pool.begin().await?;

        let flow = FlowRepo::create(
            &mut tx,
            document_id,
            template_id,
            first_step.id,
            approver.user_id,
            now,
            deadline,
        )
        .await?;
        DocumentRepo::set_status(&mut tx, document_id, DOC_STATUS_PENDING_APPROVAL).await?;
        LogRepo::append(
            &mut tx,
            document_id,
            Some(first_step.id),
            submitted_by,
            ACTION_ROUTE,
            None,
            None,
        )
        .await?;
        chat::create_room_for(&mut tx, flow.id, &document, submitted_by, &approver_user).await?;

        tx.commit().await?;

        tracing::info!(
            flow_id = flow.id,
            document_id,
            template_id,
            approver_id = approver.user_id,
            "Approval flow initiated"
        );
        Ok(flow)
    }

    /// Record the current approver's decision and advance or complete the
    /// flow according to the step's routing table.
    pub async fn route(
        pool: &DbPool,
        notifier: &dyn Notifier,
        flow_id: DbId,
        actor_id: DbId,
        decision: &str,
        comments: Option<&str>,
    ) -> EngineResult<ApprovalFlow> {
        let mut tx = pool.begin().await?;
        let flow = lock_flow(&mut tx, flow_id).await?;
        let document = load_document(pool, flow.document_id).await?;

        ensure_actor(pool, &flow, &document, actor_id).await?;
        let current_step = ensure_actionable(pool, &flow).await?;

        let template = TemplateRepo::find_by_id(pool, flow.template_id)
            .await?
            .ok_or_else(|| {
                CoreError::Internal(format!("flow {flow_id} references missing template"))
            })?;

        let target = match current_step.routing_table()?.resolve(decision) {
            Some(target) => target,
            None if template.allow_sequential_fallback => {
                RouteTarget::Step(current_step.step_order + 1)
            }
            None => {
                return Err(CoreError::Validation(format!(
                    "unknown decision '{decision}' for step {}",
                    current_step.step_order
                ))
                .into());
            }
        };

        let now = Utc::now();
        let updated = match target {
            RouteTarget::Complete => {
                let updated =
                    FlowRepo::complete(&mut tx, flow_id, FlowStatus::Approved, now).await?;
                DocumentRepo::set_status(&mut tx, document.id, DOC_STATUS_SIGNED).await?;
                chat::post_system_message(
                    &mut tx,
                    flow_id,
                    &format!("✅ \"{}\" approved — workflow complete", document.title),
                )
                .await?;
                updated
            }
            RouteTarget::Step(order) => {
                let next_step = TemplateRepo::find_step(pool, flow.template_id, order)
                    .await?
                    .ok_or_else(|| {
                        CoreError::Configuration(format!(
                            "decision '{decision}' routes to nonexistent step {order}"
                        ))
                    })?;
                // All-or-nothing: a missing approver aborts the transaction,
                // leaving the flow at its prior step with its prior approver.
                let approver =
                    resolve_approver(pool, document.organization_id, &next_step).await?;
                let approver_user = load_user(pool, approver.user_id).await?;
                let deadline = compute_deadline(now, next_step.timeout_days);

                let updated = FlowRepo::advance(
                    &mut tx,
                    flow_id,
                    next_step.id,
                    approver.user_id,
                    now,
                    deadline,
                )
                .await?;
                chat::sync_membership(&mut tx, flow_id, approver.user_id).await?;
                chat::post_system_message(
                    &mut tx,
                    flow_id,
                    &format!(
                        "🔄 Routed to step {order} — now awaiting @{}",
                        approver_user.display_name
                    ),
                )
                .await?;
                updated
            }
        };

        LogRepo::append(
            &mut tx,
            document.id,
            Some(current_step.id),
            actor_id,
            ACTION_ROUTE,
            Some(decision),
            comments,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            flow_id,
            actor_id,
            decision,
            status = %updated.status,
            "Flow routed"
        );

        if updated.is_approved {
            if let Err(e) = notifier.send_approval_email(&document).await {
                tracing::warn!(flow_id, error = %e, "Approval email delivery failed");
            }
        }
        Ok(updated)
    }

    /// Reject the flow at its current step.
    pub async fn reject(
        pool: &DbPool,
        notifier: &dyn Notifier,
        flow_id: DbId,
        actor_id: DbId,
        comments: Option<&str>,
    ) -> EngineResult<ApprovalFlow> {
        let mut tx = pool.begin().await?;
        let flow = lock_flow(&mut tx, flow_id).await?;
        let document = load_document(pool, flow.document_id).await?;

        ensure_actor(pool, &flow, &document, actor_id).await?;
        let current_step = ensure_actionable(pool, &flow).await?;
        // Loaded before commit; once the rejection is committed, only
        // best-effort delivery work remains.
        let actor_user = load_user(pool, actor_id).await?;

        let now = Utc::now();
        let updated = FlowRepo::complete(&mut tx, flow_id, FlowStatus::Rejected, now).await?;
        DocumentRepo::set_status(&mut tx, document.id, DOC_STATUS_REJECTED).await?;
        chat::post_system_message(
            &mut tx,
            flow_id,
            &format!("❌ \"{}\" rejected", document.title),
        )
        .await?;
        LogRepo::append(
            &mut tx,
            document.id,
            Some(current_step.id),
            actor_id,
            ACTION_REJECT,
            None,
            comments,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(flow_id, actor_id, "Flow rejected");

        if let Err(e) = notifier
            .send_rejection_email(&document, comments, &actor_user)
            .await
        {
            tracing::warn!(flow_id, error = %e, "Rejection email delivery failed");
        }
        Ok(updated)
    }

    /// Reassign the current approver without changing the step or deadline.
    pub async fn delegate(
        pool: &DbPool,
        flow_id: DbId,
        actor_id: DbId,
        target_user_id: DbId,
        comments: Option<&str>,
    ) -> EngineResult<ApprovalFlow> {
        let mut tx = pool.begin().await?;
        let flow = lock_flow(&mut tx, flow_id).await?;
        let document = load_document(pool, flow.document_id).await?;

        ensure_actor(pool, &flow, &document, actor_id).await?;
        let current_step = ensure_actionable(pool, &flow).await?;

        if !MembershipRepo::is_active_member(pool, document.organization_id, target_user_id)
            .await?
        {
            return Err(CoreError::Validation(format!(
                "delegate target {target_user_id} is not an active member of organization {}",
                document.organization_id
            ))
            .into());
        }

        let previous_approver_id = flow.current_approver_id.ok_or_else(|| {
            CoreError::InvalidState(format!("flow {flow_id} has no current approver"))
        })?;
        let previous_approver = load_user(pool, previous_approver_id).await?;
        let target_user = load_user(pool, target_user_id).await?;

        let updated = FlowRepo::reassign_approver(&mut tx, flow_id, target_user_id).await?;
        chat::sync_membership(&mut tx, flow_id, target_user_id).await?;
        chat::post_system_message(
            &mut tx,
            flow_id,
            &format!(
                "👤 Delegated from @{} to @{}",
                previous_approver.display_name, target_user.display_name
            ),
        )
        .await?;

        // The log names both approvers; the actor's free-text comment, if
        // any, is appended after the handover.
        let handover = match comments {
            Some(c) => format!(
                "delegated from {} to {}: {c}",
                previous_approver.display_name, target_user.display_name
            ),
            None => format!(
                "delegated from {} to {}",
                previous_approver.display_name, target_user.display_name
            ),
        };
        LogRepo::append(
            &mut tx,
            document.id,
            Some(current_step.id),
            actor_id,
            ACTION_DELEGATE,
            None,
            Some(&handover),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(flow_id, actor_id, target_user_id, "Flow delegated");
        Ok(updated)
    }
}

/// Lock the flow row for the duration of the transaction.
async fn lock_flow(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    flow_id: DbId,
) -> EngineResult<ApprovalFlow> {
    FlowRepo::lock_by_id(tx, flow_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "ApprovalFlow",
            id: flow_id,
        })
        .map_err(EngineError::from)
}

async fn load_document(pool: &DbPool, document_id: DbId) -> EngineResult<Document> {
    DocumentRepo::find_by_id(pool, document_id)
        .await?
        .ok_or_else(|| {
            CoreError::Internal(format!("flow references missing document {document_id}")).into()
        })
}

async fn load_user(pool: &DbPool, user_id: DbId) -> EngineResult<User> {
    MembershipRepo::find_user(pool, user_id)
        .await?
        .ok_or_else(|| CoreError::Internal(format!("missing user {user_id}")).into())
}

/// Authorization guard: the actor must be the current approver, or hold the
/// owner role in the document's organization. Owners may act on behalf of
/// any pending step. Checked before any state guard.
async fn ensure_actor(
    pool: &DbPool,
    flow: &ApprovalFlow,
    document: &Document,
    actor_id: DbId,
) -> EngineResult<()> {
    if flow.current_approver_id == Some(actor_id) {
        return Ok(());
    }
    let role = MembershipRepo::resolve_role(pool, document.organization_id, actor_id).await?;
    if role == Some(OrgRole::Owner) {
        return Ok(());
    }
    Err(CoreError::Forbidden(
        "only the current approver or an organization owner can act on this flow".into(),
    )
    .into())
}

/// State guard: the flow must be open and pointing at a step. Returns the
/// current step so transitions can consult its routing table.
async fn ensure_actionable(pool: &DbPool, flow: &ApprovalFlow) -> EngineResult<TemplateStep> {
    if flow.is_complete {
        return Err(CoreError::InvalidState(format!(
            "flow {} is already complete ({})",
            flow.id, flow.status
        ))
        .into());
    }
    let step_id = flow.current_step_id.ok_or_else(|| {
        CoreError::InvalidState(format!("flow {} has no current step", flow.id))
    })?;
    TemplateRepo::find_step_by_id(pool, step_id)
        .await?
        .ok_or_else(|| {
            CoreError::Internal(format!("flow {} references missing step {step_id}", flow.id))
                .into()
        })
}

/// Resolve the approver for a step's required role, or fail as a
/// configuration error. A workflow step is never silently skipped.
async fn resolve_approver(
    pool: &DbPool,
    organization_id: DbId,
    step: &TemplateStep,
) -> EngineResult<Membership> {
    let role = OrgRole::parse(&step.approver_role).ok_or_else(|| {
        CoreError::Configuration(format!(
            "step {} has unknown approver role '{}'",
            step.step_order, step.approver_role
        ))
    })?;
    MembershipRepo::find_approver(pool, organization_id, role)
        .await?
        .ok_or_else(|| {
            CoreError::Configuration(format!(
                "no eligible approver with role '{role}' in organization {organization_id} \
                 for step {}",
                step.step_order
            ))
            .into()
        })
}

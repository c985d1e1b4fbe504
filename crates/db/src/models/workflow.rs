//! Workflow template, step, flow, and log models and DTOs.

use serde::{Deserialize, Serialize};
use signoff_core::error::CoreError;
use signoff_core::flow::FlowStatus;
use signoff_core::routing::RoutingTable;
use signoff_core::types::{DbId, Timestamp};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// WorkflowTemplate
// ---------------------------------------------------------------------------

/// A row from the `workflow_templates` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkflowTemplate {
    pub id: DbId,
    pub organization_id: DbId,
    pub name: String,
    pub description: Option<String>,
    /// When true, an unknown decision key falls back to `step_order + 1`
    /// instead of being rejected. Off by default.
    pub allow_sequential_fallback: bool,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `template_steps` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TemplateStep {
    pub id: DbId,
    pub template_id: DbId,
    pub step_order: i32,
    pub approver_role: String,
    /// JSONB decision-key → target step order mapping (`0` = terminal).
    pub routing: serde_json::Value,
    pub timeout_days: i32,
    /// Stored and validated but not yet consulted by transitions.
    pub require_all_approvers: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TemplateStep {
    /// Decode the JSONB routing column into the typed table.
    ///
    /// Save-time validation guarantees this parses; a failure here means the
    /// column was modified outside the template store.
    pub fn routing_table(&self) -> Result<RoutingTable, CoreError> {
        serde_json::from_value(self.routing.clone()).map_err(|e| {
            CoreError::Configuration(format!(
                "step {} has an unreadable routing table: {e}",
                self.step_order
            ))
        })
    }
}

/// A template together with its ordered steps.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateWithSteps {
    #[serde(flatten)]
    pub template: WorkflowTemplate,
    pub steps: Vec<TemplateStep>,
}

/// DTO for creating a template with its steps in one call.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTemplate {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub allow_sequential_fallback: bool,
    pub steps: Vec<CreateTemplateStep>,
}

/// One step of a [`CreateTemplate`] request.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTemplateStep {
    pub step_order: i32,
    pub approver_role: String,
    #[serde(default)]
    pub routing: RoutingTable,
    #[serde(default = "default_timeout_days")]
    pub timeout_days: i32,
    #[serde(default)]
    pub require_all_approvers: bool,
}

fn default_timeout_days() -> i32 {
    3
}

// ---------------------------------------------------------------------------
// ApprovalFlow
// ---------------------------------------------------------------------------

/// A row from the `approval_flows` table: one document's live progress
/// through a template.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ApprovalFlow {
    pub id: DbId,
    pub document_id: DbId,
    pub template_id: DbId,
    pub status: String,
    pub is_complete: bool,
    pub is_approved: bool,
    pub current_step_id: Option<DbId>,
    pub current_approver_id: Option<DbId>,
    pub started_at: Timestamp,
    pub current_step_started_at: Option<Timestamp>,
    pub current_deadline: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ApprovalFlow {
    /// The typed status. The CHECK constraint makes the fallback unreachable
    /// in practice.
    pub fn flow_status(&self) -> Result<FlowStatus, CoreError> {
        FlowStatus::parse(&self.status)
            .ok_or_else(|| CoreError::Internal(format!("unknown flow status '{}'", self.status)))
    }

    /// Whether the flow is past its current-step deadline at `now`.
    pub fn is_overdue(&self, now: Timestamp) -> bool {
        !self.is_complete && self.current_deadline.is_some_and(|d| d < now)
    }
}

// ---------------------------------------------------------------------------
// WorkflowLog
// ---------------------------------------------------------------------------

/// A row from the append-only `workflow_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkflowLog {
    pub id: DbId,
    pub document_id: DbId,
    pub step_id: Option<DbId>,
    pub user_id: DbId,
    pub action: String,
    pub decision: Option<String>,
    pub comment: Option<String>,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Per-status flow counts for one organization.
#[derive(Debug, Clone, FromRow)]
pub struct FlowStatusCount {
    pub status: String,
    pub count: i64,
}

/// Started/completed timestamp pair for average-duration math.
#[derive(Debug, Clone, FromRow)]
pub struct CompletionPair {
    pub started_at: Timestamp,
    pub completed_at: Timestamp,
}

/// Per-template totals for the stats breakdown.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TemplateStatsRow {
    pub template_id: DbId,
    pub template_name: String,
    pub total: i64,
    pub approved: i64,
    pub rejected: i64,
}

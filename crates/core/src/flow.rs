//! Flow status vocabulary, log action constants, and deadline arithmetic.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Lifecycle states of an approval flow.
///
/// `pending → in_progress → {approved | rejected | cancelled}`.
/// `in_progress` is re-entered on every successful route-forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
    Pending,
    InProgress,
    Approved,
    Rejected,
    Cancelled,
}

impl FlowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStatus::Pending => "pending",
            FlowStatus::InProgress => "in_progress",
            FlowStatus::Approved => "approved",
            FlowStatus::Rejected => "rejected",
            FlowStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(raw: &str) -> Option<FlowStatus> {
        match raw {
            "pending" => Some(FlowStatus::Pending),
            "in_progress" => Some(FlowStatus::InProgress),
            "approved" => Some(FlowStatus::Approved),
            "rejected" => Some(FlowStatus::Rejected),
            "cancelled" => Some(FlowStatus::Cancelled),
            _ => None,
        }
    }

    /// `is_complete` is always derivable from status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FlowStatus::Approved | FlowStatus::Rejected | FlowStatus::Cancelled
        )
    }
}

impl std::fmt::Display for FlowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log action values for `workflow_logs.action`.
pub const ACTION_ROUTE: &str = "route";
pub const ACTION_REJECT: &str = "reject";
pub const ACTION_DELEGATE: &str = "delegate";
pub const ACTION_ESCALATE: &str = "escalate";

/// All valid log action values.
pub const VALID_ACTIONS: &[&str] = &[ACTION_ROUTE, ACTION_REJECT, ACTION_DELEGATE, ACTION_ESCALATE];

/// Document status values the engine reads and writes.
pub const DOC_STATUS_DRAFT: &str = "draft";
pub const DOC_STATUS_PENDING_REVIEW: &str = "pending_review";
pub const DOC_STATUS_PENDING_APPROVAL: &str = "pending_approval";
pub const DOC_STATUS_SIGNED: &str = "signed";
pub const DOC_STATUS_REJECTED: &str = "rejected";

/// Deadline for the current step: step start plus the step's timeout in days.
pub fn compute_deadline(step_started: Timestamp, timeout_days: i32) -> Timestamp {
    step_started + Duration::days(timeout_days as i64)
}

//! Organization-wide workflow statistics.

use chrono::Utc;
use serde::Serialize;
use signoff_core::stats::{approval_rate, avg_completion_days};
use signoff_core::types::{DbId, Timestamp};
use signoff_db::models::workflow::TemplateStatsRow;
use signoff_db::repositories::FlowRepo;
use signoff_db::DbPool;

/// Aggregated workflow metrics for one organization.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowStats {
    pub total: i64,
    /// Open flows (pending + in_progress).
    pub pending: i64,
    /// Terminal flows (approved + rejected + cancelled).
    pub completed: i64,
    pub approved: i64,
    pub rejected: i64,
    /// Open flows whose deadline is strictly in the past at query time.
    pub overdue_count: i64,
    /// approved / completed, 0 when nothing has completed.
    pub approval_rate: f64,
    /// Whole-day truncated average over flows with both timestamps, 0 when
    /// none qualify.
    pub avg_completion_days: f64,
    pub by_template: Vec<TemplateStatsRow>,
}

/// Compute stats for an organization, optionally restricted to flows
/// started within `[from, to]`. Overdue counting always uses "now".
pub async fn compute_stats(
    pool: &DbPool,
    organization_id: DbId,
    from: Option<Timestamp>,
    to: Option<Timestamp>,
) -> Result<WorkflowStats, sqlx::Error> {
    let counts = FlowRepo::status_counts(pool, organization_id, from, to).await?;

    let mut total = 0;
    let mut pending = 0;
    let mut approved = 0;
    let mut rejected = 0;
    let mut cancelled = 0;
    for row in &counts {
        total += row.count;
        match row.status.as_str() {
            "pending" | "in_progress" => pending += row.count,
            "approved" => approved += row.count,
            "rejected" => rejected += row.count,
            "cancelled" => cancelled += row.count,
            other => tracing::warn!(status = other, "Unknown flow status in stats"),
        }
    }
    let completed = approved + rejected + cancelled;

    let pairs: Vec<_> = FlowRepo::completion_pairs(pool, organization_id, from, to)
        .await?
        .into_iter()
        .map(|p| (p.started_at, p.completed_at))
        .collect();

    let overdue_count = FlowRepo::overdue_count(pool, organization_id, Utc::now()).await?;
    let by_template = FlowRepo::template_stats(pool, organization_id, from, to).await?;

    Ok(WorkflowStats {
        total,
        pending,
        completed,
        approved,
        rejected,
        overdue_count,
        approval_rate: approval_rate(approved, completed),
        avg_completion_days: avg_completion_days(&pairs),
        by_template,
    })
}

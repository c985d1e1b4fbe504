//! Maintenance utilities called by the worker sweep (and usable ad hoc).
//!
//! Deadlines are computed on demand from current state; there is no timer
//! inside the engine. The sweep repairs flows whose deadline was never
//! materialized and reports flows past their deadline.

use chrono::Utc;
use signoff_core::types::DbId;
use signoff_db::repositories::FlowRepo;
use signoff_db::DbPool;

/// Outcome of one maintenance pass.
#[derive(Debug, Clone, Copy)]
pub struct SweepReport {
    /// Open flows whose missing deadline was backfilled.
    pub deadlines_backfilled: u64,
    /// Open flows past their deadline at sweep time.
    pub overdue: usize,
}

/// Backfill missing deadlines, then report every overdue flow.
///
/// `organization_id = None` sweeps all tenants.
pub async fn run_sweep(
    pool: &DbPool,
    organization_id: Option<DbId>,
) -> Result<SweepReport, sqlx::Error> {
    let deadlines_backfilled = FlowRepo::backfill_missing_deadlines(pool).await?;
    if deadlines_backfilled > 0 {
        tracing::info!(deadlines_backfilled, "Backfilled missing flow deadlines");
    }

    let now = Utc::now();
    let overdue_flows = FlowRepo::list_overdue(pool, organization_id, now).await?;
    for flow in &overdue_flows {
        let days_overdue = flow
            .current_deadline
            .map(|d| (now - d).num_days())
            .unwrap_or(0);
        tracing::warn!(
            flow_id = flow.id,
            document_id = flow.document_id,
            approver_id = flow.current_approver_id,
            days_overdue,
            "Approval flow is overdue"
        );
    }

    Ok(SweepReport {
        deadlines_backfilled,
        overdue: overdue_flows.len(),
    })
}

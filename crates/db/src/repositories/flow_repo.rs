//! Repository for the `approval_flows` table.
//!
//! Transition writes take `&mut PgConnection` so they join the engine's
//! transaction; the flow row is locked with `SELECT ... FOR UPDATE` first so
//! concurrent actions on the same flow serialize and the loser sees the
//! already-advanced state instead of double-applying.

use signoff_core::flow::FlowStatus;
use signoff_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::workflow::{ApprovalFlow, CompletionPair, FlowStatusCount, TemplateStatsRow};

/// Column list for approval_flows queries.
const COLUMNS: &str = "id, document_id, template_id, status, is_complete, is_approved, \
    current_step_id, current_approver_id, started_at, current_step_started_at, \
    current_deadline, completed_at, created_at, updated_at";

pub struct FlowRepo;

impl FlowRepo {
    /// Insert a new flow at its first step, inside the initiate transaction.
    pub async fn create(
        conn: &mut PgConnection,
        document_id: DbId,
        template_id: DbId,
        step_id: DbId,
        approver_id: DbId,
        step_started_at: Timestamp,
        deadline: Timestamp,
    ) -> Result<ApprovalFlow, sqlx::Error> {
        let query = format!(
            "INSERT INTO approval_flows \
                (document_id, template_id, status, current_step_id, current_approver_id, \
                 started_at, current_step_started_at, current_deadline) \
             VALUES ($1, $2, 'pending', $3, $4, $5, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ApprovalFlow>(&query)
            .bind(document_id)
            .bind(template_id)
            .bind(step_id)
            .bind(approver_id)
            .bind(step_started_at)
            .bind(deadline)
            .fetch_one(conn)
            .await
    }

    /// Find a flow by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ApprovalFlow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM approval_flows WHERE id = $1");
        sqlx::query_as::<_, ApprovalFlow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the flow for a document (one-to-one).
    pub async fn find_by_document(
        pool: &PgPool,
        document_id: DbId,
    ) -> Result<Option<ApprovalFlow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM approval_flows WHERE document_id = $1");
        sqlx::query_as::<_, ApprovalFlow>(&query)
            .bind(document_id)
            .fetch_optional(pool)
            .await
    }

    /// Lock and load a flow row for the duration of a transaction.
    pub async fn lock_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<ApprovalFlow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM approval_flows WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, ApprovalFlow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Advance a flow to a new step with a new approver.
    pub async fn advance(
        conn: &mut PgConnection,
        id: DbId,
        step_id: DbId,
        approver_id: DbId,
        step_started_at: Timestamp,
        deadline: Timestamp,
    ) -> Result<ApprovalFlow, sqlx::Error> {
        let query = format!(
            "UPDATE approval_flows SET \
                status = 'in_progress', \
                current_step_id = $2, \
                current_approver_id = $3, \
                current_step_started_at = $4, \
                current_deadline = $5, \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ApprovalFlow>(&query)
            .bind(id)
            .bind(step_id)
            .bind(approver_id)
            .bind(step_started_at)
            .bind(deadline)
            .fetch_one(conn)
            .await
    }

    /// Terminalize a flow. Clears current step/approver/deadline so the
    /// terminal-state invariant holds.
    pub async fn complete(
        conn: &mut PgConnection,
        id: DbId,
        status: FlowStatus,
        completed_at: Timestamp,
    ) -> Result<ApprovalFlow, sqlx::Error> {
        debug_assert!(status.is_terminal());
        let query = format!(
            "UPDATE approval_flows SET \
                status = $2, \
                is_complete = TRUE, \
                is_approved = $3, \
                current_step_id = NULL, \
                current_approver_id = NULL, \
                current_deadline = NULL, \
                completed_at = $4, \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ApprovalFlow>(&query)
            .bind(id)
            .bind(status.as_str())
            .bind(status == FlowStatus::Approved)
            .bind(completed_at)
            .fetch_one(conn)
            .await
    }

    /// Reassign the current approver (delegation). Step, deadline, and
    /// status are deliberately untouched.
    pub async fn reassign_approver(
        conn: &mut PgConnection,
        id: DbId,
        approver_id: DbId,
    ) -> Result<ApprovalFlow, sqlx::Error> {
        let query = format!(
            "UPDATE approval_flows SET \
                current_approver_id = $2, \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ApprovalFlow>(&query)
            .bind(id)
            .bind(approver_id)
            .fetch_one(conn)
            .await
    }

    /// Open flows awaiting a specific approver, oldest deadline first.
    pub async fn list_pending_for_approver(
        pool: &PgPool,
        approver_id: DbId,
    ) -> Result<Vec<ApprovalFlow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM approval_flows \
             WHERE current_approver_id = $1 AND is_complete = FALSE \
             ORDER BY current_deadline ASC NULLS LAST, id ASC"
        );
        sqlx::query_as::<_, ApprovalFlow>(&query)
            .bind(approver_id)
            .fetch_all(pool)
            .await
    }

    /// All open flows in an organization (owner view).
    pub async fn list_open_for_org(
        pool: &PgPool,
        organization_id: DbId,
    ) -> Result<Vec<ApprovalFlow>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM approval_flows f \
             JOIN documents d ON d.id = f.document_id \
             WHERE d.organization_id = $1 AND f.is_complete = FALSE \
             ORDER BY f.current_deadline ASC NULLS LAST, f.id ASC",
            qualified_columns()
        );
        sqlx::query_as::<_, ApprovalFlow>(&query)
            .bind(organization_id)
            .fetch_all(pool)
            .await
    }

    /// Incomplete flows whose deadline is strictly in the past.
    ///
    /// `organization_id = None` scans all tenants (worker sweep).
    pub async fn list_overdue(
        pool: &PgPool,
        organization_id: Option<DbId>,
        now: Timestamp,
    ) -> Result<Vec<ApprovalFlow>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM approval_flows f \
             JOIN documents d ON d.id = f.document_id \
             WHERE ($1::BIGINT IS NULL OR d.organization_id = $1) \
               AND f.is_complete = FALSE \
               AND f.current_deadline IS NOT NULL \
               AND f.current_deadline < $2 \
             ORDER BY f.current_deadline ASC",
            qualified_columns()
        );
        sqlx::query_as::<_, ApprovalFlow>(&query)
            .bind(organization_id)
            .bind(now)
            .fetch_all(pool)
            .await
    }

    /// Backfill `current_deadline` for open flows missing one, from the
    /// current step's timeout. Returns the number of repaired rows.
    pub async fn backfill_missing_deadlines(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE approval_flows f SET \
                current_deadline = f.current_step_started_at \
                    + make_interval(days => s.timeout_days), \
                updated_at = NOW() \
             FROM template_steps s \
             WHERE s.id = f.current_step_id \
               AND f.is_complete = FALSE \
               AND f.current_deadline IS NULL \
               AND f.current_step_started_at IS NOT NULL",
        )
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    // -- Statistics queries ------------------------------------------------

    /// Flow counts per status for an organization within a started_at range.
    pub async fn status_counts(
        pool: &PgPool,
        organization_id: DbId,
        from: Option<Timestamp>,
        to: Option<Timestamp>,
    ) -> Result<Vec<FlowStatusCount>, sqlx::Error> {
        sqlx::query_as::<_, FlowStatusCount>(
            "SELECT f.status, COUNT(*) AS count \
             FROM approval_flows f \
             JOIN documents d ON d.id = f.document_id \
             WHERE d.organization_id = $1 \
               AND ($2::TIMESTAMPTZ IS NULL OR f.started_at >= $2) \
               AND ($3::TIMESTAMPTZ IS NULL OR f.started_at <= $3) \
             GROUP BY f.status",
        )
        .bind(organization_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }

    /// Started/completed pairs for flows with both timestamps set.
    pub async fn completion_pairs(
        pool: &PgPool,
        organization_id: DbId,
        from: Option<Timestamp>,
        to: Option<Timestamp>,
    ) -> Result<Vec<CompletionPair>, sqlx::Error> {
        sqlx::query_as::<_, CompletionPair>(
            "SELECT f.started_at, f.completed_at \
             FROM approval_flows f \
             JOIN documents d ON d.id = f.document_id \
             WHERE d.organization_id = $1 \
               AND f.completed_at IS NOT NULL \
               AND ($2::TIMESTAMPTZ IS NULL OR f.started_at >= $2) \
               AND ($3::TIMESTAMPTZ IS NULL OR f.started_at <= $3)",
        )
        .bind(organization_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }

    /// Count of incomplete flows past their deadline at `now`.
    pub async fn overdue_count(
        pool: &PgPool,
        organization_id: DbId,
        now: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM approval_flows f \
             JOIN documents d ON d.id = f.document_id \
             WHERE d.organization_id = $1 \
               AND f.is_complete = FALSE \
               AND f.current_deadline IS NOT NULL \
               AND f.current_deadline < $2",
        )
        .bind(organization_id)
        .bind(now)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Per-template totals for the stats breakdown.
    pub async fn template_stats(
        pool: &PgPool,
        organization_id: DbId,
        from: Option<Timestamp>,
        to: Option<Timestamp>,
    ) -> Result<Vec<TemplateStatsRow>, sqlx::Error> {
        sqlx::query_as::<_, TemplateStatsRow>(
            "SELECT t.id AS template_id, t.name AS template_name, \
                    COUNT(f.id) AS total, \
                    COUNT(f.id) FILTER (WHERE f.status = 'approved') AS approved, \
                    COUNT(f.id) FILTER (WHERE f.status = 'rejected') AS rejected \
             FROM workflow_templates t \
             LEFT JOIN approval_flows f ON f.template_id = t.id \
                  AND ($2::TIMESTAMPTZ IS NULL OR f.started_at >= $2) \
                  AND ($3::TIMESTAMPTZ IS NULL OR f.started_at <= $3) \
             WHERE t.organization_id = $1 \
             GROUP BY t.id, t.name \
             ORDER BY t.name ASC",
        )
        .bind(organization_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }
}

/// `f.`-qualified column list for JOIN queries.
fn qualified_columns() -> String {
    COLUMNS
        .split(", ")
        .map(|c| format!("f.{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}

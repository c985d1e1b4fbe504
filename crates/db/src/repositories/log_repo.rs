//! Repository for the append-only `workflow_logs` table.
//!
//! Rows are inserted inside engine transactions and never updated or
//! deleted. There is intentionally no update or delete method here.

use signoff_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::workflow::WorkflowLog;

/// Column list for workflow_logs queries.
const COLUMNS: &str = "id, document_id, step_id, user_id, action, decision, comment, created_at";

pub struct LogRepo;

impl LogRepo {
    /// Append one action row inside an engine transaction.
    pub async fn append(
        conn: &mut PgConnection,
        document_id: DbId,
        step_id: Option<DbId>,
        user_id: DbId,
        action: &str,
        decision: Option<&str>,
        comment: Option<&str>,
    ) -> Result<WorkflowLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO workflow_logs \
                (document_id, step_id, user_id, action, decision, comment) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkflowLog>(&query)
            .bind(document_id)
            .bind(step_id)
            .bind(user_id)
            .bind(action)
            .bind(decision)
            .bind(comment)
            .fetch_one(conn)
            .await
    }

    /// Chronological action history for a document.
    pub async fn list_for_document(
        pool: &PgPool,
        document_id: DbId,
    ) -> Result<Vec<WorkflowLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM workflow_logs \
             WHERE document_id = $1 \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, WorkflowLog>(&query)
            .bind(document_id)
            .fetch_all(pool)
            .await
    }

    /// Number of log rows for a document (used by tests and stats).
    pub async fn count_for_document(
        pool: &PgPool,
        document_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM workflow_logs WHERE document_id = $1")
                .bind(document_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}

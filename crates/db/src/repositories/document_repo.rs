//! Repository for the `documents` table.
//!
//! The workflow engine only reads documents and flips their `status`; full
//! document CRUD belongs to the documents app.

use signoff_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::document::Document;

/// Column list for documents queries.
const COLUMNS: &str = "id, organization_id, title, status, created_by, created_at, updated_at";

pub struct DocumentRepo;

impl DocumentRepo {
    /// Find a document by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Document>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM documents WHERE id = $1");
        sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Flip a document's status inside an engine transaction.
    pub async fn set_status(
        conn: &mut PgConnection,
        id: DbId,
        status: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE documents SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(conn)
            .await?;
        Ok(())
    }
}

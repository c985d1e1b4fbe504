//! Document model: the workflow engine reads `organization_id`/`created_by`
//! and writes `status`; everything else belongs to the documents app.

use serde::Serialize;
use signoff_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `documents` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Document {
    pub id: DbId,
    pub organization_id: DbId,
    pub title: String,
    pub status: String,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

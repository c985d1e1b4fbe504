//! Organization, user, and membership models.

use serde::{Deserialize, Serialize};
use signoff_core::roles::OrgRole;
use signoff_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub display_name: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `organizations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Organization {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `organization_memberships` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Membership {
    pub id: DbId,
    pub organization_id: DbId,
    pub user_id: DbId,
    pub role: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Membership {
    /// The typed role, or `None` for an unrecognized legacy string.
    pub fn org_role(&self) -> Option<OrgRole> {
        OrgRole::parse(&self.role)
    }
}

/// DTO for creating a membership (admin/seed surface).
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMembership {
    pub organization_id: DbId,
    pub user_id: DbId,
    pub role: String,
}

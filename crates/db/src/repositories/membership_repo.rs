//! Repository for the `organization_memberships` and `users` tables.

use signoff_core::roles::OrgRole;
use signoff_core::types::DbId;
use sqlx::PgPool;

use crate::models::organization::{Membership, User};

/// Column list for organization_memberships queries.
const MEMBERSHIP_COLUMNS: &str =
    "id, organization_id, user_id, role, is_active, created_at, updated_at";

/// Column list for users queries.
const USER_COLUMNS: &str = "id, email, display_name, is_active, created_at, updated_at";

/// Role resolution and approver lookup over organization memberships.
pub struct MembershipRepo;

impl MembershipRepo {
    /// Resolve a user's role within an organization.
    ///
    /// Returns `None` when the user has no active membership or the stored
    /// role string is unrecognized. Callers must treat `None` as "deny".
    pub async fn resolve_role(
        pool: &PgPool,
        organization_id: DbId,
        user_id: DbId,
    ) -> Result<Option<OrgRole>, sqlx::Error> {
        let role: Option<(String,)> = sqlx::query_as(
            "SELECT role FROM organization_memberships \
             WHERE organization_id = $1 AND user_id = $2 AND is_active = TRUE",
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
        Ok(role.and_then(|(r,)| OrgRole::parse(&r)))
    }

    /// Find an eligible approver: the first active member holding the
    /// required role, in membership creation order (deterministic). Legacy
    /// synonym strings for the role match too.
    ///
    /// Returns `None` when nobody holds the role. Callers treat that as a
    /// fatal configuration error, never a step to skip.
    pub async fn find_approver(
        pool: &PgPool,
        organization_id: DbId,
        role: OrgRole,
    ) -> Result<Option<Membership>, sqlx::Error> {
        let names: Vec<String> = role
            .accepted_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let query = format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM organization_memberships \
             WHERE organization_id = $1 AND role = ANY($2) AND is_active = TRUE \
             ORDER BY created_at ASC, id ASC \
             LIMIT 1"
        );
        sqlx::query_as::<_, Membership>(&query)
            .bind(organization_id)
            .bind(names)
            .fetch_optional(pool)
            .await
    }

    /// Whether the user has any active membership in the organization.
    pub async fn is_active_member(
        pool: &PgPool,
        organization_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let row: Option<(DbId,)> = sqlx::query_as(
            "SELECT id FROM organization_memberships \
             WHERE organization_id = $1 AND user_id = $2 AND is_active = TRUE",
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
        Ok(row.is_some())
    }

    /// Find a user by id.
    pub async fn find_user(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}

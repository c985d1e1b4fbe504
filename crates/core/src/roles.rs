//! Organizational role hierarchy used for approval authority.
//!
//! Roles are stored as lowercase strings on `organization_memberships`.
//! A handful of synonyms from older tenants are still accepted at parse
//! time and collapse onto the five canonical levels below.

use serde::{Deserialize, Serialize};

/// The five-level role ladder governing approval authority.
///
/// Ordinals: owner(5) > admin(4) > manager(3) > staff(2) > viewer(1).
/// "No role" is expressed as `Option<OrgRole>` at lookup sites so callers
/// must deny explicitly rather than fall through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrgRole {
    Owner,
    Admin,
    Manager,
    Staff,
    Viewer,
}

impl OrgRole {
    /// Parse a membership role string, accepting legacy synonyms.
    ///
    /// Unknown strings map to `None`; the caller treats that as "no role".
    pub fn parse(raw: &str) -> Option<OrgRole> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "owner" => Some(OrgRole::Owner),
            "admin" | "administrator" | "ceo" => Some(OrgRole::Admin),
            "manager" | "assistant_manager" => Some(OrgRole::Manager),
            "staff" | "contributor" | "employee" => Some(OrgRole::Staff),
            "viewer" | "guest" => Some(OrgRole::Viewer),
            _ => None,
        }
    }

    /// Canonical lowercase name, matching the CHECK constraint on
    /// `template_steps.approver_role`.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrgRole::Owner => "owner",
            OrgRole::Admin => "admin",
            OrgRole::Manager => "manager",
            OrgRole::Staff => "staff",
            OrgRole::Viewer => "viewer",
        }
    }

    /// Every stored string that collapses onto this role, canonical first.
    /// Used by membership queries so legacy synonym rows still match.
    pub fn accepted_names(&self) -> &'static [&'static str] {
        match self {
            OrgRole::Owner => &["owner"],
            OrgRole::Admin => &["admin", "administrator", "ceo"],
            OrgRole::Manager => &["manager", "assistant_manager"],
            OrgRole::Staff => &["staff", "contributor", "employee"],
            OrgRole::Viewer => &["viewer", "guest"],
        }
    }

    /// Ordinal level in the hierarchy.
    pub fn level(&self) -> u8 {
        match self {
            OrgRole::Owner => 5,
            OrgRole::Admin => 4,
            OrgRole::Manager => 3,
            OrgRole::Staff => 2,
            OrgRole::Viewer => 1,
        }
    }

    /// Strict ordinal comparison: equal roles do not outrank each other.
    pub fn outranks(&self, other: OrgRole) -> bool {
        self.level() > other.level()
    }
}

impl std::fmt::Display for OrgRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

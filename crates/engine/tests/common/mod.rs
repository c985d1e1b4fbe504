//! Shared fixtures for engine integration tests.

use signoff_core::routing::{RouteTarget, RoutingTable};
use signoff_core::types::DbId;
use signoff_db::models::workflow::{CreateTemplate, CreateTemplateStep, TemplateWithSteps};
use signoff_db::repositories::TemplateRepo;
use sqlx::PgPool;

/// One organization with a member at every rank.
pub struct TestOrg {
    pub org_id: DbId,
    pub owner: DbId,
    pub admin: DbId,
    pub manager: DbId,
    pub staff: DbId,
}

pub async fn create_user(pool: &PgPool, email: &str, display_name: &str) -> DbId {
    sqlx::query_scalar("INSERT INTO users (email, display_name) VALUES ($1, $2) RETURNING id")
        .bind(email)
        .bind(display_name)
        .fetch_one(pool)
        .await
        .expect("insert user")
}

pub async fn create_org(pool: &PgPool, slug: &str) -> DbId {
    sqlx::query_scalar("INSERT INTO organizations (name, slug) VALUES ($1, $1) RETURNING id")
        .bind(slug)
        .fetch_one(pool)
        .await
        .expect("insert organization")
}

pub async fn add_member(pool: &PgPool, org_id: DbId, user_id: DbId, role: &str) {
    sqlx::query(
        "INSERT INTO organization_memberships (organization_id, user_id, role) \
         VALUES ($1, $2, $3)",
    )
    .bind(org_id)
    .bind(user_id)
    .bind(role)
    .execute(pool)
    .await
    .expect("insert membership");
}

pub async fn create_document(pool: &PgPool, org_id: DbId, title: &str, created_by: DbId) -> DbId {
    sqlx::query_scalar(
        "INSERT INTO documents (organization_id, title, created_by) \
         VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(org_id)
    .bind(title)
    .bind(created_by)
    .fetch_one(pool)
    .await
    .expect("insert document")
}

/// Seed an organization with one active member per rank.
pub async fn seed_org(pool: &PgPool) -> TestOrg {
    let org_id = create_org(pool, "acme").await;
    let owner = create_user(pool, "owner@acme.test", "Olive Owner").await;
    let admin = create_user(pool, "admin@acme.test", "Ada Admin").await;
    let manager = create_user(pool, "manager@acme.test", "Mia Manager").await;
    let staff = create_user(pool, "staff@acme.test", "Sam Staff").await;

    add_member(pool, org_id, owner, "owner").await;
    add_member(pool, org_id, admin, "admin").await;
    add_member(pool, org_id, manager, "manager").await;
    add_member(pool, org_id, staff, "staff").await;

    TestOrg {
        org_id,
        owner,
        admin,
        manager,
        staff,
    }
}

/// Build a routing table from `(decision, target)` pairs.
pub fn routing(entries: &[(&str, i32)]) -> RoutingTable {
    RoutingTable(
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), RouteTarget::from_i32(*v).unwrap()))
            .collect(),
    )
}

pub fn step(step_order: i32, approver_role: &str, entries: &[(&str, i32)]) -> CreateTemplateStep {
    CreateTemplateStep {
        step_order,
        approver_role: approver_role.to_string(),
        routing: routing(entries),
        timeout_days: 3,
        require_all_approvers: false,
    }
}

/// Manager review then admin signoff, each decision explicit.
pub fn two_step_template() -> CreateTemplate {
    CreateTemplate {
        name: "Contract approval".to_string(),
        description: None,
        allow_sequential_fallback: false,
        steps: vec![
            step(1, "manager", &[("approve", 2)]),
            step(2, "admin", &[("approve", 0)]),
        ],
    }
}

/// Single manager step routing straight to completion.
pub fn one_step_template() -> CreateTemplate {
    CreateTemplate {
        name: "Quick signoff".to_string(),
        description: None,
        allow_sequential_fallback: false,
        steps: vec![step(1, "manager", &[("approve", 0)])],
    }
}

pub async fn create_template(
    pool: &PgPool,
    org_id: DbId,
    input: CreateTemplate,
) -> TemplateWithSteps {
    TemplateRepo::create(pool, org_id, &input)
        .await
        .expect("create template")
}

pub async fn document_status(pool: &PgPool, document_id: DbId) -> String {
    sqlx::query_scalar("SELECT status FROM documents WHERE id = $1")
        .bind(document_id)
        .fetch_one(pool)
        .await
        .expect("document status")
}

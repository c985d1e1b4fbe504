//! Shared fixtures and request helpers for API integration tests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use signoff_api::auth::jwt::{generate_access_token, JwtConfig};
use signoff_api::config::ServerConfig;
use signoff_api::router::build_app_router;
use signoff_api::state::AppState;
use signoff_core::routing::{RouteTarget, RoutingTable};
use signoff_core::types::DbId;
use signoff_db::models::workflow::{CreateTemplate, CreateTemplateStep, TemplateWithSteps};
use signoff_db::repositories::TemplateRepo;
use signoff_engine::NullNotifier;
use signoff_events::EventBus;

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a fixed JWT secret so tests can mint their own tokens.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "integration-test-secret-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
///
/// This calls the same [`build_app_router`] as `main.rs`, so integration
/// tests exercise the production middleware stack (CORS, request ID,
/// timeout, tracing, panic recovery).
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::new(EventBus::default()),
        notifier: Arc::new(NullNotifier),
    };
    build_app_router(state, &config)
}

/// Mint a bearer token for a user id with the test JWT secret.
pub fn token_for(user_id: DbId) -> String {
    generate_access_token(user_id, &test_config().jwt).expect("token generation")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn post_json(
    app: Router,
    uri: &str,
    token: &str,
    body: &serde_json::Value,
) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Collect and parse a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}

// ---------------------------------------------------------------------------
// Database fixtures
// ---------------------------------------------------------------------------

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

/// Manager review then admin signoff, each decision explicit.
pub async fn seed_two_step_template(pool: &PgPool, org_id: DbId) -> TemplateWithSteps {
    let routing_step1 = RoutingTable(
        [("approve".to_string(), RouteTarget::Step(2))]
            .into_iter()
            .collect(),
    );
    let routing_step2 = RoutingTable(
        [("approve".to_string(), RouteTarget::Complete)]
            .into_iter()
            .collect(),
    );
    let input = CreateTemplate {
        name: "Contract approval".to_string(),
        description: None,
        allow_sequential_fallback: false,
        steps: vec![
            CreateTemplateStep {
                step_order: 1,
                approver_role: "manager".to_string(),
                routing: routing_step1,
                timeout_days: 3,
                require_all_approvers: false,
            },
            CreateTemplateStep {
                step_order: 2,
                approver_role: "admin".to_string(),
                routing: routing_step2,
                timeout_days: 5,
                require_all_approvers: false,
            },
        ],
    };
    TemplateRepo::create(pool, org_id, &input)
        .await
        .expect("create template")
}

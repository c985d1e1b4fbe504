//! Integration tests for flow submission, actions, history, and listings.

mod common;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{body_json, get_auth, post_json, token_for};
use serde_json::json;
use signoff_api::error::AppError;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn flow_endpoints_require_a_bearer_token(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = common::get(app, "/api/v1/flows?pending=true").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn submit_creates_a_flow_at_the_first_step(pool: PgPool) {
    let org = common::seed_org(&pool).await;
    let doc = common::create_document(&pool, org.org_id, "Q3 contract", org.staff).await;
    let template = common::seed_two_step_template(&pool, org.org_id).await;
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        &format!("/api/v1/documents/{doc}/submit"),
        &token_for(org.staff),
        &json!({ "template_id": template.template.id }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "pending");
    assert_eq!(json["data"]["document_id"], doc);
    assert_eq!(json["data"]["current_approver_id"], org.manager);
}

#[sqlx::test(migrations = "../../migrations")]
async fn submitting_twice_returns_conflict(pool: PgPool) {
    let org = common::seed_org(&pool).await;
    let doc = common::create_document(&pool, org.org_id, "Q3 contract", org.staff).await;
    let template = common::seed_two_step_template(&pool, org.org_id).await;
    let app = common::build_test_app(pool);

    let body = json!({ "template_id": template.template.id });
    let uri = format!("/api/v1/documents/{doc}/submit");
    let token = token_for(org.staff);

    let first = post_json(app.clone(), &uri, &token, &body).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = post_json(app, &uri, &token, &body).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let json = body_json(second).await;
    assert_eq!(json["code"], "CONFLICT");
}

// Two simultaneous submits can both pass the existing-flow pre-check; the
// loser then hits the unique constraint on the insert. That violation must
// classify as a conflict, same as the sequential duplicate path.
#[sqlx::test(migrations = "../../migrations")]
async fn lost_submit_race_maps_to_conflict(pool: PgPool) {
    let org = common::seed_org(&pool).await;
    let doc = common::create_document(&pool, org.org_id, "Q3 contract", org.staff).await;
    let template = common::seed_two_step_template(&pool, org.org_id).await;
    let app = common::build_test_app(pool.clone());

    let response = post_json(
        app,
        &format!("/api/v1/documents/{doc}/submit"),
        &token_for(org.staff),
        &json!({ "template_id": template.template.id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let err = sqlx::query("INSERT INTO approval_flows (document_id, template_id) VALUES ($1, $2)")
        .bind(doc)
        .bind(template.template.id)
        .execute(&pool)
        .await
        .unwrap_err();
    assert_eq!(
        err.as_database_error().unwrap().constraint(),
        Some("uq_flow_document")
    );

    let response = AppError::Database(err).into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "CONFLICT");
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Submit a document and return the new flow's id.
async fn submit(pool: &PgPool, org: &common::TestOrg) -> i64 {
    let doc = common::create_document(pool, org.org_id, "Q3 contract", org.staff).await;
    let template = common::seed_two_step_template(pool, org.org_id).await;
    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        &format!("/api/v1/documents/{doc}/submit"),
        &token_for(org.staff),
        &json!({ "template_id": template.template.id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

#[sqlx::test(migrations = "../../migrations")]
async fn route_action_advances_the_flow(pool: PgPool) {
    let org = common::seed_org(&pool).await;
    let flow_id = submit(&pool, &org).await;
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        &format!("/api/v1/flows/{flow_id}/action"),
        &token_for(org.manager),
        &json!({ "action": "route", "decision": "approve" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "in_progress");
    assert_eq!(json["data"]["current_approver_id"], org.admin);
}

#[sqlx::test(migrations = "../../migrations")]
async fn route_action_without_decision_is_bad_request(pool: PgPool) {
    let org = common::seed_org(&pool).await;
    let flow_id = submit(&pool, &org).await;
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        &format!("/api/v1/flows/{flow_id}/action"),
        &token_for(org.manager),
        &json!({ "action": "route" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[sqlx::test(migrations = "../../migrations")]
async fn unknown_action_is_bad_request(pool: PgPool) {
    let org = common::seed_org(&pool).await;
    let flow_id = submit(&pool, &org).await;
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        &format!("/api/v1/flows/{flow_id}/action"),
        &token_for(org.manager),
        &json!({ "action": "escalate" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../migrations")]
async fn non_approver_action_is_forbidden(pool: PgPool) {
    let org = common::seed_org(&pool).await;
    let flow_id = submit(&pool, &org).await;
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        &format!("/api/v1/flows/{flow_id}/action"),
        &token_for(org.staff),
        &json!({ "action": "route", "decision": "approve" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "FORBIDDEN");
}

#[sqlx::test(migrations = "../../migrations")]
async fn reject_action_terminalizes_the_flow(pool: PgPool) {
    let org = common::seed_org(&pool).await;
    let flow_id = submit(&pool, &org).await;
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        &format!("/api/v1/flows/{flow_id}/action"),
        &token_for(org.manager),
        &json!({ "action": "reject", "comments": "insufficient budget" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "rejected");
    assert_eq!(json["data"]["is_complete"], true);
}

#[sqlx::test(migrations = "../../migrations")]
async fn delegate_action_requires_target_user(pool: PgPool) {
    let org = common::seed_org(&pool).await;
    let flow_id = submit(&pool, &org).await;
    let app = common::build_test_app(pool.clone());

    let response = post_json(
        app,
        &format!("/api/v1/flows/{flow_id}/action"),
        &token_for(org.manager),
        &json!({ "action": "delegate" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        &format!("/api/v1/flows/{flow_id}/action"),
        &token_for(org.manager),
        &json!({ "action": "delegate", "target_user_id": org.admin }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["current_approver_id"], org.admin);
}

// ---------------------------------------------------------------------------
// Detail, history, listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn flow_detail_and_history_are_readable(pool: PgPool) {
    let org = common::seed_org(&pool).await;
    let flow_id = submit(&pool, &org).await;

    let app = common::build_test_app(pool.clone());
    let response = get_auth(
        app,
        &format!("/api/v1/flows/{flow_id}"),
        &token_for(org.staff),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], flow_id);

    let app = common::build_test_app(pool);
    let response = get_auth(
        app,
        &format!("/api/v1/flows/{flow_id}/history"),
        &token_for(org.staff),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let logs = json["data"].as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["action"], "route");
}

#[sqlx::test(migrations = "../../migrations")]
async fn missing_flow_returns_not_found(pool: PgPool) {
    let org = common::seed_org(&pool).await;
    let app = common::build_test_app(pool);

    let response = get_auth(app, "/api/v1/flows/999999", &token_for(org.staff)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
}

#[sqlx::test(migrations = "../../migrations")]
async fn pending_listing_is_scoped_to_the_caller(pool: PgPool) {
    let org = common::seed_org(&pool).await;
    let flow_id = submit(&pool, &org).await;

    // The current approver sees the flow.
    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, "/api/v1/flows?pending=true", &token_for(org.manager)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["id"], flow_id);

    // The admin is not yet an approver and sees nothing.
    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/flows?pending=true", &token_for(org.admin)).await;
    let json = body_json(response).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn org_wide_listing_is_owner_only(pool: PgPool) {
    let org = common::seed_org(&pool).await;
    submit(&pool, &org).await;
    let uri = format!(
        "/api/v1/flows?pending=true&organization_id={}",
        org.org_id
    );

    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, &uri, &token_for(org.owner)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let app = common::build_test_app(pool);
    let response = get_auth(app, &uri, &token_for(org.manager)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

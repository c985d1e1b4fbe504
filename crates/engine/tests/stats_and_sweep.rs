//! Integration tests for organization statistics and the maintenance sweep.

mod common;

use chrono::{Duration, Utc};
use signoff_db::repositories::FlowRepo;
use signoff_engine::maintenance::run_sweep;
use signoff_engine::stats::compute_stats;
use signoff_engine::{FlowEngine, NullNotifier};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../migrations")]
async fn stats_aggregate_per_status_and_template(pool: PgPool) {
    let org = common::seed_org(&pool).await;
    let template = common::create_template(&pool, org.org_id, common::one_step_template()).await;

    let approved_doc = common::create_document(&pool, org.org_id, "Approved", org.staff).await;
    let rejected_doc = common::create_document(&pool, org.org_id, "Rejected", org.staff).await;
    let open_doc = common::create_document(&pool, org.org_id, "Open", org.staff).await;

    let f1 = FlowEngine::initiate(&pool, approved_doc, template.template.id, org.staff)
        .await
        .unwrap();
    FlowEngine::route(&pool, &NullNotifier, f1.id, org.manager, "approve", None)
        .await
        .unwrap();

    let f2 = FlowEngine::initiate(&pool, rejected_doc, template.template.id, org.staff)
        .await
        .unwrap();
    FlowEngine::reject(&pool, &NullNotifier, f2.id, org.manager, Some("no"))
        .await
        .unwrap();

    FlowEngine::initiate(&pool, open_doc, template.template.id, org.staff)
        .await
        .unwrap();

    let stats = compute_stats(&pool, org.org_id, None, None).await.unwrap();

    assert_eq!(stats.total, 3);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.completed, 2);
    assert_eq!(stats.approved, 1);
    assert_eq!(stats.rejected, 1);
    assert_eq!(stats.overdue_count, 0);
    assert!((stats.approval_rate - 0.5).abs() < f64::EPSILON);
    // Everything completed today, so whole-day truncation gives zero.
    assert_eq!(stats.avg_completion_days, 0.0);

    assert_eq!(stats.by_template.len(), 1);
    let row = &stats.by_template[0];
    assert_eq!(row.template_name, "Quick signoff");
    assert_eq!(row.total, 3);
    assert_eq!(row.approved, 1);
    assert_eq!(row.rejected, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn stats_window_excludes_flows_started_outside_it(pool: PgPool) {
    let org = common::seed_org(&pool).await;
    let template = common::create_template(&pool, org.org_id, common::one_step_template()).await;
    let doc = common::create_document(&pool, org.org_id, "Old", org.staff).await;
    FlowEngine::initiate(&pool, doc, template.template.id, org.staff)
        .await
        .unwrap();

    let tomorrow = Utc::now() + Duration::days(1);
    let stats = compute_stats(&pool, org.org_id, Some(tomorrow), None)
        .await
        .unwrap();

    assert_eq!(stats.total, 0);
    // The per-template breakdown still lists the template, with zero flows.
    assert_eq!(stats.by_template.len(), 1);
    assert_eq!(stats.by_template[0].total, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn stats_ignore_other_organizations(pool: PgPool) {
    let org = common::seed_org(&pool).await;
    let template = common::create_template(&pool, org.org_id, common::one_step_template()).await;
    let doc = common::create_document(&pool, org.org_id, "Mine", org.staff).await;
    FlowEngine::initiate(&pool, doc, template.template.id, org.staff)
        .await
        .unwrap();

    let other_org = common::create_org(&pool, "globex").await;
    let stats = compute_stats(&pool, other_org, None, None).await.unwrap();
    assert_eq!(stats.total, 0);
    assert!(stats.by_template.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn sweep_backfills_missing_deadlines(pool: PgPool) {
    let org = common::seed_org(&pool).await;
    let template = common::create_template(&pool, org.org_id, common::one_step_template()).await;
    let doc = common::create_document(&pool, org.org_id, "No deadline", org.staff).await;
    let flow = FlowEngine::initiate(&pool, doc, template.template.id, org.staff)
        .await
        .unwrap();

    // Simulate a row created before deadlines were materialized.
    sqlx::query("UPDATE approval_flows SET current_deadline = NULL WHERE id = $1")
        .bind(flow.id)
        .execute(&pool)
        .await
        .unwrap();

    let report = run_sweep(&pool, None).await.unwrap();
    assert_eq!(report.deadlines_backfilled, 1);

    let repaired = FlowRepo::find_by_id(&pool, flow.id).await.unwrap().unwrap();
    let deadline = repaired.current_deadline.expect("deadline restored");
    let expected = repaired.current_step_started_at.unwrap() + Duration::days(3);
    assert_eq!(deadline, expected);
}

#[sqlx::test(migrations = "../../migrations")]
async fn sweep_reports_overdue_flows(pool: PgPool) {
    let org = common::seed_org(&pool).await;
    let template = common::create_template(&pool, org.org_id, common::one_step_template()).await;
    let doc = common::create_document(&pool, org.org_id, "Late", org.staff).await;
    let flow = FlowEngine::initiate(&pool, doc, template.template.id, org.staff)
        .await
        .unwrap();

    sqlx::query("UPDATE approval_flows SET current_deadline = NOW() - INTERVAL '2 days' WHERE id = $1")
        .bind(flow.id)
        .execute(&pool)
        .await
        .unwrap();

    let report = run_sweep(&pool, Some(org.org_id)).await.unwrap();
    assert_eq!(report.overdue, 1);

    // Terminal flows are never overdue.
    FlowEngine::route(&pool, &NullNotifier, flow.id, org.manager, "approve", None)
        .await
        .unwrap();
    let report = run_sweep(&pool, Some(org.org_id)).await.unwrap();
    assert_eq!(report.overdue, 0);
}

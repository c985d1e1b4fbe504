//! Deadline sweep worker.
//!
//! Runs `signoff_engine::maintenance::run_sweep` on an interval: backfills
//! missing step deadlines and logs every overdue flow. It shares the API
//! server's database but runs as its own process so a slow sweep never
//! competes with request handling.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default seconds between sweeps; override with `SWEEP_INTERVAL_SECS`.
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3600;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "signoff_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = signoff_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    signoff_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    let sweep_interval = std::env::var("SWEEP_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS);
    tracing::info!(sweep_interval, "Worker starting");

    let cancel = CancellationToken::new();
    let sweep_cancel = cancel.clone();
    let sweep_handle = tokio::spawn(async move {
        run_sweep_loop(pool, sweep_cancel, Duration::from_secs(sweep_interval)).await;
    });

    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl-C handler");
    tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");

    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), sweep_handle).await;
    tracing::info!("Graceful shutdown complete");
}

/// Run the sweep loop until the token is cancelled.
///
/// The first tick fires immediately, so a freshly started worker sweeps
/// before settling into its interval.
async fn run_sweep_loop(pool: signoff_db::DbPool, cancel: CancellationToken, period: Duration) {
    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Sweep loop cancelled");
                break;
            }
            _ = interval.tick() => {
                match signoff_engine::maintenance::run_sweep(&pool, None).await {
                    Ok(report) => {
                        tracing::info!(
                            deadlines_backfilled = report.deadlines_backfilled,
                            overdue = report.overdue,
                            "Sweep complete"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Sweep failed");
                    }
                }
            }
        }
    }
}

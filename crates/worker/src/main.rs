use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adpilot_engine::Automation;
use adpilot_worker::{SchedulerLoop, WorkerConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adpilot_worker=debug,adpilot_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = adpilot_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    adpilot_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    adpilot_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    let automation =
        Arc::new(Automation::from_env(pool).expect("Failed to configure automation engine"));

    let cancel = CancellationToken::new();
    let scheduler = SchedulerLoop::new(automation, config);
    let loop_cancel = cancel.clone();
    let handle = tokio::spawn(async move {
        scheduler.run(loop_cancel).await;
    });

    shutdown_signal().await;
    cancel.cancel();

    // A cycle in flight gets a grace period to write its run log.
    if tokio::time::timeout(Duration::from_secs(30), handle).await.is_err() {
        tracing::warn!("Scheduler loop did not stop within 30 s");
    }
    tracing::info!("Worker shut down");
}

/// Wait for SIGINT or (on Unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use edupush_channels::expo::ExpoDispatcher;
use edupush_channels::fcm::FcmDispatcher;
use edupush_channels::transport::HttpTransport;
use edupush_db::backend::PgBackend;
use edupush_engine::config::EngineConfig;
use edupush_engine::delivery::DeliveryEngine;
use edupush_engine::resolver::TargetResolver;
use edupush_engine::scheduler::Scheduler;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "edupush_engine=debug,edupush_channels=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = EngineConfig::from_env();
    tracing::info!(
        poll_interval_secs = config.poll_interval.as_secs(),
        lease_secs = config.lease.num_seconds(),
        "Loaded engine configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = edupush_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    edupush_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    edupush_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Channels ---
    let expo_transport = HttpTransport::new(&config.expo_push_url, config.chunk_timeout)
        .expect("Failed to build Expo transport");
    let fcm_transport = HttpTransport::new(&config.fcm_send_url, config.chunk_timeout)
        .expect("Failed to build FCM transport")
        .with_authorization(format!("key={}", config.fcm_server_key));

    let expo = Arc::new(ExpoDispatcher::new(Arc::new(expo_transport)));
    let fcm = Arc::new(FcmDispatcher::new(Arc::new(fcm_transport)));

    // --- Scheduler ---
    let backend = Arc::new(PgBackend::new(pool));
    let scheduler = Scheduler::new(
        backend.clone(),
        TargetResolver::new(backend.clone()),
        DeliveryEngine::new(backend.clone(), backend.clone(), expo, fcm),
        config.poll_interval,
        config.lease,
    );

    let cancel = CancellationToken::new();
    let scheduler_cancel = cancel.clone();
    let scheduler_handle = tokio::spawn(async move {
        scheduler.run(scheduler_cancel).await;
    });

    shutdown_signal().await;

    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(30), scheduler_handle).await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the engine shuts
/// down cleanly whether stopped interactively or by a process manager.
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
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

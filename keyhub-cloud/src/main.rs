//! keyhub-cloud server
//!
//! Long-running service that serves the storefront API, keeps the catalog
//! cache warm, and finishes checkouts whose keys arrive late.

use keyhub_cloud::tasks::RefreshScheduler;
use keyhub_cloud::{AppState, BoxError, Config, api};
use std::time::Duration;

/// How often expired reservations and cache entries are swept
const SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "keyhub_cloud=info,keyhub_client=info,tower_http=info".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting keyhub-cloud (env: {})", config.environment);

    let state = AppState::new(&config)?;

    // Cache refresh jobs
    let mut scheduler = RefreshScheduler::new(state.catalog.cache().clone());
    for job in state.catalog.refresh_jobs(&config) {
        scheduler.register(job);
    }
    scheduler.start();

    // Periodic sweep (every 5 minutes)
    let sweep_state = state.clone();
    let sweeper = tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let reservations = sweep_state.orders.prune_expired();
            let entries = sweep_state.cache_store.evict_expired();
            if reservations > 0 || entries > 0 {
                tracing::debug!(reservations, entries, "Swept expired state");
            }
        }
    });

    let app = api::create_router(state.clone());

    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("keyhub-cloud HTTP listening on {http_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down");
    sweeper.abort();
    scheduler.stop().await;
    state.orders.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
}

//! NHL Standings Service
//!
//! Syncs completed NHL games into PostgreSQL on an interval and serves
//! date-range standings over HTTP.

use anyhow::{Context, Result};
use nhl_standings::api::{self, AppState};
use nhl_standings::health::HealthState;
use nhl_standings::nhl::{NhlApiClient, NhlSource};
use nhl_standings::season::Season;
use nhl_standings::store::{PgStore, Store};
use nhl_standings::sync::SyncService;
use nhl_standings::Config;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const DB_CONNECT_RETRIES: u32 = 5;

/// One sync pass, recorded into the health state.
async fn sync_once<S: Store, C: NhlSource>(
    service: &SyncService<S, C>,
    health: &HealthState,
    season: Option<Season>,
) -> Result<usize> {
    let start = std::time::Instant::now();
    match service.sync_current_season(season).await {
        Ok(report) => {
            for day in report.failed_days() {
                warn!("Day {} failed and will be retried next run", day.date);
            }
            let count = report.games_synced();
            health.record_success(count).await;
            info!(
                run_id = %report.run_id,
                "Sync completed: {} games over {} days in {:?}",
                count,
                report.days_checked(),
                start.elapsed()
            );
            Ok(count)
        }
        Err(e) => {
            health.record_error().await;
            Err(e).context("Sync run failed")
        }
    }
}

/// Periodic sync loop
async fn run<S: Store, C: NhlSource>(
    service: Arc<SyncService<S, C>>,
    health: HealthState,
    season: Option<Season>,
    interval: Duration,
) {
    info!("Starting sync loop (interval: {}s)", interval.as_secs());
    loop {
        if let Err(e) = sync_once(&service, &health, season).await {
            error!("{:?}", e);
        }
        tokio::time::sleep(interval).await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Optional .env for local runs; real deployments use env vars / secrets
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e).context("Failed to load .env");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nhl_standings=info".parse().context("Invalid log directive")?),
        )
        .init();

    info!("NHL Standings Service v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    let store = PgStore::connect_with_retry(&config.database_url, DB_CONNECT_RETRIES).await?;
    store.ensure_schema().await.context("Failed to prepare database schema")?;
    let client = NhlApiClient::new(&config.client_config())?;

    let service = Arc::new(SyncService::new(store, client));
    let health = HealthState::new();

    let app = api::router(AppState::new(Arc::clone(&service), health.clone()));
    let api_addr = format!("0.0.0.0:{}", config.api_port);
    info!("API listening on {}", api_addr);

    let listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("Failed to bind {}", api_addr))?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("API server stopped: {}", e);
        }
    });

    // One-shot mode (manual trigger)
    if config.run_once {
        info!("Running in one-shot mode (RUN_ONCE=true)");
        let count = sync_once(&service, &health, config.sync_season).await?;
        info!("One-shot sync completed: {} games stored", count);
        return Ok(());
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    tokio::select! {
        _ = run(Arc::clone(&service), health, config.sync_season, config.sync_interval()) => {}
        _ = ctrl_c => {
            info!("Shutting down...");
        }
    }

    Ok(())
}

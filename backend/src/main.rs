//! Backend entry-point: loads settings, wires adapters and serves the API.

mod server;

use std::sync::Arc;

use actix_web::web;
use color_eyre::eyre::{Context, eyre};
use mockable::{Clock, DefaultClock};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use onemore::inbound::http::health::HealthState;
use onemore::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};

use server::{
    Adapters, AppSettings, ServerConfig, build_http_state, build_identity_verifier, create_server,
};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .map_err(|e| eyre!("failed to load settings: {e}"))?;
    info!(settings = ?settings, "configuration loaded");
    let bind_addr = settings.bind_addr().wrap_err("invalid bind address")?;
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    let adapters = match settings.database_url() {
        Some(url) => {
            if settings.skip_migrations {
                info!("skipping database migrations");
            } else {
                run_pending_migrations(url)
                    .await
                    .wrap_err("failed to run migrations")?;
            }
            let pool = DbPool::new(
                PoolConfig::new(url).with_max_size(settings.db_max_connections()),
            )
            .await
            .wrap_err("failed to build database pool")?;
            Adapters::postgres(pool, clock.clone())
        }
        None => {
            warn!("no database URL configured; counters are kept in memory");
            Adapters::in_memory(clock.clone())
        }
    };

    let verifier = build_identity_verifier(&settings)?;
    let http_state = build_http_state(adapters, verifier, settings.provisioning_policy(), clock);
    let cors_origins = settings.cors_origins();
    info!(origins = ?cors_origins, "cross-origin requests allowed");
    let config = ServerConfig::new(bind_addr, http_state).with_cors_origins(cors_origins);
    #[cfg(feature = "metrics")]
    let config = config.with_metrics(server::make_metrics()?);

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    info!(%bind_addr, "listening");
    server.await?;
    Ok(())
}

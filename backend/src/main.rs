//! Backend entry-point: loads settings, prepares the database and serves the
//! REST API.

mod server;

use std::ffi::OsString;

use actix_web::web;
use color_eyre::eyre::{Context, Result, eyre};
use diesel::{Connection, PgConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use fieldops::inbound::http::health::HealthState;
use fieldops::outbound::persistence::DbPool;
use ortho_config::OrthoConfig;
use server::{ServerConfig, ServerSettings, create_server};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load_from_iter(std::env::args_os().collect::<Vec<OsString>>())
        .map_err(|err| eyre!("failed to load settings: {err}"))?;
    let pool_config = settings.pool_config()?;

    if settings.run_migrations {
        let url = pool_config.database_url().to_owned();
        web::block(move || run_migrations(&url))
            .await
            .wrap_err("migration task failed")??;
    }

    let pool = DbPool::new(pool_config)
        .await
        .wrap_err("failed to build database pool")?;
    let config = ServerConfig::from_settings(&settings, pool)?;
    let bind_addr = config.bind_addr;

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)
        .wrap_err_with(|| format!("failed to start server on {bind_addr}"))?;
    info!(%bind_addr, "server listening");
    server.await.wrap_err("server terminated with an error")
}

fn run_migrations(url: &str) -> Result<()> {
    let mut conn = PgConnection::establish(url).wrap_err("failed to connect for migrations")?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| eyre!("failed to apply migrations: {err}"))?;
    info!(count = applied.len(), "migrations applied");
    Ok(())
}

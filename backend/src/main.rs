//! Backend entry-point: loads settings, prepares storage, and serves the API.

mod server;

use std::ffi::OsString;

use actix_web::web;
use color_eyre::eyre::{Context, Result};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use backend::inbound::http::health::HealthState;
use backend::outbound::persistence::{DbPool, run_pending_migrations};
use server::{AppSettings, JwtSettings, PostgresSettings, ServerConfig, create_server};

fn init_tracing(app: &AppSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(app.default_log_level()));
    if let Err(e) = fmt().with_env_filter(filter).json().try_init() {
        warn!(error = %e, "tracing init failed");
    }
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = || std::env::args_os().take(1).collect::<Vec<OsString>>();
    let app = AppSettings::load_from_iter(args()).wrap_err("loading APP_* settings")?;
    init_tracing(&app);

    let jwt = JwtSettings::load_from_iter(args())
        .wrap_err("loading JWT_* settings")?
        .jwt_config()?;
    let mut config = ServerConfig::new(app.bind_addr()?, jwt);

    if app.testing {
        info!("APP_TESTING set; serving from in-memory storage");
    } else {
        let postgres =
            PostgresSettings::load_from_iter(args()).wrap_err("loading POSTGRES_* settings")?;
        let pool_config = postgres.pool_config()?;
        if app.run_migrations() {
            run_pending_migrations(pool_config.database_url())
                .await
                .wrap_err("applying database migrations")?;
        }
        let pool = DbPool::new(pool_config)
            .await
            .wrap_err("building database pool")?;
        config = config.with_db_pool(pool);
    }

    let health_state = web::Data::new(HealthState::new());
    create_server(health_state, config)?.await?;
    Ok(())
}

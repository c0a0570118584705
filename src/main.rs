//! Campus Auth server
//!
//! Reads configuration from a TOML file (~/.config/campus-auth/config.toml
//! or `$CAMPUS_AUTH_CONFIG`), with environment variables taking precedence.

use std::sync::Arc;

use sea_orm_migration::MigratorTrait;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use campus_auth::auth::TokenService;
use campus_auth::config::{LogFormat, LoggingConfig, CONFIG_PATH_ENV};
use campus_auth::infrastructure::database::migrator::Migrator;
use campus_auth::{
    create_router, default_config_path, init_database, AppConfig, AuthHandlerState,
    SeaOrmUserStore,
};

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Load configuration ─────────────────────────────────────
    let config_path = std::env::var(CONFIG_PATH_ENV)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| default_config_path());

    let app_cfg = match AppConfig::load(&config_path) {
        Ok(cfg) => {
            init_tracing(&cfg.logging);
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            init_tracing(&LoggingConfig::default());
            error!("Failed to load configuration from {}: {}", config_path.display(), e);
            return Err(e.into());
        }
    };

    if let Err(e) = app_cfg.validate() {
        error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    let jwt_config = app_cfg.jwt_config()?;
    let tokens = Arc::new(TokenService::new(&jwt_config)?);
    info!(
        "Tokens expire after {} hours (issuer {})",
        jwt_config.expiration_hours, jwt_config.issuer
    );

    // ── Database ───────────────────────────────────────────────
    let db = match init_database(&app_cfg.database).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(e.into());
        }
    };

    info!("Running database migrations...");
    if let Err(e) = Migrator::up(&db, None).await {
        error!("Failed to run migrations: {}", e);
        return Err(e.into());
    }
    info!("Migrations completed");

    let users = Arc::new(SeaOrmUserStore::new(db, app_cfg.database.query_timeout()));
    let state = AuthHandlerState::new(users, tokens, app_cfg.password_hasher());

    // ── REST API ───────────────────────────────────────────────
    let api_router = create_router(state);
    let api_addr = app_cfg.server.address();
    let listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("REST API server listening on http://{}", api_addr);
    info!("Swagger UI available at http://{}/docs/", api_addr);

    if let Err(e) = axum::serve(listener, api_router).await {
        error!("REST API server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}

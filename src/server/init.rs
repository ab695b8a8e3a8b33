/**
 * Server Initialization
 *
 * Builds the application: connects the database pool, runs embedded
 * migrations, wires up the mailer, and assembles the router with its
 * shared state.
 */

use std::sync::Arc;

use axum::Router;
use sqlx::PgPool;

use crate::error::AuthError;
use crate::mailer::SmtpMailer;
use crate::routes::create_router;
use crate::server::config::Config;
use crate::server::state::AppState;

/// Connect to the database and run migrations
///
/// Unlike optional services, the auth core cannot operate without its
/// store, so a connection failure is fatal.
pub async fn connect_database(config: &Config) -> Result<PgPool, sqlx::Error> {
    tracing::info!("connecting to database");
    let pool = PgPool::connect(&config.database_url).await?;

    tracing::info!("running database migrations");
    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Build the complete application router
pub async fn create_app(config: Config) -> Result<Router, Box<dyn std::error::Error>> {
    let pool = connect_database(&config).await?;

    let mailer = Arc::new(SmtpMailer::new(&config.smtp)?);

    let state = AppState::new(pool, mailer, config);
    Ok(create_router(state))
}

/// Health check used by deploy probes
pub async fn health() -> Result<axum::Json<serde_json::Value>, AuthError> {
    Ok(axum::Json(serde_json::json!({
        "success": true,
        "status": "ok",
    })))
}

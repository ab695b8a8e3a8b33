/**
 * Application State
 *
 * Shared state handed to every request handler. Everything here is
 * cheap to clone: the pool is internally reference-counted and the
 * rest sits behind `Arc`.
 */

use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::tokens::TokenCodec;
use crate::mailer::Mailer;
use crate::middleware::rate_limit::RateLimits;
use crate::server::config::Config;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (all durable state)
    pub pool: PgPool,
    /// Token issue/verify codec
    pub tokens: Arc<TokenCodec>,
    /// Outbound email
    pub mailer: Arc<dyn Mailer>,
    /// Best-effort per-route rate limiting (lost on restart)
    pub rate_limits: Arc<RateLimits>,
    /// Loaded configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(pool: PgPool, mailer: Arc<dyn Mailer>, config: Config) -> Self {
        Self {
            pool,
            tokens: Arc::new(TokenCodec::new(config.tokens.clone())),
            mailer,
            rate_limits: Arc::new(RateLimits::default()),
            config: Arc::new(config),
        }
    }
}

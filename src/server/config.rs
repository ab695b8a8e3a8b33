/**
 * Server Configuration
 *
 * Loads configuration from environment variables into one `Config`
 * struct at startup. Development defaults exist for everything except
 * `DATABASE_URL`, which the auth core cannot run without.
 *
 * JWT lifetimes accept the compact duration syntax `30s`, `15m`, `24h`,
 * `7d`; a bare number is taken as seconds.
 */

use thiserror::Error;

use crate::auth::tokens::TokenConfig;
use crate::mailer::SmtpConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),
}

/// Full service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Base URL used in verification/reset links
    pub frontend_url: String,
    pub tokens: TokenConfig,
    pub smtp: SmtpConfig,
}

impl Config {
    /// Load configuration from the environment
    ///
    /// # Errors
    ///
    /// Fails only when `DATABASE_URL` is unset; every other value has
    /// a development default (secrets fall back with a warning).
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingVar("DATABASE_URL"))?;

        let port = std::env::var("SERVER_PORT")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(3000);

        let frontend_url = std::env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let tokens = TokenConfig {
            issuer: "mercato-api".to_string(),
            audience: "mercato-users".to_string(),
            access_secret: secret_var("JWT_ACCESS_SECRET", "mercato-access-secret-dev"),
            refresh_secret: secret_var("JWT_REFRESH_SECRET", "mercato-refresh-secret-dev"),
            email_secret: secret_var("JWT_EMAIL_SECRET", "mercato-email-secret-dev"),
            password_reset_secret: secret_var(
                "JWT_PASSWORD_RESET_SECRET",
                "mercato-password-reset-secret-dev",
            ),
            access_ttl_secs: ttl_var("JWT_ACCESS_EXPIRES_IN", "15m"),
            refresh_ttl_secs: ttl_var("JWT_REFRESH_EXPIRES_IN", "7d"),
            email_ttl_secs: ttl_var("JWT_EMAIL_EXPIRES_IN", "24h"),
            password_reset_ttl_secs: ttl_var("JWT_PASSWORD_RESET_EXPIRES_IN", "1h"),
        };

        let smtp = SmtpConfig {
            host: std::env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string()),
            port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(587),
            username: std::env::var("SMTP_USER").ok(),
            password: std::env::var("SMTP_PASS").ok(),
            from: std::env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "\"Mercato\" <no-reply@mercato.example>".to_string()),
        };

        Ok(Self {
            database_url,
            port,
            frontend_url,
            tokens,
            smtp,
        })
    }
}

fn secret_var(name: &str, fallback: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| {
        tracing::warn!("{name} not set, using development fallback secret");
        fallback.to_string()
    })
}

fn ttl_var(name: &str, fallback: &str) -> i64 {
    let raw = std::env::var(name).unwrap_or_else(|_| fallback.to_string());
    parse_duration_secs(&raw).unwrap_or_else(|| {
        tracing::warn!("{name}={raw} is not a valid duration, using default {fallback}");
        parse_duration_secs(fallback).expect("default duration is valid")
    })
}

/// Parse `30s` / `15m` / `24h` / `7d` (or a bare number of seconds)
pub fn parse_duration_secs(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() || !value.is_ascii() {
        return None;
    }

    if let Ok(secs) = value.parse::<i64>() {
        return Some(secs);
    }

    let (number, unit) = value.split_at(value.len() - 1);
    let number: i64 = number.parse().ok()?;

    let multiplier = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86400,
        _ => return None,
    };

    Some(number * multiplier)
}

//! Authentication test helpers
//!
//! Builds handler-ready application state on top of a real pool, with a
//! recording mailer and short but realistic token lifetimes.

use std::sync::Arc;

use axum::extract::{Json, State};
use mercato::auth::handlers::types::{ApiResponse, AuthData, RegisterRequest};
use mercato::auth::handlers::register;
use mercato::auth::tokens::TokenConfig;
use mercato::auth::users::DeviceInfo;
use mercato::mailer::SmtpConfig;
use mercato::server::{AppState, Config};
use sqlx::PgPool;
use uuid::Uuid;

use super::mailers::{FailingMailer, RecordingMailer};

pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        port: 0,
        frontend_url: "http://localhost:3000".to_string(),
        tokens: TokenConfig {
            issuer: "mercato-api".to_string(),
            audience: "mercato-users".to_string(),
            access_secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            email_secret: "test-email-secret".to_string(),
            password_reset_secret: "test-reset-secret".to_string(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 7 * 24 * 3600,
            email_ttl_secs: 24 * 3600,
            password_reset_ttl_secs: 3600,
        },
        smtp: SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: None,
            password: None,
            from: "\"Mercato\" <no-reply@mercato.example>".to_string(),
        },
    }
}

/// Application state wired to a recording mailer
pub fn test_state(pool: PgPool) -> (AppState, Arc<RecordingMailer>) {
    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState::new(pool, mailer.clone(), test_config());
    (state, mailer)
}

/// Application state whose mailer fails every send
pub fn failing_mail_state(pool: PgPool) -> AppState {
    AppState::new(pool, Arc::new(FailingMailer), test_config())
}

pub fn device(ip: &str) -> DeviceInfo {
    DeviceInfo {
        user_agent: "integration-test/1.0".to_string(),
        ip: ip.to_string(),
    }
}

/// Unique name/email pair so tests never collide on the unique columns
pub fn unique_identity() -> (String, String) {
    let tag = Uuid::new_v4().simple().to_string();
    (format!("user-{}", &tag[..12]), format!("{tag}@example.com"))
}

pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Register an account through the real handler and return its payload
pub async fn register_user(state: &AppState, name: &str, email: &str, ip: &str) -> AuthData {
    let (_status, Json(response)): (_, Json<ApiResponse<AuthData>>) = register(
        State(state.clone()),
        device(ip),
        Json(RegisterRequest {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            password: Some(TEST_PASSWORD.to_string()),
        }),
    )
    .await
    .expect("registration failed");

    response.data.expect("registration returned no data")
}

pub fn auth_header(token: &str) -> String {
    format!("Bearer {token}")
}

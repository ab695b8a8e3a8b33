/**
 * Password Handlers
 *
 * PUT  /api/auth/change-password  - authenticated password change
 * POST /api/auth/forgot-password  - request a reset link by email
 * POST /api/auth/reset-password   - consume the link, set new password
 *
 * The reset token is a one-hour password-reset JWT; only its SHA-256
 * hex digest is stored, so a database leak does not yield usable reset
 * links. Both change and reset revoke every session afterwards, and
 * `password_changed_at` is stamped one second in the past so access
 * tokens minted in the same second fail the guard.
 */

use axum::{extract::State, Json};
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};

use crate::auth::handlers::register::MIN_PASSWORD_LEN;
use crate::auth::handlers::types::{
    require, ApiResponse, ChangePasswordRequest, ForgotPasswordRequest, ResetPasswordRequest,
};
use crate::auth::handlers::{hash_blocking, verify_blocking};
use crate::auth::store;
use crate::auth::tokens::TokenKind;
use crate::auth::users::DeviceInfo;
use crate::error::AuthError;
use crate::mailer::password_reset_email;
use crate::middleware::rate_limit::limit_key;
use crate::middleware::CurrentUser;
use crate::server::state::AppState;

/// Hex digest of a reset token, the only form that touches the database
pub(crate) fn sha256_hex(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

pub(crate) fn reset_url(frontend_url: &str, token: &str) -> String {
    format!("{frontend_url}/reset-password?token={token}")
}

pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse>, AuthError> {
    let current = require(
        &request.current_password,
        "Current password and new password are required",
    )?;
    let new = require(
        &request.new_password,
        "Current password and new password are required",
    )?;

    if !user.is_email_verified {
        return Err(AuthError::authorization(
            "Please verify your email before changing the password",
        ));
    }

    if new.len() < MIN_PASSWORD_LEN {
        return Err(AuthError::validation(
            "New password must be at least 6 characters",
        ));
    }

    let verified = verify_blocking(current.to_string(), user.password_hash.clone()).await?;
    if !verified {
        return Err(AuthError::validation("Current password is incorrect"));
    }

    let password_hash = hash_blocking(new.to_string()).await?;
    store::update_password(&state.pool, user.id, &password_hash).await?;
    store::remove_all_sessions(&state.pool, user.id).await?;

    tracing::info!(name = %user.name, "password changed");
    Ok(Json(ApiResponse::message(
        "Password changed successfully. Please log in again",
    )))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    device: DeviceInfo,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse>, AuthError> {
    let email = require(&request.email, "Email is required")?.trim().to_lowercase();

    state
        .rate_limits
        .forgot_password
        .check(&limit_key(&device.ip, &email))?;

    // Unknown addresses get an explicit 400 here even though login keeps
    // credentials opaque; preserved behavior.
    let user = store::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| AuthError::validation("Email does not exist in the system"))?;

    if !user.is_email_verified {
        return Err(AuthError::authorization(
            "Please verify your email before resetting the password",
        ));
    }

    let token = state
        .tokens
        .issue_password_reset(user.id, &user.email)
        .map_err(|err| AuthError::internal(format!("token issue failed: {err}")))?;

    let expires_at = Utc::now() + Duration::seconds(state.config.tokens.password_reset_ttl_secs);
    store::set_reset_token(&state.pool, user.id, &sha256_hex(&token), expires_at).await?;

    let url = reset_url(&state.config.frontend_url, &token);
    if let Err(err) = state
        .mailer
        .send(password_reset_email(&user.email, &user.name, &url))
        .await
    {
        // Without the email the stored token is unreachable; roll it
        // back so the account holds no live reset state.
        store::clear_reset_token(&state.pool, user.id).await?;
        return Err(AuthError::Mail(err));
    }

    // Only failed requests count against the window.
    state
        .rate_limits
        .forgot_password
        .forgive(&limit_key(&device.ip, &email));

    tracing::info!(name = %user.name, "password reset email sent");
    Ok(Json(ApiResponse::message(
        "A password reset link has been sent to your email",
    )))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse>, AuthError> {
    let token = require(&request.token, "Token and new password are required")?;
    let new = require(&request.new_password, "Token and new password are required")?;

    if new.len() < MIN_PASSWORD_LEN {
        return Err(AuthError::validation(
            "New password must be at least 6 characters",
        ));
    }

    let claims = state
        .tokens
        .verify(TokenKind::PasswordReset, token)
        .map_err(|_| AuthError::validation("Invalid or expired token"))?;

    let user = store::find_by_id(&state.pool, claims.id)
        .await?
        .ok_or_else(|| AuthError::validation("Invalid or expired token"))?;

    if !user.is_email_verified {
        return Err(AuthError::authorization(
            "Please verify your email before resetting the password",
        ));
    }

    // The stored digest is the single-use marker: update_password clears
    // it, so replaying the same link fails here.
    let stored_matches = user
        .password_reset_token_hash
        .as_deref()
        .is_some_and(|stored| stored == sha256_hex(token))
        && user
            .password_reset_expires
            .is_some_and(|expires| expires > Utc::now());

    if !stored_matches {
        return Err(AuthError::validation("Invalid or expired token"));
    }

    let password_hash = hash_blocking(new.to_string()).await?;
    store::update_password(&state.pool, user.id, &password_hash).await?;
    store::remove_all_sessions(&state.pool, user.id).await?;

    tracing::info!(name = %user.name, "password reset completed");
    Ok(Json(ApiResponse::message(
        "Password has been reset. Please log in with your new password",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex_is_stable() {
        let digest = sha256_hex("token");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, sha256_hex("token"));
        assert_ne!(digest, sha256_hex("other"));
    }

    #[test]
    fn test_reset_url() {
        assert_eq!(
            reset_url("https://shop.example", "t0k"),
            "https://shop.example/reset-password?token=t0k"
        );
    }
}

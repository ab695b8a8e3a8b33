/**
 * Email Verification Handlers
 *
 * POST /api/auth/verify-email        - consume a verification token
 * POST /api/auth/resend-verification - send a fresh link (authenticated)
 *
 * Verification is not idempotent on the wire: a second consume attempt
 * returns 400 "already verified" rather than a second success.
 */

use axum::{extract::State, Json};

use crate::auth::handlers::register::verification_url;
use crate::auth::handlers::types::{require, ApiResponse, VerifyEmailRequest};
use crate::auth::store;
use crate::auth::tokens::TokenKind;
use crate::auth::users::DeviceInfo;
use crate::error::AuthError;
use crate::mailer::{verification_email, welcome_email};
use crate::middleware::rate_limit::limit_key;
use crate::middleware::CurrentUser;
use crate::server::state::AppState;

pub async fn verify_email(
    State(state): State<AppState>,
    Json(request): Json<VerifyEmailRequest>,
) -> Result<Json<ApiResponse>, AuthError> {
    let token = require(&request.token, "Verification token is required")?;

    let claims = state
        .tokens
        .verify(TokenKind::EmailVerification, token)
        .map_err(|_| AuthError::validation("Invalid or expired verification token"))?;

    let user = store::find_by_id(&state.pool, claims.id)
        .await?
        .ok_or_else(|| AuthError::validation("Invalid or expired verification token"))?;

    if user.is_email_verified {
        return Err(AuthError::validation("Email has already been verified"));
    }

    store::set_email_verified(&state.pool, user.id).await?;

    // Welcome mail is a courtesy; verification already succeeded.
    if let Err(err) = state
        .mailer
        .send(welcome_email(&user.email, &user.name))
        .await
    {
        tracing::warn!("failed to send welcome email: {err}");
    }

    tracing::info!(name = %user.name, "email verified");
    Ok(Json(ApiResponse::message("Email verified successfully")))
}

pub async fn resend_verification(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    device: DeviceInfo,
) -> Result<Json<ApiResponse>, AuthError> {
    state
        .rate_limits
        .resend_verification
        .check(&limit_key(&device.ip, &user.email))?;

    if user.is_email_verified {
        return Err(AuthError::validation("Email has already been verified"));
    }

    let token = state
        .tokens
        .issue_email_verification(user.id, &user.email)
        .map_err(|err| AuthError::internal(format!("token issue failed: {err}")))?;

    let url = verification_url(&state.config.frontend_url, &token);
    state
        .mailer
        .send(verification_email(&user.email, &user.name, &url))
        .await?;

    // Only failed requests count against the window.
    state
        .rate_limits
        .resend_verification
        .forgive(&limit_key(&device.ip, &user.email));

    tracing::info!(name = %user.name, "verification email resent");
    Ok(Json(ApiResponse::message(
        "A verification link has been sent to your email",
    )))
}

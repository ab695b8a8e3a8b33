/**
 * Registration Handler
 *
 * POST /api/auth/register
 *
 * 1. Validate name (trimmed, 2-50 chars), email format, password length
 * 2. Reject name or email collisions with a field-specific 409
 * 3. Hash the password (bcrypt cost 12, off the async executor)
 * 4. Create the account
 * 5. Send the email-verification link (best-effort, never fails the
 *    registration)
 * 6. Issue an access + refresh pair and persist the refresh session
 *
 * Note: the field-specific 409 intentionally reveals which identifier
 * collided, while login keeps a single opaque 401. The inconsistency is
 * preserved behavior, not an accident.
 */

use axum::{extract::State, http::StatusCode, Json};

use crate::auth::handlers::types::{
    is_valid_email, is_valid_name, require, ApiResponse, AuthData, RegisterRequest, UserResponse,
};
use crate::auth::handlers::{hash_blocking, new_session};
use crate::auth::store;
use crate::auth::users::DeviceInfo;
use crate::error::AuthError;
use crate::mailer::verification_email;
use crate::middleware::rate_limit::limit_key;
use crate::server::state::AppState;

/// Minimum accepted password length
pub(crate) const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn verification_url(frontend_url: &str, token: &str) -> String {
    format!("{frontend_url}/verify-email?token={token}")
}

pub async fn register(
    State(state): State<AppState>,
    device: DeviceInfo,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthData>>), AuthError> {
    let name = require(&request.name, "Name, email and password are required")?
        .trim()
        .to_string();
    let email = require(&request.email, "Name, email and password are required")?
        .trim()
        .to_lowercase();
    let password = require(&request.password, "Name, email and password are required")?;

    state
        .rate_limits
        .register
        .check(&limit_key(&device.ip, &email))?;

    if !is_valid_name(&name) {
        return Err(AuthError::validation("Name must be 2-50 characters"));
    }
    if !is_valid_email(&email) {
        return Err(AuthError::validation("Email is not valid"));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AuthError::validation(
            "Password must be at least 6 characters",
        ));
    }

    // Field-specific collision checks; the unique constraints in the
    // store back these up against races.
    if store::find_by_name(&state.pool, &name).await?.is_some() {
        return Err(AuthError::duplicate("Name is already taken"));
    }
    if store::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AuthError::duplicate("Email is already registered"));
    }

    let password_hash = hash_blocking(password.to_string()).await?;
    let mut user = store::create_user(&state.pool, &name, &email, &password_hash).await?;

    tracing::info!(name = %user.name, "user registered");

    // Only failed registrations count against the window.
    state
        .rate_limits
        .register
        .forgive(&limit_key(&device.ip, &email));

    // Verification mail is best-effort: a mailer outage must not undo
    // the registration.
    match state.tokens.issue_email_verification(user.id, &user.email) {
        Ok(email_token) => {
            let url = verification_url(&state.config.frontend_url, &email_token);
            if let Err(err) = state
                .mailer
                .send(verification_email(&user.email, &user.name, &url))
                .await
            {
                tracing::warn!("failed to send verification email: {err}");
            }
        }
        Err(err) => tracing::warn!("failed to issue verification token: {err}"),
    }

    let pair = state
        .tokens
        .issue_pair(user.id, &user.email, user.role)
        .map_err(|err| AuthError::internal(format!("token issue failed: {err}")))?;

    user.add_session(new_session(&state.tokens, &pair, device));
    store::update_sessions(&state.pool, &mut user).await?;

    let response = ApiResponse::with_data(
        "Registration successful. Please check your email to verify your account",
        AuthData {
            user: UserResponse::from(&user),
            tokens: pair,
        },
    );

    Ok((StatusCode::CREATED, Json(response)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_url() {
        assert_eq!(
            verification_url("https://shop.example", "abc.def"),
            "https://shop.example/verify-email?token=abc.def"
        );
    }
}

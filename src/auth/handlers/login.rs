/**
 * Login Handler
 *
 * POST /api/auth/login
 *
 * Authenticates by account name + password. Wrong name and wrong
 * password produce the same opaque 401 so the response does not reveal
 * which part failed. Five consecutive failures lock the account for
 * five minutes (423); the lockout check runs before password
 * verification so a locked account never burns bcrypt time.
 */

use axum::{extract::State, Json};

use crate::auth::handlers::types::{require, ApiResponse, AuthData, LoginRequest, UserResponse};
use crate::auth::handlers::{new_session, verify_blocking};
use crate::auth::store;
use crate::auth::users::DeviceInfo;
use crate::error::AuthError;
use crate::middleware::rate_limit::limit_key;
use crate::server::state::AppState;

const BAD_CREDENTIALS: &str = "Name or password is incorrect";

pub async fn login(
    State(state): State<AppState>,
    device: DeviceInfo,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthData>>, AuthError> {
    let name = require(&request.name, "Name and password are required")?.trim();
    let password = require(&request.password, "Name and password are required")?;

    state
        .rate_limits
        .login
        .check(&limit_key(&device.ip, name))?;

    let mut user = store::find_by_name(&state.pool, name)
        .await?
        .ok_or_else(|| AuthError::authentication(BAD_CREDENTIALS))?;

    let now = chrono::Utc::now();
    if user.is_locked(now) {
        return Err(AuthError::locked(
            "Account is locked due to too many failed login attempts. Please try again later",
        ));
    }

    if !user.is_active {
        return Err(AuthError::authorization("Account has been deactivated"));
    }

    let verified = verify_blocking(password.to_string(), user.password_hash.clone()).await?;
    if !verified {
        user.register_failed_login(now);
        store::update_lockout(&state.pool, &user).await?;
        tracing::warn!(name = %user.name, attempts = user.login_attempts, "failed login");
        return Err(AuthError::authentication(BAD_CREDENTIALS));
    }

    // Only failed logins count against the window.
    state
        .rate_limits
        .login
        .forgive(&limit_key(&device.ip, name));

    if user.login_attempts > 0 || user.lock_until.is_some() {
        user.clear_login_attempts();
        store::update_lockout(&state.pool, &user).await?;
    }

    store::set_last_login(&state.pool, user.id, &device.ip).await?;
    user.last_login = Some(now);
    user.last_login_ip = Some(device.ip.clone());

    let pair = state
        .tokens
        .issue_pair(user.id, &user.email, user.role)
        .map_err(|err| AuthError::internal(format!("token issue failed: {err}")))?;

    user.add_session(new_session(&state.tokens, &pair, device));
    store::update_sessions(&state.pool, &mut user).await?;

    tracing::info!(name = %user.name, "user logged in");

    Ok(Json(ApiResponse::with_data(
        "Login successful",
        AuthData {
            user: UserResponse::from(&user),
            tokens: pair,
        },
    )))
}

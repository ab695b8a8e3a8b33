/**
 * Session Handlers
 *
 * POST /api/auth/refresh-token - rotate a refresh token (single use)
 * POST /api/auth/logout        - revoke one session
 * POST /api/auth/logout-all    - revoke every session
 *
 * Refresh is strict rotation: the presented token is removed from the
 * session list and a new pair is issued in its place, so a replayed
 * refresh token fails the lookup and gets a 401.
 */

use axum::{extract::State, Json};

use crate::auth::handlers::new_session;
use crate::auth::handlers::types::{
    require, ApiResponse, LogoutRequest, RefreshRequest, TokensData,
};
use crate::auth::store;
use crate::auth::tokens::TokenKind;
use crate::auth::users::DeviceInfo;
use crate::error::AuthError;
use crate::middleware::CurrentUser;
use crate::server::state::AppState;

pub async fn refresh_token(
    State(state): State<AppState>,
    device: DeviceInfo,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<TokensData>>, AuthError> {
    let presented = require(&request.refresh_token, "Refresh token is required")?;

    // Signature and expiry first; a forged token never reaches the store.
    state
        .tokens
        .verify(TokenKind::Refresh, presented)
        .map_err(|_| AuthError::authentication("Invalid refresh token"))?;

    let mut user = store::find_by_refresh_token(&state.pool, presented)
        .await?
        .ok_or_else(|| AuthError::authentication("Invalid refresh token"))?;

    if !user.is_active {
        return Err(AuthError::authentication("Account has been deactivated"));
    }

    user.remove_session(presented);

    let pair = state
        .tokens
        .issue_pair(user.id, &user.email, user.role)
        .map_err(|err| AuthError::internal(format!("token issue failed: {err}")))?;

    user.add_session(new_session(&state.tokens, &pair, device));
    store::update_sessions(&state.pool, &mut user).await?;

    tracing::debug!(name = %user.name, "refresh token rotated");

    Ok(Json(ApiResponse::with_data(
        "Token refreshed",
        TokensData { tokens: pair },
    )))
}

/// Revoke the presented session. Succeeds even when no token is given
/// or the token is not in the list; logout is idempotent.
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(mut user): CurrentUser,
    body: Option<Json<LogoutRequest>>,
) -> Result<Json<ApiResponse>, AuthError> {
    let presented = body.and_then(|Json(request)| request.refresh_token);

    if let Some(token) = presented {
        if user.remove_session(&token) {
            store::update_sessions(&state.pool, &mut user).await?;
        }
    }

    tracing::info!(name = %user.name, "user logged out");
    Ok(Json(ApiResponse::message("Logout successful")))
}

/// Revoke every session for the account
pub async fn logout_all(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse>, AuthError> {
    store::remove_all_sessions(&state.pool, user.id).await?;
    tracing::info!(name = %user.name, "all sessions revoked");
    Ok(Json(ApiResponse::message("Logged out of all devices")))
}

/**
 * Account Handlers
 *
 * GET    /api/auth/me             - current account snapshot
 * GET    /api/auth/profile        - alias of /me
 * PUT    /api/auth/profile        - update name/email
 * DELETE /api/auth/delete-account - permanent, password-confirmed delete
 *
 * Changing the email address drops the verified flag; the new address
 * has to be verified again. Account deletion requires the literal
 * confirmation phrase and the current password; admins cannot delete
 * themselves through this endpoint.
 */

use axum::{extract::State, Json};

use crate::auth::handlers::register::verification_url;
use crate::auth::handlers::types::{
    is_valid_email, is_valid_name, ApiResponse, DeleteAccountRequest, UpdateProfileRequest,
    UserData, UserResponse,
};
use crate::auth::handlers::verify_blocking;
use crate::auth::store;
use crate::auth::users::Role;
use crate::error::AuthError;
use crate::mailer::verification_email;
use crate::middleware::CurrentUser;
use crate::server::state::AppState;

pub async fn get_me(
    CurrentUser(user): CurrentUser,
) -> Json<ApiResponse<UserData>> {
    Json(ApiResponse::with_data(
        "Current user",
        UserData {
            user: UserResponse::from(&user),
        },
    ))
}

/// Alias kept for clients that fetch `/profile` instead of `/me`
pub async fn get_profile(user: CurrentUser) -> Json<ApiResponse<UserData>> {
    get_me(user).await
}

pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserData>>, AuthError> {
    if request.name.is_none() && request.email.is_none() {
        return Err(AuthError::validation("Nothing to update"));
    }

    let name = match &request.name {
        Some(name) => {
            let name = name.trim();
            if !is_valid_name(name) {
                return Err(AuthError::validation("Name must be 2-50 characters"));
            }
            name.to_string()
        }
        None => user.name.clone(),
    };

    let email = match &request.email {
        Some(email) => {
            let email = email.trim().to_lowercase();
            if !is_valid_email(&email) {
                return Err(AuthError::validation("Email is not valid"));
            }
            email
        }
        None => user.email.clone(),
    };

    let email_changed = email != user.email;

    let updated = store::update_profile(&state.pool, user.id, &name, &email).await?;

    // A new address is unverified until it proves it can receive mail.
    if email_changed {
        store::set_email_unverified(&state.pool, user.id).await?;

        match state.tokens.issue_email_verification(user.id, &email) {
            Ok(token) => {
                let url = verification_url(&state.config.frontend_url, &token);
                if let Err(err) = state
                    .mailer
                    .send(verification_email(&email, &name, &url))
                    .await
                {
                    tracing::warn!("failed to send verification email: {err}");
                }
            }
            Err(err) => tracing::warn!("failed to issue verification token: {err}"),
        }
    }

    let mut response = UserResponse::from(&updated);
    if email_changed {
        response.is_email_verified = false;
    }

    tracing::info!(name = %name, "profile updated");
    Ok(Json(ApiResponse::with_data(
        "Profile updated successfully",
        UserData { user: response },
    )))
}

pub async fn delete_account(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<DeleteAccountRequest>,
) -> Result<Json<ApiResponse>, AuthError> {
    if request.confirm_delete.as_deref() != Some("DELETE_MY_ACCOUNT") {
        return Err(AuthError::validation(
            "Please confirm deletion by sending confirmDelete: DELETE_MY_ACCOUNT",
        ));
    }

    let password = request
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AuthError::validation("Password is required"))?;

    if user.role == Role::Admin {
        return Err(AuthError::authorization(
            "Admin accounts cannot be deleted through this endpoint",
        ));
    }

    let verified = verify_blocking(password.to_string(), user.password_hash.clone()).await?;
    if !verified {
        return Err(AuthError::validation("Password is incorrect"));
    }

    store::delete_user(&state.pool, user.id).await?;

    tracing::info!(name = %user.name, "account deleted");
    Ok(Json(ApiResponse::message("Account deleted successfully")))
}

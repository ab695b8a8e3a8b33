/**
 * Handler Types
 *
 * Request and response DTOs shared across the authentication handlers,
 * plus small validation helpers. Wire names are camelCase to match the
 * public API contract; responses always carry a `success` flag.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::tokens::TokenPair;
use crate::auth::users::{Role, User};
use crate::error::AuthError;

/// Uniform response envelope
///
/// ```json
/// { "success": true, "message": "...", "data": { ... } }
/// ```
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize = ()> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl ApiResponse<()> {
    /// Success response with a message and no data
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// Success response with a message and payload
    pub fn with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

/// Registration request
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Login request; the login identifier is the account name, not email
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Refresh request; the refresh token travels in the body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Logout request; the whole body is optional
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAccountRequest {
    pub password: Option<String>,
    pub confirm_delete: Option<String>,
}

/// Admin listing query parameters
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub is_email_verified: Option<bool>,
}

/// Account as returned to clients; credentials and lockout/reset
/// state never leave the server
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub is_email_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            is_active: user.is_active,
            is_email_verified: user.is_email_verified,
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}

/// Account + token pair, returned by register and login
#[derive(Debug, Serialize)]
pub struct AuthData {
    pub user: UserResponse,
    pub tokens: TokenPair,
}

/// Token pair alone, returned by refresh
#[derive(Debug, Serialize)]
pub struct TokensData {
    pub tokens: TokenPair,
}

/// Single account payload
#[derive(Debug, Serialize)]
pub struct UserData {
    pub user: UserResponse,
}

/// Admin listing payload
#[derive(Debug, Serialize)]
pub struct UserListData {
    pub users: Vec<UserResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_users: i64,
    pub limit: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

/// Require a non-blank field, with a field-specific message
pub(crate) fn require<'a>(value: &'a Option<String>, message: &str) -> Result<&'a str, AuthError> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AuthError::validation(message)),
    }
}

/// Minimal structural email check: `local@domain` with a dotted domain
pub(crate) fn is_valid_email(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Names are trimmed, 2-50 characters
pub(crate) fn is_valid_name(name: &str) -> bool {
    let len = name.chars().count();
    (2..=50).contains(&len)
}

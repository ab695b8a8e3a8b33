/**
 * Access Guard
 *
 * Middleware protecting authenticated routes. For each request it:
 *
 * 1. Extracts the token from the `Authorization: Bearer <token>` header
 * 2. Verifies it as an access token
 * 3. Loads the account from the store
 * 4. Rejects missing (401), deactivated (401), locked (423), and
 *    password-changed-after-issue (401) accounts
 * 5. Attaches the loaded account to request extensions as `CurrentUser`
 *
 * The `optional_auth` variant swallows every failure and continues
 * anonymously, for routes that personalize but do not require login.
 */

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{
        header::{AUTHORIZATION, USER_AGENT},
        request::Parts,
        HeaderMap,
    },
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use crate::auth::store;
use crate::auth::tokens::{TokenCodec, TokenError, TokenKind};
use crate::auth::users::{DeviceInfo, User};
use crate::error::AuthError;
use crate::server::state::AppState;

/// The authenticated account, attached to request extensions
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Verify the bearer token and load the account it belongs to
async fn resolve_user(state: &AppState, headers: &HeaderMap) -> Result<User, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AuthError::authentication("Access token was not provided"))?;

    let token = TokenCodec::extract_bearer(header)
        .ok_or_else(|| AuthError::authentication("Access token was not provided"))?;

    let claims = state
        .tokens
        .verify(TokenKind::Access, token)
        .map_err(|err| match err {
            TokenError::Expired => AuthError::authentication("Access token expired"),
            TokenError::Invalid => AuthError::authentication("Invalid access token"),
        })?;

    let user = store::find_by_id(&state.pool, claims.id)
        .await?
        .ok_or_else(|| AuthError::authentication("User no longer exists"))?;

    if !user.is_active {
        return Err(AuthError::authentication("Account has been deactivated"));
    }

    if user.is_locked(Utc::now()) {
        return Err(AuthError::locked(
            "Account is locked due to too many failed login attempts",
        ));
    }

    // A password change invalidates every access token issued before it,
    // even inside the token's normal lifetime.
    if user.changed_password_after(claims.iat) {
        return Err(AuthError::authentication(
            "Password was changed. Please log in again",
        ));
    }

    Ok(user)
}

/// Require a valid access token; rejects the request otherwise
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = resolve_user(&state, request.headers()).await?;
    tracing::debug!(user = %user.name, "request authenticated");
    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

/// Attach the account when a valid token is present, else continue anonymously
pub async fn optional_auth(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    if let Ok(user) = resolve_user(&state, request.headers()).await {
        request.extensions_mut().insert(CurrentUser(user));
    }
    next.run(request).await
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AuthError::authentication("Please log in to access this resource"))
    }
}

impl<S> FromRequestParts<S> for DeviceInfo
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("Unknown")
            .to_string();

        // First hop of X-Forwarded-For, then X-Real-IP; the service is
        // expected to sit behind a reverse proxy.
        let ip = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(|value| value.trim().to_string())
            .or_else(|| {
                parts
                    .headers
                    .get("x-real-ip")
                    .and_then(|value| value.to_str().ok())
                    .map(|value| value.to_string())
            })
            .unwrap_or_else(|| "Unknown".to_string());

        Ok(DeviceInfo { user_agent, ip })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::tokens::TokenConfig;
    use crate::auth::users::test_support::test_user;
    use crate::auth::users::Role;
    use crate::mailer::{SmtpConfig, SmtpMailer};
    use crate::server::config::Config;
    use assert_matches::assert_matches;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Extension, Router};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn parts_with(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    fn guard_config() -> Config {
        Config {
            database_url: String::new(),
            port: 0,
            frontend_url: "http://localhost:3000".to_string(),
            tokens: TokenConfig {
                issuer: "mercato-api".to_string(),
                audience: "mercato-users".to_string(),
                access_secret: "guard-access-secret".to_string(),
                refresh_secret: "guard-refresh-secret".to_string(),
                email_secret: "guard-email-secret".to_string(),
                password_reset_secret: "guard-reset-secret".to_string(),
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

    /// State over a lazy pool; the guard fails token checks before any
    /// query runs, so these tests never need a live database.
    fn guard_state(config: Config) -> AppState {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost:5432/unused")
            .unwrap();
        let mailer = Arc::new(SmtpMailer::new(&config.smtp).unwrap());
        AppState::new(pool, mailer, config)
    }

    async fn whoami(user: Option<Extension<CurrentUser>>) -> &'static str {
        if user.is_some() {
            "authenticated"
        } else {
            "anonymous"
        }
    }

    fn optional_router(state: AppState) -> Router {
        Router::new()
            .route("/", get(whoami))
            .layer(axum::middleware::from_fn_with_state(state, optional_auth))
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_optional_auth_without_token_is_anonymous() {
        let app = optional_router(guard_state(guard_config()));
        let response = app
            .oneshot(HttpRequest::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "anonymous");
    }

    #[tokio::test]
    async fn test_optional_auth_swallows_garbage_token() {
        let app = optional_router(guard_state(guard_config()));
        let response = app
            .oneshot(
                HttpRequest::get("/")
                    .header("authorization", "Bearer not.a.token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "anonymous");
    }

    #[tokio::test]
    async fn test_optional_auth_swallows_expired_token() {
        let mut config = guard_config();
        config.tokens.access_ttl_secs = -10;
        let state = guard_state(config);
        let token = state
            .tokens
            .issue_access(Uuid::new_v4(), "a@example.com", Role::User)
            .unwrap();

        let response = optional_router(state)
            .oneshot(
                HttpRequest::get("/")
                    .header("authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "anonymous");
    }

    #[tokio::test]
    async fn test_authenticate_without_token_rejects() {
        let state = guard_state(guard_config());
        let app = Router::new()
            .route("/", get(whoami))
            .layer(axum::middleware::from_fn_with_state(state, authenticate));

        let response = app
            .oneshot(HttpRequest::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_current_user_extractor_present() {
        let user = test_user();
        let mut request = HttpRequest::builder().uri("/").body(()).unwrap();
        request.extensions_mut().insert(CurrentUser(user.clone()));
        let (mut parts, _) = request.into_parts();

        let extracted = CurrentUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(extracted.0.id, user.id);
    }

    #[tokio::test]
    async fn test_current_user_extractor_missing() {
        let mut parts = parts_with(HttpRequest::builder().uri("/"));
        let result = CurrentUser::from_request_parts(&mut parts, &()).await;
        assert_matches!(result, Err(AuthError::Authentication { .. }));
    }

    #[tokio::test]
    async fn test_device_info_from_headers() {
        let mut parts = parts_with(
            HttpRequest::builder()
                .uri("/")
                .header("user-agent", "test-agent/1.0")
                .header("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
        );

        let info = DeviceInfo::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(info.user_agent, "test-agent/1.0");
        assert_eq!(info.ip, "203.0.113.7");
    }

    #[tokio::test]
    async fn test_device_info_defaults() {
        let mut parts = parts_with(HttpRequest::builder().uri("/"));
        let info = DeviceInfo::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(info.user_agent, "Unknown");
        assert_eq!(info.ip, "Unknown");
    }

    #[tokio::test]
    async fn test_device_info_real_ip_fallback() {
        let mut parts = parts_with(
            HttpRequest::builder()
                .uri("/")
                .header("x-real-ip", "198.51.100.4"),
        );
        let info = DeviceInfo::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(info.ip, "198.51.100.4");
    }
}

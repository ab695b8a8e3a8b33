/**
 * User Store
 *
 * Database operations for user accounts. All durable state lives here;
 * the invariant logic itself sits on the `User` model.
 *
 * Session-list writes are read-modify-write over a single row. Two
 * simultaneous refresh/logout requests for the same account can race on
 * that write; the store relies on per-row update atomicity and does not
 * add an optimistic-concurrency check.
 */

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::users::{Role, User};
use crate::error::AuthError;

/// Create a new user with default role and flags
///
/// `name` must already be trimmed and `email` lowercased by the caller.
/// A unique-constraint collision maps to a field-specific
/// `AuthError::Duplicate`.
pub async fn create_user(
    pool: &PgPool,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, AuthError> {
    let id = Uuid::new_v4();

    let result = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, name, email, password_hash)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await;

    result.map_err(|err| match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            match db.constraint() {
                Some("users_name_key") => AuthError::duplicate("Name is already taken"),
                Some("users_email_key") => AuthError::duplicate("Email is already registered"),
                _ => AuthError::Database(err),
            }
        }
        _ => AuthError::Database(err),
    })
}

/// Look up a user by ID
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, AuthError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Look up a user by exact name
pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<User>, AuthError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Look up a user by email (caller lowercases)
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AuthError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Find the account holding a live session for this refresh token
///
/// Only sessions whose `expires_at` lies in the future match; an
/// expired session is as good as removed.
pub async fn find_by_refresh_token(pool: &PgPool, token: &str) -> Result<Option<User>, AuthError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT u.* FROM users u
        WHERE EXISTS (
            SELECT 1 FROM jsonb_array_elements(u.refresh_tokens) AS session
            WHERE session->>'token' = $1
              AND (session->>'expires_at')::timestamptz > NOW()
        )
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Persist the session list, pruning expired sessions first
///
/// Pruning on every save is the lazy garbage collection for the
/// session list; there is no background sweep.
pub async fn update_sessions(pool: &PgPool, user: &mut User) -> Result<(), AuthError> {
    user.prune_expired_sessions(Utc::now());

    sqlx::query("UPDATE users SET refresh_tokens = $1, updated_at = NOW() WHERE id = $2")
        .bind(Json(&user.refresh_tokens.0))
        .bind(user.id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Drop every session for an account in a single statement
pub async fn remove_all_sessions(pool: &PgPool, user_id: Uuid) -> Result<(), AuthError> {
    sqlx::query("UPDATE users SET refresh_tokens = '[]'::jsonb, updated_at = NOW() WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Persist the lockout counter and lock timestamp
pub async fn update_lockout(pool: &PgPool, user: &User) -> Result<(), AuthError> {
    sqlx::query(
        "UPDATE users SET login_attempts = $1, lock_until = $2, updated_at = NOW() WHERE id = $3",
    )
    .bind(user.login_attempts)
    .bind(user.lock_until)
    .bind(user.id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Stamp last-login bookkeeping after a successful login
pub async fn set_last_login(pool: &PgPool, user_id: Uuid, ip: &str) -> Result<(), AuthError> {
    sqlx::query(
        "UPDATE users SET last_login = NOW(), last_login_ip = $1, updated_at = NOW() WHERE id = $2",
    )
    .bind(ip)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Replace the stored password hash
///
/// Stamps `password_changed_at` one second in the past so access tokens
/// minted in the same second still fail the guard, and clears any
/// pending reset state. Callers hash the plaintext before getting here,
/// so a digest is never hashed twice.
pub async fn update_password(
    pool: &PgPool,
    user_id: Uuid,
    password_hash: &str,
) -> Result<(), AuthError> {
    sqlx::query(
        r#"
        UPDATE users SET
            password_hash = $1,
            password_changed_at = NOW() - INTERVAL '1 second',
            password_reset_token_hash = NULL,
            password_reset_expires = NULL,
            updated_at = NOW()
        WHERE id = $2
        "#,
    )
    .bind(password_hash)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Drop the verified flag after the email address changes
pub async fn set_email_unverified(pool: &PgPool, user_id: Uuid) -> Result<(), AuthError> {
    sqlx::query("UPDATE users SET is_email_verified = FALSE, updated_at = NOW() WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Mark the account's email address as verified
pub async fn set_email_verified(pool: &PgPool, user_id: Uuid) -> Result<(), AuthError> {
    sqlx::query("UPDATE users SET is_email_verified = TRUE, updated_at = NOW() WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Store the SHA-256 hash of an outstanding password-reset token
pub async fn set_reset_token(
    pool: &PgPool,
    user_id: Uuid,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), AuthError> {
    sqlx::query(
        r#"
        UPDATE users SET
            password_reset_token_hash = $1,
            password_reset_expires = $2,
            updated_at = NOW()
        WHERE id = $3
        "#,
    )
    .bind(token_hash)
    .bind(expires_at)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Clear any stored password-reset state (consumption or rollback)
pub async fn clear_reset_token(pool: &PgPool, user_id: Uuid) -> Result<(), AuthError> {
    sqlx::query(
        r#"
        UPDATE users SET
            password_reset_token_hash = NULL,
            password_reset_expires = NULL,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Update the unique profile fields
///
/// Caller normalizes (trimmed name, lowercase email) and has already
/// checked for collisions; a constraint violation still maps to a
/// duplicate error in case of a race.
pub async fn update_profile(
    pool: &PgPool,
    user_id: Uuid,
    name: &str,
    email: &str,
) -> Result<User, AuthError> {
    let result = sqlx::query_as::<_, User>(
        "UPDATE users SET name = $1, email = $2, updated_at = NOW() WHERE id = $3 RETURNING *",
    )
    .bind(name)
    .bind(email)
    .bind(user_id)
    .fetch_one(pool)
    .await;

    result.map_err(|err| match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => match db.constraint() {
            Some("users_name_key") => AuthError::validation("Name is already taken"),
            Some("users_email_key") => {
                AuthError::validation("Email is already used by another account")
            }
            _ => AuthError::Database(err),
        },
        _ => AuthError::Database(err),
    })
}

/// Delete an account; the embedded session list goes with the row
pub async fn delete_user(pool: &PgPool, user_id: Uuid) -> Result<(), AuthError> {
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Admin listing filters
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Substring match over name or email
    pub search: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub is_email_verified: Option<bool>,
}

/// Page through users, newest first
pub async fn list_users(
    pool: &PgPool,
    filter: &UserFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<User>, AuthError> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT * FROM users
        WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%' OR email ILIKE '%' || $1 || '%')
          AND ($2::user_role IS NULL OR role = $2)
          AND ($3::boolean IS NULL OR is_active = $3)
          AND ($4::boolean IS NULL OR is_email_verified = $4)
        ORDER BY created_at DESC
        LIMIT $5 OFFSET $6
        "#,
    )
    .bind(&filter.search)
    .bind(filter.role)
    .bind(filter.is_active)
    .bind(filter.is_email_verified)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(users)
}

/// Total row count under the same filters, for pagination
pub async fn count_users(pool: &PgPool, filter: &UserFilter) -> Result<i64, AuthError> {
    let count: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM users
        WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%' OR email ILIKE '%' || $1 || '%')
          AND ($2::user_role IS NULL OR role = $2)
          AND ($3::boolean IS NULL OR is_active = $3)
          AND ($4::boolean IS NULL OR is_email_verified = $4)
        "#,
    )
    .bind(&filter.search)
    .bind(filter.role)
    .bind(filter.is_active)
    .bind(filter.is_email_verified)
    .fetch_one(pool)
    .await?;
    Ok(count.0)
}

/**
 * User Model
 *
 * The account entity and its pure invariant logic: lockout counters,
 * password-change stamps, and the embedded refresh-session list.
 *
 * Everything here mutates in-memory state only; persistence lives in
 * `auth::store`. Keeping the invariants on the model makes them
 * testable without a database.
 */

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

use crate::error::AuthError;

/// Maximum live refresh sessions per account; oldest evicted first
pub const MAX_SESSIONS: usize = 5;

/// Failed logins before the account locks
pub const MAX_LOGIN_ATTEMPTS: i32 = 5;

/// How long a lockout lasts
pub const LOCK_DURATION_SECS: i64 = 5 * 60;

/// Account role, closed set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Moderator,
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

/// Device metadata recorded with each refresh session, informational only
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub user_agent: String,
    pub ip: String,
}

/// One live refresh session, embedded in the account's session list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// The signed refresh token itself (stored as issued, not hashed)
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub device_info: DeviceInfo,
}

impl SessionRecord {
    pub fn new(token: String, expires_at: DateTime<Utc>, device_info: DeviceInfo) -> Self {
        Self {
            token,
            created_at: Utc::now(),
            expires_at,
            device_info,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// User account row
///
/// `password_hash` and the lockout/reset columns never appear in API
/// responses; handlers serialize `UserResponse` instead.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    /// Unique login identifier, trimmed, 2-50 characters
    pub name: String,
    /// Unique, lowercase-normalized
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub is_email_verified: bool,
    pub login_attempts: i32,
    pub lock_until: Option<DateTime<Utc>>,
    pub password_changed_at: Option<DateTime<Utc>>,
    pub password_reset_token_hash: Option<String>,
    pub password_reset_expires: Option<DateTime<Utc>>,
    /// Embedded session list, capped at `MAX_SESSIONS`
    pub refresh_tokens: Json<Vec<SessionRecord>>,
    pub last_login: Option<DateTime<Utc>>,
    pub last_login_ip: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Locked iff a lock timestamp exists and lies in the future
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        matches!(self.lock_until, Some(until) if until > now)
    }

    /// Whether the password changed after a token was issued
    ///
    /// `iat` is the token's issued-at Unix timestamp. Comparison is at
    /// second granularity, matching the JWT claim resolution.
    pub fn changed_password_after(&self, iat: i64) -> bool {
        match self.password_changed_at {
            Some(changed_at) => iat < changed_at.timestamp(),
            None => false,
        }
    }

    /// Record a failed login attempt
    ///
    /// An expired lock restarts the counter at 1 and clears the lock.
    /// Otherwise the counter increments, and reaching
    /// `MAX_LOGIN_ATTEMPTS` while not already locked sets a 5 minute
    /// lock.
    pub fn register_failed_login(&mut self, now: DateTime<Utc>) {
        if let Some(until) = self.lock_until {
            if until <= now {
                self.lock_until = None;
                self.login_attempts = 1;
                return;
            }
        }

        let was_locked = self.is_locked(now);
        self.login_attempts += 1;

        if self.login_attempts >= MAX_LOGIN_ATTEMPTS && !was_locked {
            self.lock_until = Some(now + Duration::seconds(LOCK_DURATION_SECS));
        }
    }

    /// Clear the failed-login counter and any lock
    pub fn clear_login_attempts(&mut self) {
        self.login_attempts = 0;
        self.lock_until = None;
    }

    /// Drop sessions whose expiry has passed (lazy garbage collection)
    pub fn prune_expired_sessions(&mut self, now: DateTime<Utc>) {
        self.refresh_tokens.retain(|session| !session.is_expired(now));
    }

    /// Append a session, pruning expired entries and evicting the
    /// oldest live session once the list exceeds `MAX_SESSIONS`
    /// (FIFO by insertion order, not by expiry).
    pub fn add_session(&mut self, session: SessionRecord) {
        self.prune_expired_sessions(Utc::now());
        self.refresh_tokens.push(session);

        if self.refresh_tokens.len() > MAX_SESSIONS {
            let excess = self.refresh_tokens.len() - MAX_SESSIONS;
            self.refresh_tokens.drain(..excess);
        }
    }

    /// Remove the session holding exactly this refresh token
    ///
    /// Returns whether a session was removed.
    pub fn remove_session(&mut self, token: &str) -> bool {
        let before = self.refresh_tokens.len();
        self.refresh_tokens.retain(|session| session.token != token);
        self.refresh_tokens.len() < before
    }

    /// Drop every session (logout-all, password change, password reset)
    pub fn clear_sessions(&mut self) {
        self.refresh_tokens.clear();
    }
}

/// Check that an account holds one of the allowed roles
///
/// Capability check used by admin handlers; role comparisons go through
/// this closed enum rather than string equality.
pub fn authorize(user: &User, allowed: &[Role]) -> Result<(), AuthError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(AuthError::authorization(
            "You do not have permission to access this resource",
        ))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// In-memory user for invariant tests; no database involved.
    pub fn test_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$2b$12$invalidinvalidinvalidinvalidinvalidinvalid".to_string(),
            role: Role::User,
            is_active: true,
            is_email_verified: false,
            login_attempts: 0,
            lock_until: None,
            password_changed_at: None,
            password_reset_token_hash: None,
            password_reset_expires: None,
            refresh_tokens: Json(Vec::new()),
            last_login: None,
            last_login_ip: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn session(token: &str, expires_at: DateTime<Utc>) -> SessionRecord {
        SessionRecord::new(token.to_string(), expires_at, DeviceInfo::default())
    }
}

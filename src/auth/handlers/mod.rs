//! Authentication Handlers
//!
//! HTTP handlers for every authentication endpoint, organized into
//! focused submodules.
//!
//! # Module Structure
//!
//! ```text
//! handlers/
//! ├── mod.rs          - Exports and shared helpers
//! ├── types.rs        - Request/response DTOs and validation helpers
//! ├── register.rs     - POST /api/auth/register
//! ├── login.rs        - POST /api/auth/login
//! ├── sessions.rs     - refresh-token / logout / logout-all
//! ├── password.rs     - change / forgot / reset password
//! ├── verification.rs - verify-email / resend-verification
//! ├── account.rs      - me / profile / delete-account
//! └── admin.rs        - admin user listing and deletion
//! ```

use chrono::Utc;

use crate::auth::tokens::{TokenCodec, TokenPair};
use crate::auth::users::{DeviceInfo, SessionRecord};
use crate::error::AuthError;

/// Request/response types
pub mod types;

/// Registration handler
pub mod register;

/// Login handler
pub mod login;

/// Refresh / logout handlers
pub mod sessions;

/// Password change / forgot / reset handlers
pub mod password;

/// Email verification handlers
pub mod verification;

/// Profile and account handlers
pub mod account;

/// Admin handlers
pub mod admin;

// Re-export handlers for route wiring
pub use account::{delete_account, get_me, get_profile, update_profile};
pub use admin::{admin_delete_user, list_users};
pub use login::login;
pub use password::{change_password, forgot_password, reset_password};
pub use register::register;
pub use sessions::{logout, logout_all, refresh_token};
pub use verification::{resend_verification, verify_email};

/// Hash a password on the blocking pool; bcrypt at cost 12 is too slow
/// for the async executor.
pub(crate) async fn hash_blocking(plaintext: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || crate::auth::password::hash_password(&plaintext))
        .await
        .map_err(|err| AuthError::internal(format!("hashing task failed: {err}")))?
        .map_err(|err| AuthError::internal(format!("password hashing failed: {err}")))
}

/// Verify a password on the blocking pool
pub(crate) async fn verify_blocking(plaintext: String, digest: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || crate::auth::password::verify_password(&plaintext, &digest))
        .await
        .map_err(|err| AuthError::internal(format!("verification task failed: {err}")))
}

/// Build the session record for a freshly issued token pair
pub(crate) fn new_session(codec: &TokenCodec, pair: &TokenPair, device: DeviceInfo) -> SessionRecord {
    SessionRecord::new(
        pair.refresh_token.clone(),
        Utc::now() + codec.refresh_ttl(),
        device,
    )
}

//! Authentication Module
//!
//! Credential hashing, JWT issuance and verification, the user model
//! with its embedded session list, the database store, and the HTTP
//! handlers built on top of them.
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs      - Module exports
//! ├── password.rs - bcrypt hashing and verification
//! ├── tokens.rs   - JWT codec for the four token kinds
//! ├── users.rs    - User model and invariant logic
//! ├── store.rs    - sqlx queries over the users table
//! └── handlers/   - HTTP endpoint handlers
//! ```

/// bcrypt credential hashing
pub mod password;

/// JWT issuance and verification
pub mod tokens;

/// User model, sessions, lockout
pub mod users;

/// Database operations
pub mod store;

/// HTTP handlers
pub mod handlers;

pub use tokens::{TokenCodec, TokenConfig, TokenKind, TokenPair};
pub use users::{Role, User};

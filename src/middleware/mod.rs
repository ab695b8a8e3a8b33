//! Middleware Module
//!
//! Request-level middleware for the auth service.
//!
//! # Module Structure
//!
//! ```text
//! middleware/
//! ├── mod.rs        - Module exports
//! ├── auth.rs       - Access guard (authenticate / optional_auth)
//! └── rate_limit.rs - Best-effort per-route rate limiting
//! ```

/// Access guard middleware and extractors
pub mod auth;

/// In-memory rate limiting
pub mod rate_limit;

// Re-export commonly used types
pub use auth::{authenticate, optional_auth, CurrentUser};
pub use rate_limit::{limit_key, RateLimiter, RateLimits};

//! Error Module
//!
//! Defines the error taxonomy for the auth service and its conversion
//! into HTTP responses.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports
//! ├── types.rs      - AuthError definition and status code mapping
//! └── conversion.rs - IntoResponse implementation
//! ```
//!
//! All handlers return `Result<_, AuthError>`; the conversion layer
//! renders errors as `{"success": false, "message": ...}` with the
//! status code from `AuthError::status_code()`.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

// Re-export commonly used types
pub use types::AuthError;

//! Mercato Auth Service
//!
//! The authentication and account subsystem for the Mercato storefront
//! API: registration, login with lockout, rotating refresh sessions,
//! email verification, password reset, and admin account management.
//!
//! # Overview
//!
//! - bcrypt (cost 12) credential hashing, run on the blocking pool
//! - Four JWT kinds (access, refresh, email verification, password
//!   reset), each signed with its own secret
//! - Refresh sessions embedded in the user row, capped at five per
//!   account with oldest-first eviction
//! - Single-use refresh rotation and single-use reset links
//!
//! # Module Structure
//!
//! - **`auth`** - hashing, token codec, user model, store, handlers
//! - **`error`** - the error taxonomy and its HTTP response mapping
//! - **`mailer`** - outbound email behind the `Mailer` trait
//! - **`middleware`** - access guard and rate limiting
//! - **`routes`** - router wiring
//! - **`server`** - configuration, shared state, startup
//!
//! # Usage
//!
//! ```rust,no_run
//! use mercato::server::{create_app, Config};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env()?;
//! let app = create_app(config).await?;
//! // Serve `app` with axum
//! # Ok(())
//! # }
//! ```

/// Authentication core
pub mod auth;

/// Error taxonomy
pub mod error;

/// Outbound email
pub mod mailer;

/// Request middleware
pub mod middleware;

/// Route wiring
pub mod routes;

/// Configuration, state, startup
pub mod server;

pub use error::AuthError;

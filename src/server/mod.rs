//! Server Module
//!
//! Server setup: configuration loading, shared application state, and
//! app initialization (database pool, migrations, mailer, router).
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs    - Module exports
//! ├── config.rs - Environment-driven configuration
//! ├── state.rs  - Shared AppState
//! └── init.rs   - Pool/migrations/router assembly
//! ```

/// Environment configuration
pub mod config;

/// Shared application state
pub mod state;

/// Application assembly
pub mod init;

// Re-export commonly used types
pub use config::Config;
pub use init::create_app;
pub use state::AppState;

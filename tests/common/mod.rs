//! Common test utilities
//!
//! Shared fixtures for the database-backed scenario tests: a pool with
//! migrations applied, handler-ready application state with a recording
//! mailer, and helpers for creating accounts.

pub mod auth_helpers;
pub mod database;
pub mod mailers;

pub use auth_helpers::*;
pub use database::*;
pub use mailers::*;

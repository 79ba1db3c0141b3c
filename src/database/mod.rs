//! # Database Operations
//!
//! Pool construction from configuration, health checks, and the embedded
//! schema migrations for the signature flow tables.
//!
//! - [`connection`] - Pool setup bounded by the configured timeouts
//! - [`migrations`] - Embedded `sqlx` migrations under `migrations/`

pub mod connection;
pub mod migrations;

pub use connection::DatabaseConnection;
pub use migrations::DatabaseMigrations;

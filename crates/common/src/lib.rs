//! Common utilities and shared types for chatroom-rs.
//!
//! This crate provides foundational components used across all chatroom-rs crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Telemetry**: `tracing` subscriber setup via [`telemetry::init`]
//!
//! # Example
//!
//! ```no_run
//! use chatroom_common::{AppResult, Config};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     chatroom_common::telemetry::init(&config.logging)?;
//!     println!("Database: {}", config.database.url);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod telemetry;

pub use config::{Config, DatabaseConfig, LoggingConfig};
pub use error::{AppError, AppResult};

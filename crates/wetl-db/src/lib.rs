//! MySQL persistence for daily weather records
//!
//! One row per (date, latitude, longitude). Writes are upserts, so running
//! the same range twice replaces values rather than duplicating rows.

pub mod client;
pub mod queries;
pub mod schema;
pub mod store;

pub use client::*;
pub use schema::*;
pub use store::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

pub type DbResult<T> = Result<T, DbError>;

//! SQLite storage implementation for the adledger tracking store.
//!
//! This crate provides all database-related functionality using Diesel with
//! SQLite. It implements the repository traits defined in `adledger-core`
//! and contains:
//! - Connection pooling and the single-writer actor
//! - Embedded Diesel migrations
//! - The tracking-records repository and aggregate queries
//! - Database-specific row models
//!
//! This is the only place in the workspace where Diesel dependencies exist;
//! everything else works with the core traits.

pub mod db;
pub mod errors;
pub mod schema;

// Repository implementations
pub mod tracking;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from adledger-core for convenience
pub use adledger_core::errors::{DatabaseError, Error, Result};

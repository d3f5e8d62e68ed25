//! Persistence layer for the panic button.
//!
//! This crate contains:
//! - SQLite connection management and schema setup
//! - Entity definitions (database row mappings)
//! - The SQLite-backed secure state store
//! - Query metrics

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;

pub use db::{create_pool, init_schema, DatabaseConfig};
pub use repositories::SecureStateRepository;

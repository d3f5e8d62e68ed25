//! Domain layer for the panic button.
//!
//! This crate contains:
//! - Alert, user and notification models
//! - The gesture interpreter and alert lifecycle controller
//! - Collaborator traits (location, secure storage, remote alert store) with mocks
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;

pub use error::{AlertError, GeoError, RemoteError, StorageError};

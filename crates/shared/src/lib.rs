//! Shared utilities and common types for the panic button workspace.
//!
//! This crate provides common functionality used across all other crates:
//! - Coordinate and timestamp validation
//! - Great-circle distance between coordinates

pub mod distance;
pub mod validation;

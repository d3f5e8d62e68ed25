//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod secure_entry;

pub use secure_entry::SecureEntryEntity;

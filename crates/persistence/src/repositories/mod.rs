//! Repository implementations for database operations.

pub mod secure_state;

pub use secure_state::SecureStateRepository;

//! Secure state entry entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the secure_state table.
#[derive(Debug, Clone, FromRow)]
pub struct SecureEntryEntity {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

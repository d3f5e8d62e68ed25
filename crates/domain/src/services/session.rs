//! Signed-in user persistence.
//!
//! The session is kept as JSON in the secure state store. Anything missing or
//! unreadable counts as "no identity".

use tracing::warn;

use crate::error::StorageError;
use crate::models::UserRef;
use crate::services::storage::{SecureStateStore, USER_SESSION_KEY};

/// Persists the signed-in user.
pub async fn save_session(store: &dyn SecureStateStore, user: &UserRef) -> Result<(), StorageError> {
    let json = serde_json::to_string(user).map_err(|e| StorageError::Corrupt(e.to_string()))?;
    store.set(USER_SESSION_KEY, &json).await
}

/// Loads the signed-in user, if any.
pub async fn load_session(store: &dyn SecureStateStore) -> Option<UserRef> {
    let raw = match store.get(USER_SESSION_KEY).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(error = %e, "Failed to read user session");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(user) => Some(user),
        Err(e) => {
            warn!(error = %e, "Stored user session is not valid JSON");
            None
        }
    }
}

/// Signs the user out locally.
pub async fn clear_session(store: &dyn SecureStateStore) -> Result<(), StorageError> {
    store.delete(USER_SESSION_KEY).await
}

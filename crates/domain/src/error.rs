//! Error types for the alert core.

use thiserror::Error;

/// Failures reported by a location provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeoError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Position unavailable: {0}")]
    PositionUnavailable(String),
}

/// Failures reported by the secure state store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("Stored value is corrupt: {0}")]
    Corrupt(String),
}

/// Failures reported by the remote alert store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    #[error("Server rejected request: {0}")]
    ServerRejected(String),

    #[error("Alert {0} not found")]
    NotFound(i64),

    #[error("Invalid response from alert service: {0}")]
    InvalidResponse(String),
}

/// Error returned to the UI layer by lifecycle and history operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlertError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Position unavailable: {0}")]
    PositionUnavailable(String),

    #[error("No signed-in user")]
    NoIdentity,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Server rejected request: {0}")]
    ServerRejected(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl AlertError {
    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            AlertError::PermissionDenied => {
                "Location permission is required to send an alert. Enable it in settings.".into()
            }
            AlertError::PositionUnavailable(_) => {
                "Your location could not be determined. Try again.".into()
            }
            AlertError::NoIdentity => "You need to sign in before sending an alert.".into(),
            AlertError::NetworkError(_) => {
                "Could not reach the alert service. Try again.".into()
            }
            AlertError::ServerRejected(reason) => format!("The alert service refused: {}", reason),
            AlertError::InvalidState(reason) => reason.clone(),
            AlertError::StorageError(_) => {
                "The alert was sent but could not be saved on this device.".into()
            }
        }
    }

    /// Invalid-state rejections are logged, never shown as alarming errors.
    pub fn is_silent(&self) -> bool {
        matches!(self, AlertError::InvalidState(_))
    }

    /// Whether re-triggering the gesture may succeed without user intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AlertError::PositionUnavailable(_)
                | AlertError::NetworkError(_)
                | AlertError::ServerRejected(_)
        )
    }
}

impl From<GeoError> for AlertError {
    fn from(err: GeoError) -> Self {
        match err {
            GeoError::PermissionDenied => AlertError::PermissionDenied,
            GeoError::PositionUnavailable(reason) => AlertError::PositionUnavailable(reason),
        }
    }
}

impl From<RemoteError> for AlertError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Network(reason) => AlertError::NetworkError(reason),
            RemoteError::Timeout(ms) => {
                AlertError::NetworkError(format!("request timed out after {}ms", ms))
            }
            RemoteError::ServerRejected(reason) => AlertError::ServerRejected(reason),
            RemoteError::NotFound(id) => {
                AlertError::ServerRejected(format!("alert {} not found", id))
            }
            RemoteError::InvalidResponse(reason) => AlertError::ServerRejected(reason),
        }
    }
}

impl From<StorageError> for AlertError {
    fn from(err: StorageError) -> Self {
        AlertError::StorageError(err.to_string())
    }
}

//! Alert domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AlertError;
use crate::models::UserRef;

/// Kind of alert raised by the panic button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Emergency,
    Precaution,
}

impl AlertKind {
    /// Message attached to a new alert when the user gives none.
    pub fn default_message(&self) -> &'static str {
        match self {
            AlertKind::Emergency => "Alert raised from the panic button",
            AlertKind::Precaution => "Precaution alert raised from the panic button",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertKind::Emergency => write!(f, "emergency"),
            AlertKind::Precaution => write!(f, "precaution"),
        }
    }
}

impl std::str::FromStr for AlertKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "emergency" => Ok(AlertKind::Emergency),
            "precaution" => Ok(AlertKind::Precaution),
            other => Err(format!(
                "unknown alert kind '{}', expected 'emergency' or 'precaution'",
                other
            )),
        }
    }
}

/// A geographic position captured at activation time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// (latitude, longitude) pair for distance helpers.
    pub fn as_pair(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// The canonical alert entity.
///
/// `kind`, `position` and `created_at` are fixed when the draft is built and
/// `id` is assigned exactly once, when the remote store accepts the create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub user_id: i64,
    pub kind: AlertKind,
    pub message: String,
    #[validate(nested)]
    pub position: Coordinates,
    #[validate(custom(function = "shared::validation::validate_activation_time"))]
    pub created_at: DateTime<Utc>,
    pub active: bool,
    #[serde(default)]
    pub user_photo_ref: Option<String>,
}

impl AlertRecord {
    /// Builds an unconfirmed alert for the given user at the given position.
    pub fn draft(
        user: &UserRef,
        kind: AlertKind,
        position: Coordinates,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            user_id: user.id,
            kind,
            message: kind.default_message().to_string(),
            position,
            created_at,
            active: true,
            user_photo_ref: user.photo_ref.clone(),
        }
    }

    /// Returns the confirmed record carrying the server-assigned id.
    ///
    /// Fails if the record already has an id.
    pub fn with_assigned_id(self, id: i64) -> Result<Self, AlertError> {
        if let Some(existing) = self.id {
            return Err(AlertError::InvalidState(format!(
                "alert already has id {}",
                existing
            )));
        }
        Ok(Self {
            id: Some(id),
            ..self
        })
    }
}

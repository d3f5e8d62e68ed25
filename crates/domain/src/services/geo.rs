//! Device location provider abstraction.

use std::sync::Mutex;

use crate::error::GeoError;
use crate::models::Coordinates;

/// Source of the device's current position.
#[async_trait::async_trait]
pub trait GeoProvider: Send + Sync {
    /// Requests permission if needed and returns the current position.
    async fn current_position(&self) -> Result<Coordinates, GeoError>;
}

/// Location provider returning a fixed, swappable answer.
///
/// Used for configured positions on hosts without a GPS and in tests.
#[derive(Debug)]
pub struct FixedGeoProvider {
    answer: Mutex<Result<Coordinates, GeoError>>,
}

impl FixedGeoProvider {
    /// Provider that always reports the given position.
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            answer: Mutex::new(Ok(Coordinates::new(latitude, longitude))),
        }
    }

    /// Provider whose permission was refused.
    pub fn denied() -> Self {
        Self {
            answer: Mutex::new(Err(GeoError::PermissionDenied)),
        }
    }

    /// Provider that cannot get a fix.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            answer: Mutex::new(Err(GeoError::PositionUnavailable(reason.into()))),
        }
    }

    /// Replaces the answer returned by later queries.
    pub fn set(&self, answer: Result<Coordinates, GeoError>) {
        if let Ok(mut guard) = self.answer.lock() {
            *guard = answer;
        }
    }
}

#[async_trait::async_trait]
impl GeoProvider for FixedGeoProvider {
    async fn current_position(&self) -> Result<Coordinates, GeoError> {
        self.answer
            .lock()
            .map_err(|_| GeoError::PositionUnavailable("location provider poisoned".into()))?
            .clone()
    }
}

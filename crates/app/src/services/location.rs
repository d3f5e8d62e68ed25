//! Location source for hosts without a positioning sensor.

use std::sync::Arc;

use domain::services::{FixedGeoProvider, GeoProvider};
use tracing::debug;

use crate::config::LocationConfig;

/// Provider answering with the configured position, or refusing permission
/// when location is disabled.
pub fn geo_provider(config: &LocationConfig) -> Arc<dyn GeoProvider> {
    if config.enabled {
        debug!(
            latitude = config.latitude,
            longitude = config.longitude,
            "Using configured position"
        );
        Arc::new(FixedGeoProvider::at(config.latitude, config.longitude))
    } else {
        debug!("Location disabled, position requests will be refused");
        Arc::new(FixedGeoProvider::denied())
    }
}

//! Alert history, nearby alerts and notifications.
//!
//! Read-mostly access to the remote store used by the history screens. It
//! never mutates the lifecycle controller's alert.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::AlertError;
use crate::models::{AlertNotification, AlertRecord, Coordinates};
use crate::services::context::AlertContext;
use crate::services::remote::AlertRemoteClient;

/// History queries over the remote alert store.
pub struct AlertHistory {
    remote: Arc<dyn AlertRemoteClient>,
    context: AlertContext,
}

impl AlertHistory {
    /// `context` is consulted so the live alert is never deleted from here.
    pub fn new(remote: Arc<dyn AlertRemoteClient>, context: AlertContext) -> Self {
        Self { remote, context }
    }

    /// All alerts, newest first.
    pub async fn all(&self) -> Result<Vec<AlertRecord>, AlertError> {
        let mut alerts = self.remote.list().await?;
        sort_newest_first(&mut alerts);
        Ok(alerts)
    }

    /// Alerts raised by one user, newest first.
    pub async fn mine(&self, user_id: i64) -> Result<Vec<AlertRecord>, AlertError> {
        let mut alerts = self.remote.list_for_user(user_id).await?;
        sort_newest_first(&mut alerts);
        Ok(alerts)
    }

    pub async fn get(&self, id: i64) -> Result<AlertRecord, AlertError> {
        Ok(self.remote.get_by_id(id).await?)
    }

    /// Deletes an alert from the remote store.
    ///
    /// The alert currently held by the lifecycle controller cannot be deleted
    /// here; it has to be deactivated first.
    pub async fn delete(&self, id: i64) -> Result<(), AlertError> {
        if self.context.current_alert().and_then(|a| a.id) == Some(id) {
            warn!(alert_id = id, "Refusing to delete the live alert");
            return Err(AlertError::InvalidState(
                "the active alert must be deactivated before it can be deleted".into(),
            ));
        }
        self.remote.delete(id).await?;
        info!(alert_id = id, "Alert deleted");
        Ok(())
    }

    /// Alerts within `radius_km` of `origin`, newest first.
    pub async fn nearby(
        &self,
        origin: Coordinates,
        radius_km: f64,
    ) -> Result<Vec<AlertRecord>, AlertError> {
        let alerts = self.all().await?;
        Ok(alerts
            .into_iter()
            .filter(|a| {
                shared::distance::within_radius_km(origin.as_pair(), a.position.as_pair(), radius_km)
            })
            .collect())
    }

    /// Every alert as a notification, newest first.
    pub async fn notifications(&self) -> Result<Vec<AlertNotification>, AlertError> {
        Ok(self
            .all()
            .await?
            .iter()
            .filter_map(AlertNotification::from_alert)
            .collect())
    }
}

fn sort_newest_first(alerts: &mut [AlertRecord]) {
    alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

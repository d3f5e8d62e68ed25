//! Single-active-alert lifecycle.
//!
//! ```text
//! Idle --activate--> Pending --create ok--> Active --deactivate--> Deactivating --update ok--> Idle
//!                       |                     ^                          |
//!                       +--create failed--> Idle      +---update failed--+
//! ```
//!
//! At most one transition is in flight at a time. Intents arriving while the
//! controller is `Pending` or `Deactivating` are rejected, never queued.
//! Local state only changes after the remote store confirms, or by a complete
//! rollback to the pre-transition state.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use metrics::counter;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::error::{AlertError, RemoteError, StorageError};
use crate::models::{AlertKind, AlertRecord};
use crate::services::context::{AlertContext, AlertSnapshot, LifecyclePhase};
use crate::services::geo::GeoProvider;
use crate::services::remote::AlertRemoteClient;
use crate::services::session::load_session;
use crate::services::storage::{SecureStateStore, ACTIVE_ALERT_KEY};

/// Default bound on a single remote or location call.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(8);

/// Controller tuning.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Any single location or remote call taking longer fails the transition.
    pub remote_timeout: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
enum LifecycleState {
    Idle,
    /// The draft is `None` while identity and location are still being resolved.
    Pending(Option<AlertRecord>),
    Active(AlertRecord),
    Deactivating(AlertRecord),
}

impl LifecycleState {
    fn phase(&self) -> LifecyclePhase {
        match self {
            LifecycleState::Idle => LifecyclePhase::Idle,
            LifecycleState::Pending(_) => LifecyclePhase::Pending,
            LifecycleState::Active(_) => LifecyclePhase::Active,
            LifecycleState::Deactivating(_) => LifecyclePhase::Deactivating,
        }
    }

    fn snapshot(&self) -> AlertSnapshot {
        let alert = match self {
            LifecycleState::Active(alert) | LifecycleState::Deactivating(alert) => {
                Some(alert.clone())
            }
            LifecycleState::Idle | LifecycleState::Pending(_) => None,
        };
        AlertSnapshot {
            phase: self.phase(),
            alert,
        }
    }
}

/// An in-flight transition.
///
/// Dropping it before `commit` restores the pre-transition state, so a
/// cancelled `activate` or `deactivate` never leaves the controller stuck.
struct Reservation<'a> {
    controller: &'a AlertLifecycleController,
    rollback: Option<LifecycleState>,
}

impl<'a> Reservation<'a> {
    fn new(controller: &'a AlertLifecycleController, rollback: LifecycleState) -> Self {
        Self {
            controller,
            rollback: Some(rollback),
        }
    }

    fn commit(mut self, next: LifecycleState) {
        self.rollback = None;
        self.controller.set_state(next);
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.rollback.take() {
            debug!(phase = %previous.phase(), "Rolling back unfinished transition");
            self.controller.set_state(previous);
        }
    }
}

/// Result of a completed transition.
#[derive(Debug, Clone)]
pub struct Transition {
    pub phase: LifecyclePhase,
    pub alert: Option<AlertRecord>,
    /// Set when the remote store confirmed but the local copy could not be updated.
    pub storage_warning: Option<StorageError>,
}

/// Owns the current alert and drives every state change.
pub struct AlertLifecycleController {
    geo: Arc<dyn GeoProvider>,
    remote: Arc<dyn AlertRemoteClient>,
    store: Arc<dyn SecureStateStore>,
    context: AlertContext,
    config: LifecycleConfig,
    state: Mutex<LifecycleState>,
}

impl AlertLifecycleController {
    pub fn new(
        geo: Arc<dyn GeoProvider>,
        remote: Arc<dyn AlertRemoteClient>,
        store: Arc<dyn SecureStateStore>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            geo,
            remote,
            store,
            context: AlertContext::new(),
            config,
            state: Mutex::new(LifecycleState::Idle),
        }
    }

    /// Handle for UI subscribers.
    pub fn context(&self) -> AlertContext {
        self.context.clone()
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.state().phase()
    }

    /// The confirmed alert while `Active` or `Deactivating`.
    pub fn current_alert(&self) -> Option<AlertRecord> {
        self.state().snapshot().alert
    }

    /// Restores a persisted alert at startup.
    ///
    /// A stored record is trusted as last-known-good and goes straight to
    /// `Active`. Read or parse failures leave the controller `Idle`.
    pub async fn rehydrate(&self) -> Option<AlertRecord> {
        if self.phase() != LifecyclePhase::Idle {
            debug!(phase = %self.phase(), "Skipping rehydration, controller already in use");
            return self.current_alert();
        }

        let raw = match self.store.get(ACTIVE_ALERT_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No persisted alert to rehydrate");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read persisted alert, starting idle");
                return None;
            }
        };

        let alert: AlertRecord = match serde_json::from_str(&raw) {
            Ok(alert) => alert,
            Err(e) => {
                warn!(error = %e, "Persisted alert is unreadable, starting idle");
                return None;
            }
        };
        if let Err(e) = alert.validate() {
            warn!(error = %e, "Persisted alert failed validation, starting idle");
            return None;
        }

        let mut state = self.state();
        if !matches!(*state, LifecycleState::Idle) {
            return state.snapshot().alert;
        }
        *state = LifecycleState::Active(alert.clone());
        self.context.publish(state.snapshot());
        drop(state);

        info!(alert_id = ?alert.id, kind = %alert.kind, "Rehydrated active alert");
        counter!("alert_transitions_total", "transition" => "rehydrated").increment(1);
        Some(alert)
    }

    /// Raises a new alert of the given kind.
    pub async fn activate(&self, kind: AlertKind) -> Result<Transition, AlertError> {
        let reservation = {
            let mut state = self.state();
            if !matches!(*state, LifecycleState::Idle) {
                return Err(self.reject(format!("cannot activate while {}", state.phase())));
            }
            *state = LifecycleState::Pending(None);
            Reservation::new(self, LifecycleState::Idle)
        };

        let draft = match self.build_draft(kind).await {
            Ok(draft) => draft,
            Err(e) => {
                warn!(kind = %kind, error = %e, "Activation aborted before remote create");
                counter!("alert_transitions_total", "transition" => "activate_aborted").increment(1);
                return Err(e);
            }
        };

        self.set_state(LifecycleState::Pending(Some(draft.clone())));
        info!(
            kind = %kind,
            latitude = draft.position.latitude,
            longitude = draft.position.longitude,
            "Alert pending remote confirmation"
        );

        let created = match self.with_timeout(self.remote.create(&draft)).await {
            Ok(created) => created,
            Err(e) => return Err(self.fail_activation(e)),
        };
        let Some(id) = created.id else {
            return Err(self.fail_activation(RemoteError::InvalidResponse(
                "created alert has no id".into(),
            )));
        };
        // kind, position and timestamp come from the local draft, never the response
        let confirmed = draft.with_assigned_id(id)?;
        reservation.commit(LifecycleState::Active(confirmed.clone()));

        info!(alert_id = id, kind = %kind, "Alert active");
        counter!("alert_transitions_total", "transition" => "activated").increment(1);

        let storage_warning = self.persist(&confirmed).await.err();

        Ok(Transition {
            phase: LifecyclePhase::Active,
            alert: Some(confirmed),
            storage_warning,
        })
    }

    /// Deactivates the current alert.
    pub async fn deactivate(&self) -> Result<Transition, AlertError> {
        let (reservation, id) = {
            let mut state = self.state();
            let current = match &*state {
                LifecycleState::Active(alert) => Some(alert.clone()),
                _ => None,
            };
            let Some(alert) = current else {
                return Err(self.reject(format!("cannot deactivate while {}", state.phase())));
            };
            let Some(id) = alert.id else {
                return Err(self.reject("no valid alert id".to_string()));
            };
            *state = LifecycleState::Deactivating(alert.clone());
            self.context.publish(state.snapshot());
            (Reservation::new(self, LifecycleState::Active(alert)), id)
        };

        info!(alert_id = id, "Requesting remote deactivation");

        if let Err(e) = self.with_timeout(self.remote.set_active(id, false)).await {
            warn!(alert_id = id, error = %e, "Deactivation failed, alert remains active");
            counter!("alert_transitions_total", "transition" => "deactivate_failed").increment(1);
            return Err(e.into());
        }

        reservation.commit(LifecycleState::Idle);
        info!(alert_id = id, "Alert deactivated");
        counter!("alert_transitions_total", "transition" => "deactivated").increment(1);

        let storage_warning = self.erase_persisted().await.err();

        Ok(Transition {
            phase: LifecyclePhase::Idle,
            alert: None,
            storage_warning,
        })
    }

    /// Forces `Idle` locally without a remote round trip.
    ///
    /// Meant for propagating a deactivation already confirmed elsewhere.
    /// Refused while a transition is in flight.
    pub async fn clear(&self) -> Result<Transition, AlertError> {
        {
            let state = self.state();
            if matches!(
                *state,
                LifecycleState::Pending(_) | LifecycleState::Deactivating(_)
            ) {
                return Err(self.reject(format!("cannot clear while {}", state.phase())));
            }
        }

        let storage_warning = self.erase_persisted().await.err();
        self.reset_to_idle();
        info!("Alert state cleared locally");

        Ok(Transition {
            phase: LifecyclePhase::Idle,
            alert: None,
            storage_warning,
        })
    }

    async fn build_draft(&self, kind: AlertKind) -> Result<AlertRecord, AlertError> {
        let user = load_session(self.store.as_ref())
            .await
            .ok_or(AlertError::NoIdentity)?;

        let position = match tokio::time::timeout(
            self.config.remote_timeout,
            self.geo.current_position(),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(AlertError::PositionUnavailable(
                    "location request timed out".into(),
                ))
            }
        };

        position.validate().map_err(|e| {
            AlertError::PositionUnavailable(format!("invalid coordinates: {}", e))
        })?;

        Ok(AlertRecord::draft(&user, kind, position, Utc::now()))
    }

    fn fail_activation(&self, err: RemoteError) -> AlertError {
        warn!(error = %err, "Remote create failed, alert discarded");
        counter!("alert_transitions_total", "transition" => "activate_failed").increment(1);
        err.into()
    }

    async fn persist(&self, alert: &AlertRecord) -> Result<(), StorageError> {
        let json =
            serde_json::to_string(alert).map_err(|e| StorageError::Corrupt(e.to_string()))?;
        self.store
            .set(ACTIVE_ALERT_KEY, &json)
            .await
            .inspect_err(|e| {
                warn!(alert_id = ?alert.id, error = %e, "Alert confirmed remotely but not saved locally")
            })
    }

    async fn erase_persisted(&self) -> Result<(), StorageError> {
        self.store
            .delete(ACTIVE_ALERT_KEY)
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to erase persisted alert"))
    }

    async fn with_timeout<T>(
        &self,
        call: impl Future<Output = Result<T, RemoteError>>,
    ) -> Result<T, RemoteError> {
        match tokio::time::timeout(self.config.remote_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::Timeout(
                self.config.remote_timeout.as_millis() as u64,
            )),
        }
    }

    fn reset_to_idle(&self) {
        self.set_state(LifecycleState::Idle);
    }

    fn set_state(&self, next: LifecycleState) {
        let mut state = self.state();
        *state = next;
        self.context.publish(state.snapshot());
    }

    fn reject(&self, reason: String) -> AlertError {
        debug!(reason = %reason, "Rejected lifecycle intent");
        counter!("alert_transitions_total", "transition" => "rejected").increment(1);
        AlertError::InvalidState(reason)
    }

    fn state(&self) -> MutexGuard<'_, LifecycleState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

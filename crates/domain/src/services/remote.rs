//! Remote alert store abstraction.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

use tokio::sync::Notify;

use crate::error::RemoteError;
use crate::models::AlertRecord;

/// REST-backed store of alerts shared by all users.
#[async_trait::async_trait]
pub trait AlertRemoteClient: Send + Sync {
    /// Creates the alert and returns it with the server-assigned id.
    async fn create(&self, alert: &AlertRecord) -> Result<AlertRecord, RemoteError>;

    /// Marks an alert active or inactive.
    async fn set_active(&self, id: i64, active: bool) -> Result<(), RemoteError>;

    /// Lists every alert.
    async fn list(&self) -> Result<Vec<AlertRecord>, RemoteError>;

    /// Lists alerts raised by one user.
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<AlertRecord>, RemoteError>;

    async fn get_by_id(&self, id: i64) -> Result<AlertRecord, RemoteError>;

    async fn delete(&self, id: i64) -> Result<(), RemoteError>;
}

/// Mock remote store for development and testing.
///
/// Keeps alerts in memory, counts calls, can be told to fail, and can hold
/// mutating requests open until [`MockAlertRemoteClient::release`] is called.
#[derive(Debug)]
pub struct MockAlertRemoteClient {
    alerts: Mutex<Vec<AlertRecord>>,
    next_id: AtomicI64,
    create_calls: AtomicUsize,
    set_active_calls: Mutex<Vec<(i64, bool)>>,
    create_failure: Mutex<Option<RemoteError>>,
    set_active_failure: Mutex<Option<RemoteError>>,
    holding: AtomicBool,
    gate: Notify,
}

impl Default for MockAlertRemoteClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAlertRemoteClient {
    /// Create a new mock remote store assigning ids from 1.
    pub fn new() -> Self {
        Self {
            alerts: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            create_calls: AtomicUsize::new(0),
            set_active_calls: Mutex::new(Vec::new()),
            create_failure: Mutex::new(None),
            set_active_failure: Mutex::new(None),
            holding: AtomicBool::new(false),
            gate: Notify::new(),
        }
    }

    /// Sets the id assigned to the next created alert.
    pub fn with_next_id(self, id: i64) -> Self {
        self.next_id.store(id, Ordering::SeqCst);
        self
    }

    /// Pre-populates the store.
    pub fn seed(&self, alerts: Vec<AlertRecord>) {
        if let Ok(mut guard) = self.alerts.lock() {
            guard.extend(alerts);
        }
    }

    /// Makes every later `create` fail with the given error (`None` to clear).
    pub fn fail_creates(&self, err: Option<RemoteError>) {
        if let Ok(mut guard) = self.create_failure.lock() {
            *guard = err;
        }
    }

    /// Makes every later `set_active` fail with the given error (`None` to clear).
    pub fn fail_set_active(&self, err: Option<RemoteError>) {
        if let Ok(mut guard) = self.set_active_failure.lock() {
            *guard = err;
        }
    }

    /// Holds `create` and `set_active` open until released.
    pub fn hold_requests(&self, hold: bool) {
        self.holding.store(hold, Ordering::SeqCst);
    }

    /// Lets one held request proceed.
    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn set_active_calls(&self) -> Vec<(i64, bool)> {
        self.set_active_calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Current contents of the store.
    pub fn stored(&self) -> Vec<AlertRecord> {
        self.alerts
            .lock()
            .map(|alerts| alerts.clone())
            .unwrap_or_default()
    }

    async fn wait_if_held(&self) {
        if self.holding.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }
    }

    fn lock_alerts(&self) -> Result<std::sync::MutexGuard<'_, Vec<AlertRecord>>, RemoteError> {
        self.alerts
            .lock()
            .map_err(|_| RemoteError::Network("mock store poisoned".into()))
    }

    fn pending_failure(slot: &Mutex<Option<RemoteError>>) -> Option<RemoteError> {
        slot.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait::async_trait]
impl AlertRemoteClient for MockAlertRemoteClient {
    async fn create(&self, alert: &AlertRecord) -> Result<AlertRecord, RemoteError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_if_held().await;

        if let Some(err) = Self::pending_failure(&self.create_failure) {
            tracing::warn!(error = %err, "Mock remote store simulating create failure");
            return Err(err);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut created = alert.clone();
        created.id = Some(id);
        self.lock_alerts()?.push(created.clone());

        tracing::info!(alert_id = id, kind = %alert.kind, "Mock: created alert");
        Ok(created)
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<(), RemoteError> {
        if let Ok(mut calls) = self.set_active_calls.lock() {
            calls.push((id, active));
        }
        self.wait_if_held().await;

        if let Some(err) = Self::pending_failure(&self.set_active_failure) {
            tracing::warn!(error = %err, alert_id = id, "Mock remote store simulating update failure");
            return Err(err);
        }

        let mut alerts = self.lock_alerts()?;
        match alerts.iter_mut().find(|a| a.id == Some(id)) {
            Some(alert) => {
                alert.active = active;
                Ok(())
            }
            None => Err(RemoteError::NotFound(id)),
        }
    }

    async fn list(&self) -> Result<Vec<AlertRecord>, RemoteError> {
        Ok(self.lock_alerts()?.clone())
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<AlertRecord>, RemoteError> {
        Ok(self
            .lock_alerts()?
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<AlertRecord, RemoteError> {
        self.lock_alerts()?
            .iter()
            .find(|a| a.id == Some(id))
            .cloned()
            .ok_or(RemoteError::NotFound(id))
    }

    async fn delete(&self, id: i64) -> Result<(), RemoteError> {
        let mut alerts = self.lock_alerts()?;
        let before = alerts.len();
        alerts.retain(|a| a.id != Some(id));
        if alerts.len() == before {
            return Err(RemoteError::NotFound(id));
        }
        Ok(())
    }
}

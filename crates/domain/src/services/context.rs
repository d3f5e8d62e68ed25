//! Process-wide observable view of the current alert.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::models::AlertRecord;

/// Coarse lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    Idle,
    Pending,
    Active,
    Deactivating,
}

impl std::fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecyclePhase::Idle => write!(f, "idle"),
            LifecyclePhase::Pending => write!(f, "pending"),
            LifecyclePhase::Active => write!(f, "active"),
            LifecyclePhase::Deactivating => write!(f, "deactivating"),
        }
    }
}

/// What subscribers see: the phase plus the confirmed alert, if any.
///
/// `alert` is only set while the phase is `Active` or `Deactivating`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertSnapshot {
    pub phase: LifecyclePhase,
    pub alert: Option<AlertRecord>,
}

impl AlertSnapshot {
    pub fn idle() -> Self {
        Self {
            phase: LifecyclePhase::Idle,
            alert: None,
        }
    }
}

/// Cloneable handle publishing the controller's state to UI subscribers.
///
/// Only the lifecycle controller writes to it; everyone else reads or subscribes.
#[derive(Debug, Clone)]
pub struct AlertContext {
    tx: Arc<watch::Sender<AlertSnapshot>>,
}

impl Default for AlertContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertContext {
    /// Create a context starting in `Idle`.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AlertSnapshot::idle());
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> AlertSnapshot {
        self.tx.borrow().clone()
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.tx.borrow().phase
    }

    /// The confirmed alert, or `None` when nothing is live.
    pub fn current_alert(&self) -> Option<AlertRecord> {
        self.tx.borrow().alert.clone()
    }

    /// Receiver notified on every published change.
    pub fn subscribe(&self) -> watch::Receiver<AlertSnapshot> {
        self.tx.subscribe()
    }

    pub(crate) fn publish(&self, snapshot: AlertSnapshot) {
        tracing::debug!(phase = %snapshot.phase, "Publishing alert state");
        self.tx.send_replace(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertKind, Coordinates, UserRef};
    use chrono::Utc;

    #[test]
    fn test_starts_idle() {
        let context = AlertContext::new();
        assert_eq!(context.phase(), LifecyclePhase::Idle);
        assert!(context.current_alert().is_none());
    }

    #[tokio::test]
    async fn test_subscribers_see_published_state() {
        let context = AlertContext::new();
        let mut rx = context.subscribe();

        let alert = AlertRecord::draft(
            &UserRef::new(1),
            AlertKind::Emergency,
            Coordinates::new(0.0, 0.0),
            Utc::now(),
        )
        .with_assigned_id(5)
        .unwrap();

        context.publish(AlertSnapshot {
            phase: LifecyclePhase::Active,
            alert: Some(alert.clone()),
        });

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().phase, LifecyclePhase::Active);
        assert_eq!(context.current_alert(), Some(alert));
    }

    #[test]
    fn test_clones_share_state() {
        let context = AlertContext::new();
        let other = context.clone();
        context.publish(AlertSnapshot {
            phase: LifecyclePhase::Pending,
            alert: None,
        });
        assert_eq!(other.phase(), LifecyclePhase::Pending);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(LifecyclePhase::Deactivating.to_string(), "deactivating");
    }
}

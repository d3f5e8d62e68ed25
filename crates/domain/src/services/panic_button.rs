//! UI-facing panic button surface.
//!
//! Wires the gesture callbacks of the hosting control to the lifecycle
//! controller and exposes what the screen needs to render.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::debug;

use crate::error::AlertError;
use crate::models::{AlertKind, AlertRecord};
use crate::services::context::{AlertSnapshot, LifecyclePhase};
use crate::services::gesture::{ActivationIntent, GestureEvent, GestureInterpreter, GestureThresholds};
use crate::services::lifecycle::{AlertLifecycleController, Transition};

/// What happened when a gesture was released.
#[derive(Debug)]
pub enum GestureOutcome {
    /// Released without crossing a threshold.
    Ignored,
    /// The intent was handed to the controller.
    Dispatched {
        intent: ActivationIntent,
        result: Result<Transition, AlertError>,
    },
}

/// Panic button bound to one lifecycle controller.
pub struct PanicButton {
    controller: Arc<AlertLifecycleController>,
    interpreter: Mutex<GestureInterpreter>,
}

impl PanicButton {
    pub fn new(controller: Arc<AlertLifecycleController>, thresholds: GestureThresholds) -> Self {
        Self {
            controller,
            interpreter: Mutex::new(GestureInterpreter::new(thresholds)),
        }
    }

    pub fn controller(&self) -> &Arc<AlertLifecycleController> {
        &self.controller
    }

    /// Feeds a gesture update. Returns an outcome only when the press is released.
    pub async fn on_gesture(&self, event: GestureEvent) -> Option<GestureOutcome> {
        let active = self.controller.phase() == LifecyclePhase::Active;
        let intent = self.interpreter().handle(event, active)?;
        Some(self.dispatch(intent).await)
    }

    /// Runs an already classified intent.
    pub async fn dispatch(&self, intent: ActivationIntent) -> GestureOutcome {
        let result = match intent {
            ActivationIntent::NoOp => {
                debug!("Gesture released inside thresholds, ignoring");
                return GestureOutcome::Ignored;
            }
            ActivationIntent::Activate(kind) => self.controller.activate(kind).await,
            ActivationIntent::Deactivate => self.controller.deactivate().await,
        };
        GestureOutcome::Dispatched { intent, result }
    }

    pub async fn activate(&self, kind: AlertKind) -> Result<Transition, AlertError> {
        self.controller.activate(kind).await
    }

    pub async fn deactivate(&self) -> Result<Transition, AlertError> {
        self.controller.deactivate().await
    }

    pub async fn clear(&self) -> Result<Transition, AlertError> {
        self.controller.clear().await
    }

    pub fn current_alert(&self) -> Option<AlertRecord> {
        self.controller.current_alert()
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.controller.phase()
    }

    pub fn subscribe(&self) -> watch::Receiver<AlertSnapshot> {
        self.controller.context().subscribe()
    }

    /// True while the button is held.
    pub fn auxiliary_controls_visible(&self) -> bool {
        self.interpreter().auxiliary_controls_visible()
    }

    /// Live drag offset for animating the button.
    pub fn drag_offset(&self) -> f64 {
        self.interpreter().current_offset()
    }

    fn interpreter(&self) -> MutexGuard<'_, GestureInterpreter> {
        self.interpreter
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinates, UserRef};
    use crate::services::geo::FixedGeoProvider;
    use crate::services::lifecycle::LifecycleConfig;
    use crate::services::remote::MockAlertRemoteClient;
    use crate::services::session::save_session;
    use crate::services::storage::{InMemoryStateStore, ACTIVE_ALERT_KEY};

    async fn button() -> (PanicButton, Arc<MockAlertRemoteClient>, Arc<InMemoryStateStore>) {
        let remote = Arc::new(MockAlertRemoteClient::new().with_next_id(42));
        let store = Arc::new(InMemoryStateStore::new());
        save_session(store.as_ref(), &UserRef::new(3)).await.unwrap();
        let controller = Arc::new(AlertLifecycleController::new(
            Arc::new(FixedGeoProvider::at(-0.22, -78.51)),
            remote.clone(),
            store.clone(),
            LifecycleConfig::default(),
        ));
        (
            PanicButton::new(controller, GestureThresholds::default()),
            remote,
            store,
        )
    }

    async fn press_drag_release(button: &PanicButton, offset: f64) -> GestureOutcome {
        assert!(button.on_gesture(GestureEvent::began()).await.is_none());
        assert!(button.auxiliary_controls_visible());
        assert!(button.on_gesture(GestureEvent::changed(offset)).await.is_none());
        let outcome = button
            .on_gesture(GestureEvent::ended(offset))
            .await
            .expect("release produces an outcome");
        assert!(!button.auxiliary_controls_visible());
        outcome
    }

    #[tokio::test]
    async fn test_precaution_drag_activates() {
        let (button, remote, _store) = button().await;

        let outcome = press_drag_release(&button, -120.0).await;
        match outcome {
            GestureOutcome::Dispatched { intent, result } => {
                assert_eq!(intent, ActivationIntent::Activate(AlertKind::Precaution));
                let alert = result.unwrap().alert.unwrap();
                assert_eq!(alert.id, Some(42));
                assert_eq!(alert.kind, AlertKind::Precaution);
                assert_eq!(alert.position, Coordinates::new(-0.22, -78.51));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(button.phase(), LifecyclePhase::Active);
        assert_eq!(remote.stored()[0].kind, AlertKind::Precaution);
    }

    #[tokio::test]
    async fn test_short_drag_is_ignored_and_stays_idle() {
        let (button, remote, _store) = button().await;

        let outcome = press_drag_release(&button, 60.0).await;
        assert!(matches!(outcome, GestureOutcome::Ignored));
        assert_eq!(button.phase(), LifecyclePhase::Idle);
        assert_eq!(remote.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_any_release_while_active_deactivates() {
        let (button, remote, store) = button().await;
        press_drag_release(&button, 150.0).await;
        assert_eq!(button.phase(), LifecyclePhase::Active);

        let outcome = press_drag_release(&button, 5.0).await;
        match outcome {
            GestureOutcome::Dispatched { intent, result } => {
                assert_eq!(intent, ActivationIntent::Deactivate);
                assert_eq!(result.unwrap().phase, LifecyclePhase::Idle);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(remote.set_active_calls(), vec![(42, false)]);
        assert!(store.peek(ACTIVE_ALERT_KEY).is_none());
        assert!(button.current_alert().is_none());
    }

    #[tokio::test]
    async fn test_drag_offset_tracks_press() {
        let (button, _remote, _store) = button().await;
        button.on_gesture(GestureEvent::began()).await;
        button.on_gesture(GestureEvent::changed(-42.0)).await;
        assert_eq!(button.drag_offset(), -42.0);
        button.on_gesture(GestureEvent::ended(-42.0)).await;
        assert_eq!(button.drag_offset(), 0.0);
    }

    #[tokio::test]
    async fn test_subscribe_reflects_activation() {
        let (button, _remote, _store) = button().await;
        let rx = button.subscribe();
        button.activate(AlertKind::Emergency).await.unwrap();
        assert_eq!(rx.borrow().phase, LifecyclePhase::Active);
    }
}

//! Press-and-drag gesture classification.
//!
//! The interpreter watches a single press on the panic button and turns the
//! horizontal drag into one [`ActivationIntent`] when the finger is released.
//! It never touches the network or storage.

use serde::Deserialize;

use crate::models::AlertKind;

/// Phase of a gesture update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Began,
    Changed,
    Ended,
}

/// One position update from the hosting control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureEvent {
    pub phase: GesturePhase,
    pub horizontal_offset: f64,
}

impl GestureEvent {
    pub fn began() -> Self {
        Self {
            phase: GesturePhase::Began,
            horizontal_offset: 0.0,
        }
    }

    pub fn changed(horizontal_offset: f64) -> Self {
        Self {
            phase: GesturePhase::Changed,
            horizontal_offset,
        }
    }

    pub fn ended(horizontal_offset: f64) -> Self {
        Self {
            phase: GesturePhase::Ended,
            horizontal_offset,
        }
    }
}

/// Discrete outcome of a released gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationIntent {
    Activate(AlertKind),
    Deactivate,
    NoOp,
}

/// Drag distances that turn a release into an activation.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GestureThresholds {
    /// Negative offset at or beyond which a release raises a precaution alert.
    pub precaution: f64,
    /// Positive offset at or beyond which a release raises an emergency alert.
    pub emergency: f64,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self {
            precaution: -100.0,
            emergency: 100.0,
        }
    }
}

#[derive(Debug)]
struct Press {
    active_at_start: bool,
    /// Drag offsets seen so far, kept only while the press lasts.
    offsets: Vec<f64>,
}

impl Press {
    fn start(active_at_start: bool, offset: f64) -> Self {
        Self {
            active_at_start,
            offsets: vec![offset],
        }
    }

    fn record(&mut self, offset: f64) {
        self.offsets.push(offset);
    }
}

/// Classifies press-and-drag interactions.
#[derive(Debug, Default)]
pub struct GestureInterpreter {
    thresholds: GestureThresholds,
    press: Option<Press>,
}

impl GestureInterpreter {
    pub fn new(thresholds: GestureThresholds) -> Self {
        Self {
            thresholds,
            press: None,
        }
    }

    pub fn thresholds(&self) -> GestureThresholds {
        self.thresholds
    }

    /// Feeds one update. Returns an intent only on `Ended`.
    ///
    /// `lifecycle_active` is whether an alert is active right now; it is
    /// latched when the press begins.
    pub fn handle(&mut self, event: GestureEvent, lifecycle_active: bool) -> Option<ActivationIntent> {
        match event.phase {
            GesturePhase::Began => {
                self.press = Some(Press::start(lifecycle_active, event.horizontal_offset));
                None
            }
            GesturePhase::Changed => {
                match self.press.as_mut() {
                    Some(press) => press.record(event.horizontal_offset),
                    None => {
                        self.press = Some(Press::start(lifecycle_active, event.horizontal_offset))
                    }
                }
                None
            }
            GesturePhase::Ended => {
                let active_at_start = self
                    .press
                    .take()
                    .map(|press| press.active_at_start)
                    .unwrap_or(lifecycle_active);
                Some(self.classify(active_at_start, event.horizontal_offset))
            }
        }
    }

    /// Applies the release rules in priority order.
    pub fn classify(&self, active_at_start: bool, terminal_offset: f64) -> ActivationIntent {
        if active_at_start {
            ActivationIntent::Deactivate
        } else if terminal_offset <= self.thresholds.precaution {
            ActivationIntent::Activate(AlertKind::Precaution)
        } else if terminal_offset >= self.thresholds.emergency {
            ActivationIntent::Activate(AlertKind::Emergency)
        } else {
            ActivationIntent::NoOp
        }
    }

    /// True between `Began` and `Ended`; the UI reveals secondary buttons meanwhile.
    pub fn auxiliary_controls_visible(&self) -> bool {
        self.press.is_some()
    }

    /// Latest drag offset of the current press, 0 when idle.
    pub fn current_offset(&self) -> f64 {
        self.press
            .as_ref()
            .and_then(|press| press.offsets.last().copied())
            .unwrap_or(0.0)
    }

    /// Drops the current press without producing an intent.
    pub fn reset(&mut self) {
        self.press = None;
    }
}

//! Command line surface of the panic button.

use std::fmt::Write as _;

use clap::{Parser, Subcommand};
use domain::error::AlertError;
use domain::models::{AlertKind, AlertNotification, AlertRecord, UserRef};
use domain::services::{GestureEvent, GestureOutcome, LifecyclePhase, Transition};

use crate::app::PanicButtonApp;

#[derive(Debug, Parser)]
#[command(name = "panic-button")]
#[command(about = "Panic button - raise and track emergency alerts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the current alert state
    Status,

    /// Raise an alert directly
    Activate {
        /// Alert kind (emergency, precaution)
        kind: AlertKind,
    },

    /// Deactivate the live alert
    Deactivate,

    /// Simulate a press, drag to `offset` and release
    Gesture {
        /// Horizontal drag offset at release; negative is left
        #[arg(long, allow_hyphen_values = true)]
        offset: f64,
    },

    /// Forget the local alert without contacting the server
    Clear,

    /// List alerts, newest first
    History {
        /// Only alerts raised by the signed-in user
        #[arg(long)]
        mine: bool,
    },

    /// Show one alert
    Show {
        /// Alert ID
        id: i64,
    },

    /// Delete an alert
    Delete {
        /// Alert ID
        id: i64,
    },

    /// Alerts close to the configured position
    Nearby {
        /// Search radius in kilometres
        #[arg(long)]
        radius_km: Option<f64>,
    },

    /// Alerts rendered as notifications
    Notifications,

    /// Store the signed-in user
    Login {
        #[arg(long)]
        user_id: i64,

        /// Profile photo reference
        #[arg(long)]
        photo: Option<String>,
    },

    /// Forget the signed-in user
    Logout,
}

/// Runs one command and returns the text to print.
///
/// Rejected transitions are reported as a plain note rather than an error.
pub async fn execute(app: &PanicButtonApp, command: Command) -> anyhow::Result<String> {
    let result = match command {
        Command::Status => Ok(render_status(app)),
        Command::Activate { kind } => app.button().activate(kind).await.map(render_transition),
        Command::Deactivate => app.button().deactivate().await.map(render_transition),
        Command::Clear => app.button().clear().await.map(render_transition),
        Command::Gesture { offset } => run_gesture(app, offset).await,
        Command::History { mine } => history(app, mine).await,
        Command::Show { id } => app.history().get(id).await.map(|a| render_alert(&a)),
        Command::Delete { id } => app
            .history()
            .delete(id)
            .await
            .map(|_| format!("Alert #{} deleted", id)),
        Command::Nearby { radius_km } => nearby(app, radius_km).await,
        Command::Notifications => app
            .history()
            .notifications()
            .await
            .map(|n| render_list(&n, render_notification, "No notifications")),
        Command::Login { user_id, photo } => {
            let mut user = UserRef::new(user_id);
            if let Some(photo) = photo {
                user = user.with_photo(photo);
            }
            app.login(&user)
                .await
                .map(|_| format!("Signed in as user {}", user_id))
        }
        Command::Logout => app.logout().await.map(|_| "Signed out".to_string()),
    };

    match result {
        Ok(output) => Ok(output),
        Err(e) if e.is_silent() => Ok(format!("Nothing to do: {}", e.user_message())),
        Err(e) => {
            let mut message = e.user_message();
            if e.is_retryable() {
                message.push_str(" Running the command again is safe.");
            }
            Err(anyhow::Error::new(e).context(message))
        }
    }
}

async fn run_gesture(app: &PanicButtonApp, offset: f64) -> Result<String, AlertError> {
    let button = app.button();
    button.on_gesture(GestureEvent::began()).await;
    button.on_gesture(GestureEvent::changed(offset)).await;
    match button.on_gesture(GestureEvent::ended(offset)).await {
        Some(GestureOutcome::Dispatched { result, .. }) => result.map(render_transition),
        Some(GestureOutcome::Ignored) | None => {
            Ok("Released inside the thresholds, nothing sent".to_string())
        }
    }
}

async fn history(app: &PanicButtonApp, mine: bool) -> Result<String, AlertError> {
    let alerts = if mine {
        let user = app.current_user().await.ok_or(AlertError::NoIdentity)?;
        app.history().mine(user.id).await?
    } else {
        app.history().all().await?
    };
    Ok(render_list(&alerts, render_alert, "No alerts"))
}

async fn nearby(app: &PanicButtonApp, radius_km: Option<f64>) -> Result<String, AlertError> {
    let origin = app
        .config()
        .fixed_position()
        .ok_or(AlertError::PermissionDenied)?;
    let radius = radius_km.unwrap_or(app.config().history.nearby_radius_km);
    let alerts = app.history().nearby(origin, radius).await?;
    Ok(render_list(&alerts, render_alert, "No alerts nearby"))
}

fn render_status(app: &PanicButtonApp) -> String {
    match (app.button().phase(), app.button().current_alert()) {
        (LifecyclePhase::Idle, _) => "No active alert".to_string(),
        (phase, Some(alert)) => format!("{}: {}", phase, render_alert(&alert)),
        (phase, None) => phase.to_string(),
    }
}

fn render_transition(transition: Transition) -> String {
    let mut out = match &transition.alert {
        Some(alert) => format!("{}: {}", transition.phase, render_alert(alert)),
        None => format!("Alert state is now {}", transition.phase),
    };
    if let Some(warning) = &transition.storage_warning {
        let _ = write!(out, "\nwarning: alert state was not saved locally ({})", warning);
    }
    out
}

fn render_alert(alert: &AlertRecord) -> String {
    format!(
        "#{} {} {} by user {} at {} ({:.5}, {:.5}) {}",
        alert
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "?".to_string()),
        alert.kind,
        if alert.active { "active" } else { "inactive" },
        alert.user_id,
        alert.created_at.format("%Y-%m-%d %H:%M UTC"),
        alert.position.latitude,
        alert.position.longitude,
        alert.message,
    )
}

fn render_notification(notification: &AlertNotification) -> String {
    format!(
        "[{}] {} {} {}: {}",
        notification.category,
        notification.date,
        notification.time,
        notification.title,
        notification.message
    )
}

fn render_list<T>(items: &[T], render: fn(&T) -> String, empty: &str) -> String {
    if items.is_empty() {
        return empty.to_string();
    }
    items.iter().map(render).collect::<Vec<_>>().join("\n")
}

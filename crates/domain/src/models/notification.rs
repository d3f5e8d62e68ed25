//! Notifications derived from alerts for the notification history screen.

use serde::{Deserialize, Serialize};

use crate::models::{AlertKind, AlertRecord};

/// Notification category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    Alert,
    Emergency,
}

impl std::fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationCategory::Alert => write!(f, "alert"),
            NotificationCategory::Emergency => write!(f, "emergency"),
        }
    }
}

/// Read state of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadStatus {
    Unread,
}

/// A notification built from an alert record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertNotification {
    pub id: i64,
    pub category: NotificationCategory,
    pub date: String,
    pub time: String,
    pub title: String,
    pub message: String,
    pub status: ReadStatus,
}

impl AlertNotification {
    /// Converts a confirmed alert into a notification.
    ///
    /// Returns `None` for records that never received a server id.
    pub fn from_alert(alert: &AlertRecord) -> Option<Self> {
        let id = alert.id?;

        let (category, title) = match alert.kind {
            AlertKind::Emergency => (NotificationCategory::Emergency, "Emergency alert"),
            AlertKind::Precaution => (NotificationCategory::Alert, "Precaution alert"),
        };

        let message = if alert.message.trim().is_empty() {
            format!("A {} was reported in the area", alert.kind)
        } else {
            alert.message.clone()
        };

        Some(Self {
            id,
            category,
            date: alert.created_at.format("%d %b %Y").to_string(),
            time: alert.created_at.format("%H:%M").to_string(),
            title: title.to_string(),
            message,
            status: ReadStatus::Unread,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinates;
    use chrono::{TimeZone, Utc};

    fn alert(kind: AlertKind, message: &str, id: Option<i64>) -> AlertRecord {
        AlertRecord {
            id,
            user_id: 1,
            kind,
            message: message.to_string(),
            position: Coordinates::new(-0.22, -78.51),
            created_at: Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap(),
            active: true,
            user_photo_ref: None,
        }
    }

    #[test]
    fn test_emergency_maps_to_emergency_category() {
        let n = AlertNotification::from_alert(&alert(AlertKind::Emergency, "help", Some(4))).unwrap();
        assert_eq!(n.category, NotificationCategory::Emergency);
        assert_eq!(n.title, "Emergency alert");
        assert_eq!(n.message, "help");
        assert_eq!(n.status, ReadStatus::Unread);
    }

    #[test]
    fn test_precaution_maps_to_alert_category() {
        let n = AlertNotification::from_alert(&alert(AlertKind::Precaution, "", Some(5))).unwrap();
        assert_eq!(n.category, NotificationCategory::Alert);
        assert_eq!(n.message, "A precaution was reported in the area");
    }

    #[test]
    fn test_date_and_time_formatting() {
        let n = AlertNotification::from_alert(&alert(AlertKind::Emergency, "x", Some(1))).unwrap();
        assert_eq!(n.date, "09 Mar 2024");
        assert_eq!(n.time, "14:05");
    }

    #[test]
    fn test_unconfirmed_alert_is_skipped() {
        assert!(AlertNotification::from_alert(&alert(AlertKind::Emergency, "x", None)).is_none());
    }

    #[test]
    fn test_category_serialization() {
        let json = serde_json::to_string(&NotificationCategory::Emergency).unwrap();
        assert_eq!(json, "\"emergency\"");
        assert_eq!(NotificationCategory::Alert.to_string(), "alert");
    }
}

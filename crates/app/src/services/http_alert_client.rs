//! HTTP implementation of the remote alert store.
//!
//! Talks to the alert REST API. Wire names are those of the deployed server
//! and are mapped to the domain model at this boundary only.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use domain::error::RemoteError;
use domain::models::{AlertKind, AlertRecord, Coordinates};
use domain::services::AlertRemoteClient;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::config::RemoteConfig;

/// Alert type as spelled by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum WireKind {
    #[serde(rename = "Emergencia")]
    Emergency,
    #[serde(rename = "Precaución", alias = "Precaucion")]
    Precaution,
}

impl From<AlertKind> for WireKind {
    fn from(kind: AlertKind) -> Self {
        match kind {
            AlertKind::Emergency => WireKind::Emergency,
            AlertKind::Precaution => WireKind::Precaution,
        }
    }
}

impl From<WireKind> for AlertKind {
    fn from(kind: WireKind) -> Self {
        match kind {
            WireKind::Emergency => AlertKind::Emergency,
            WireKind::Precaution => AlertKind::Precaution,
        }
    }
}

/// Alert body as sent to and returned by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AlertPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    #[serde(rename = "usuarioId")]
    user_id: i64,
    #[serde(rename = "tipo_alert")]
    kind: WireKind,
    #[serde(rename = "mensaje", default)]
    message: Option<String>,
    #[serde(rename = "latitud")]
    latitude: f64,
    #[serde(rename = "longitud")]
    longitude: f64,
    #[serde(rename = "fecha_alerta", default)]
    created_at: Option<String>,
    #[serde(rename = "estado_alerta", default)]
    active: Option<bool>,
    #[serde(rename = "foto_usuario", default, skip_serializing_if = "Option::is_none")]
    user_photo: Option<String>,
}

impl AlertPayload {
    fn from_record(alert: &AlertRecord) -> Self {
        Self {
            id: alert.id,
            user_id: alert.user_id,
            kind: alert.kind.into(),
            message: Some(alert.message.clone()),
            latitude: alert.position.latitude,
            longitude: alert.position.longitude,
            created_at: Some(alert.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            active: Some(alert.active),
            user_photo: alert.user_photo_ref.clone(),
        }
    }

    fn into_record(self) -> Result<AlertRecord, RemoteError> {
        let created_at = match self.created_at.as_deref() {
            Some(raw) => parse_timestamp(raw).ok_or_else(|| {
                RemoteError::InvalidResponse(format!("unreadable fecha_alerta {:?}", raw))
            })?,
            None => {
                return Err(RemoteError::InvalidResponse(
                    "alert without fecha_alerta".to_string(),
                ))
            }
        };
        let kind = AlertKind::from(self.kind);

        Ok(AlertRecord {
            id: self.id,
            user_id: self.user_id,
            kind,
            message: self
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| kind.default_message().to_string()),
            position: Coordinates::new(self.latitude, self.longitude),
            created_at,
            active: self.active.unwrap_or(false),
            user_photo_ref: self.user_photo,
        })
    }
}

/// Reply to a create. Only the assigned id is read back.
#[derive(Debug, Deserialize)]
struct CreatedAlert {
    #[serde(default)]
    id: Option<i64>,
}

#[derive(Debug, Serialize)]
struct ActivePatch {
    #[serde(rename = "estado_alerta")]
    active: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Accepts RFC 3339, zone-less ISO timestamps (taken as UTC) and plain dates.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Client for the alert REST API.
#[derive(Clone)]
pub struct HttpAlertClient {
    client: Client,
    base_url: String,
    timeout_ms: u64,
}

impl HttpAlertClient {
    /// Create a new client from configuration.
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_ms: config.timeout_ms,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends the request and maps transport failures and non-2xx statuses.
    ///
    /// With `alert_id` set, a 404 becomes `NotFound(alert_id)`.
    async fn send(
        &self,
        operation: &'static str,
        alert_id: Option<i64>,
        request: RequestBuilder,
    ) -> Result<Response, RemoteError> {
        let request_id = Uuid::new_v4().to_string();
        debug!(operation, request_id = %request_id, alert_id = ?alert_id, "Calling alert API");

        let response = request
            .header("X-Request-ID", &request_id)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    warn!(operation, timeout_ms = self.timeout_ms, "Alert API timed out");
                    RemoteError::Timeout(self.timeout_ms)
                } else {
                    error!(operation, error = %e, "Alert API unreachable");
                    RemoteError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if let Some(id) = alert_id.filter(|_| status == StatusCode::NOT_FOUND) {
            debug!(operation, alert_id = id, "Alert not found");
            return Err(RemoteError::NotFound(id));
        }

        let reason = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| status_line(status));
        warn!(operation, status = status.as_u16(), reason = %reason, "Alert API rejected request");
        Err(RemoteError::ServerRejected(reason))
    }

    async fn read_alert(&self, response: Response) -> Result<AlertRecord, RemoteError> {
        response
            .json::<AlertPayload>()
            .await
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))?
            .into_record()
    }

    async fn read_alerts(&self, response: Response) -> Result<Vec<AlertRecord>, RemoteError> {
        response
            .json::<Vec<AlertPayload>>()
            .await
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))?
            .into_iter()
            .map(AlertPayload::into_record)
            .collect()
    }
}

fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

#[async_trait]
impl AlertRemoteClient for HttpAlertClient {
    async fn create(&self, alert: &AlertRecord) -> Result<AlertRecord, RemoteError> {
        let body = AlertPayload::from_record(alert);
        let response = self
            .send("create", None, self.client.post(self.url("/api/alerts/register")).json(&body))
            .await?;
        // the server has stored the alert by now, so the rest of the echo is not required
        let created = response
            .json::<CreatedAlert>()
            .await
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))?;
        Ok(AlertRecord {
            id: created.id,
            ..alert.clone()
        })
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<(), RemoteError> {
        self.send(
            "set_active",
            Some(id),
            self.client
                .put(self.url(&format!("/api/alerts/{}", id)))
                .json(&ActivePatch { active }),
        )
        .await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<AlertRecord>, RemoteError> {
        let response = self
            .send("list", None, self.client.get(self.url("/api/alerts/")))
            .await?;
        self.read_alerts(response).await
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<AlertRecord>, RemoteError> {
        let response = self
            .send(
                "list_for_user",
                None,
                self.client.get(self.url(&format!("/api/alerts/user/{}", user_id))),
            )
            .await?;
        self.read_alerts(response).await
    }

    async fn get_by_id(&self, id: i64) -> Result<AlertRecord, RemoteError> {
        let response = self
            .send(
                "get_by_id",
                Some(id),
                self.client.get(self.url(&format!("/api/alerts/{}", id))),
            )
            .await?;
        self.read_alert(response).await
    }

    async fn delete(&self, id: i64) -> Result<(), RemoteError> {
        self.send(
            "delete",
            Some(id),
            self.client.delete(self.url(&format!("/api/alerts/{}", id))),
        )
        .await?;
        Ok(())
    }
}

//! HTTP alert client against the fake alert API.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use chrono::{TimeZone, Utc};
use common::{wire_alert, FakeAlertServer};
use domain::error::RemoteError;
use domain::models::{AlertKind, AlertRecord, Coordinates, UserRef};
use domain::services::AlertRemoteClient;
use panic_button_app::config::RemoteConfig;
use panic_button_app::services::HttpAlertClient;

fn client(server: &FakeAlertServer, timeout_ms: u64) -> HttpAlertClient {
    HttpAlertClient::new(&RemoteConfig {
        base_url: server.base_url(),
        timeout_ms,
    })
    .unwrap()
}

fn draft(kind: AlertKind) -> AlertRecord {
    AlertRecord::draft(
        &UserRef::new(7).with_photo("photo-7"),
        kind,
        Coordinates::new(-0.22, -78.51),
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    )
}

#[tokio::test]
async fn test_create_posts_server_fields_and_reads_id() {
    let server = FakeAlertServer::start().await.with_next_id(42);
    let client = client(&server, 5000);

    let created = client.create(&draft(AlertKind::Precaution)).await.unwrap();
    assert_eq!(created.id, Some(42));
    assert_eq!(created.kind, AlertKind::Precaution);
    assert_eq!(created.position, Coordinates::new(-0.22, -78.51));
    assert_eq!(
        created.created_at,
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    );

    let stored = server.alert(42).unwrap();
    assert_eq!(stored["usuarioId"], 7);
    assert_eq!(stored["tipo_alert"], "Precaución");
    assert_eq!(stored["mensaje"], AlertKind::Precaution.default_message());
    assert_eq!(stored["estado_alerta"], true);
    assert_eq!(stored["foto_usuario"], "photo-7");
    assert_eq!(server.requests(), vec!["POST /api/alerts/register"]);
}

#[tokio::test]
async fn test_create_accepts_id_only_reply() {
    let server = FakeAlertServer::start().await.with_next_id(42);
    server.terse_create();
    let client = client(&server, 5000);

    let sent = draft(AlertKind::Emergency);
    let created = client.create(&sent).await.unwrap();
    assert_eq!(created.id, Some(42));
    assert_eq!(created.kind, sent.kind);
    assert_eq!(created.position, sent.position);
    assert_eq!(created.created_at, sent.created_at);
    assert!(server.alert(42).is_some());
}

#[tokio::test]
async fn test_set_active_sends_partial_update() {
    let server = FakeAlertServer::start().await;
    server.seed(wire_alert(5, 7, "Emergencia", 0.0, 0.0, "2024-06-01T08:00:00"));
    let client = client(&server, 5000);

    client.set_active(5, true).await.unwrap();
    let stored = server.alert(5).unwrap();
    assert_eq!(stored["estado_alerta"], true);
    assert_eq!(stored["mensaje"], "alert 5");

    assert_eq!(
        client.set_active(99, false).await.unwrap_err(),
        RemoteError::NotFound(99)
    );
}

#[tokio::test]
async fn test_list_and_filters() {
    let server = FakeAlertServer::start().await;
    server.seed(wire_alert(1, 7, "Emergencia", -0.22, -78.51, "2024-06-01T08:00:00Z"));
    server.seed(wire_alert(2, 8, "Precaución", -0.21, -78.50, "2024-06-01T12:00:00"));
    let client = client(&server, 5000);

    let all = client.list().await.unwrap();
    assert_eq!(all.len(), 2);

    let mine = client.list_for_user(8).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].kind, AlertKind::Precaution);

    let one = client.get_by_id(1).await.unwrap();
    assert_eq!(one.user_id, 7);
    assert_eq!(one.message, "alert 1");
}

#[tokio::test]
async fn test_get_and_delete_missing_alert() {
    let server = FakeAlertServer::start().await;
    server.seed(wire_alert(3, 7, "Emergencia", 0.0, 0.0, "2024-06-01"));
    let client = client(&server, 5000);

    assert_eq!(
        client.get_by_id(12).await.unwrap_err(),
        RemoteError::NotFound(12)
    );
    client.delete(3).await.unwrap();
    assert!(server.alerts().is_empty());
    assert_eq!(client.delete(3).await.unwrap_err(), RemoteError::NotFound(3));
}

#[tokio::test]
async fn test_rejection_uses_server_message() {
    let server = FakeAlertServer::start().await;
    let client = client(&server, 5000);

    server.reject_next(StatusCode::BAD_REQUEST, Some("Usuario no existe"));
    assert_eq!(
        client.create(&draft(AlertKind::Emergency)).await.unwrap_err(),
        RemoteError::ServerRejected("Usuario no existe".to_string())
    );

    server.reject_next(StatusCode::INTERNAL_SERVER_ERROR, None);
    assert_eq!(
        client.list().await.unwrap_err(),
        RemoteError::ServerRejected("500 Internal Server Error".to_string())
    );
    assert!(server.alerts().is_empty());
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = FakeAlertServer::start().await;
    server.slow_down(Duration::from_millis(500));
    let client = client(&server, 100);

    assert_eq!(
        client.create(&draft(AlertKind::Emergency)).await.unwrap_err(),
        RemoteError::Timeout(100)
    );
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpAlertClient::new(&RemoteConfig {
        base_url: format!("http://{}", addr),
        timeout_ms: 2000,
    })
    .unwrap();

    assert!(matches!(
        client.list().await.unwrap_err(),
        RemoteError::Network(_)
    ));
}

#[tokio::test]
async fn test_garbage_body_is_invalid_response() {
    let server = FakeAlertServer::start().await;
    server.seed(serde_json::json!({ "id": 1, "usuarioId": "seven" }));
    let client = client(&server, 5000);

    assert!(matches!(
        client.list().await.unwrap_err(),
        RemoteError::InvalidResponse(_)
    ));
}

//! Common test utilities for integration tests.
//!
//! Runs an in-process fake of the alert REST API on an ephemeral port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use panic_button_app::config::Config;
use serde_json::{json, Value};

#[derive(Default)]
struct FakeState {
    alerts: Vec<Value>,
    next_id: i64,
    reject_next: Option<(StatusCode, Option<String>)>,
    delay: Option<Duration>,
    terse_create: bool,
    requests: Vec<String>,
}

/// Handle on a running fake alert server.
#[derive(Clone)]
pub struct FakeAlertServer {
    pub addr: SocketAddr,
    state: Arc<Mutex<FakeState>>,
}

impl FakeAlertServer {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(FakeState {
            next_id: 1,
            ..FakeState::default()
        }));

        let router = Router::new()
            .route("/api/alerts/register", post(register))
            .route("/api/alerts/", get(list))
            .route("/api/alerts/user/:user_id", get(list_for_user))
            .route(
                "/api/alerts/:id",
                get(get_one).put(update).delete(remove),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake server");
        let addr = listener.local_addr().expect("Failed to read local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Config pointing at this server with an in-memory store and a fixed position.
    pub fn config(&self) -> Config {
        Config::load_for_test(&[
            ("remote.base_url", self.base_url().as_str()),
            ("storage.url", "sqlite::memory:"),
            ("storage.max_connections", "1"),
            ("storage.min_connections", "1"),
            ("location.enabled", "true"),
            ("location.latitude", "-0.22"),
            ("location.longitude", "-78.51"),
        ])
        .expect("Failed to load config")
    }

    pub fn with_next_id(self, id: i64) -> Self {
        self.state.lock().unwrap().next_id = id;
        self
    }

    pub fn seed(&self, alert: Value) {
        self.state.lock().unwrap().alerts.push(alert);
    }

    /// Makes the next request fail with `status` and an optional `message` body.
    pub fn reject_next(&self, status: StatusCode, message: Option<&str>) {
        self.state.lock().unwrap().reject_next = Some((status, message.map(str::to_string)));
    }

    /// Answers creates with `{"id": ..}` only, without echoing the alert.
    pub fn terse_create(&self) {
        self.state.lock().unwrap().terse_create = true;
    }

    /// Delays every response by `delay`.
    pub fn slow_down(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    pub fn alerts(&self) -> Vec<Value> {
        self.state.lock().unwrap().alerts.clone()
    }

    pub fn alert(&self, id: i64) -> Option<Value> {
        self.alerts().into_iter().find(|a| a["id"] == id)
    }

    /// Requests seen so far, as "METHOD path".
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }
}

type Shared = Arc<Mutex<FakeState>>;

/// Records the request, applies the configured delay and any pending rejection.
async fn intercept(state: &Shared, request: String) -> Option<Response> {
    let (delay, rejection) = {
        let mut s = state.lock().unwrap();
        s.requests.push(request);
        (s.delay, s.reject_next.take())
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    rejection.map(|(status, message)| match message {
        Some(message) => (status, Json(json!({ "message": message }))).into_response(),
        None => status.into_response(),
    })
}

async fn register(State(state): State<Shared>, Json(mut body): Json<Value>) -> Response {
    if let Some(rejected) = intercept(&state, "POST /api/alerts/register".into()).await {
        return rejected;
    }
    let mut s = state.lock().unwrap();
    let id = s.next_id;
    body["id"] = json!(id);
    s.next_id += 1;
    s.alerts.push(body.clone());
    if s.terse_create {
        return (StatusCode::CREATED, Json(json!({ "id": id }))).into_response();
    }
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn list(State(state): State<Shared>) -> Response {
    if let Some(rejected) = intercept(&state, "GET /api/alerts/".into()).await {
        return rejected;
    }
    Json(state.lock().unwrap().alerts.clone()).into_response()
}

async fn list_for_user(State(state): State<Shared>, Path(user_id): Path<i64>) -> Response {
    if let Some(rejected) = intercept(&state, format!("GET /api/alerts/user/{}", user_id)).await {
        return rejected;
    }
    let alerts: Vec<Value> = state
        .lock()
        .unwrap()
        .alerts
        .iter()
        .filter(|a| a["usuarioId"] == user_id)
        .cloned()
        .collect();
    Json(alerts).into_response()
}

async fn get_one(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    if let Some(rejected) = intercept(&state, format!("GET /api/alerts/{}", id)).await {
        return rejected;
    }
    let s = state.lock().unwrap();
    match s.alerts.iter().find(|a| a["id"] == id) {
        Some(alert) => Json(alert.clone()).into_response(),
        None => not_found(),
    }
}

async fn update(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(patch): Json<Value>,
) -> Response {
    if let Some(rejected) = intercept(&state, format!("PUT /api/alerts/{}", id)).await {
        return rejected;
    }
    let mut s = state.lock().unwrap();
    let Some(alert) = s.alerts.iter_mut().find(|a| a["id"] == id) else {
        return not_found();
    };
    if let (Some(target), Some(fields)) = (alert.as_object_mut(), patch.as_object()) {
        for (key, value) in fields {
            target.insert(key.clone(), value.clone());
        }
    }
    Json(alert.clone()).into_response()
}

async fn remove(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    if let Some(rejected) = intercept(&state, format!("DELETE /api/alerts/{}", id)).await {
        return rejected;
    }
    let mut s = state.lock().unwrap();
    let before = s.alerts.len();
    s.alerts.retain(|a| a["id"] != id);
    if s.alerts.len() == before {
        return not_found();
    }
    StatusCode::NO_CONTENT.into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "Alerta no encontrada" })),
    )
        .into_response()
}

/// An alert body as the server stores it.
pub fn wire_alert(id: i64, user_id: i64, kind: &str, lat: f64, lon: f64, date: &str) -> Value {
    json!({
        "id": id,
        "usuarioId": user_id,
        "tipo_alert": kind,
        "mensaje": format!("alert {}", id),
        "latitud": lat,
        "longitud": lon,
        "fecha_alerta": date,
        "estado_alerta": false,
    })
}

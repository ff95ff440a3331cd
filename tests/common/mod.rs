// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared test fixtures: an in-process mock backend and session builders.

use axum::{
    extract::{Path, RawQuery, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use transfleet_dashboard::navigation::{NavigationError, Navigator, Route};
use transfleet_dashboard::services::ApiClient;
use transfleet_dashboard::storage::MemoryStorage;
use transfleet_dashboard::time_utils::{Clock, SystemClock};
use transfleet_dashboard::SessionContext;

#[derive(Default)]
struct MockState {
    responses: Mutex<HashMap<&'static str, (u16, Value)>>,
    hits: Mutex<HashMap<&'static str, usize>>,
    last_auth: Mutex<Option<String>>,
    last_query: Mutex<Option<String>>,
    last_path: Mutex<Option<String>>,
    last_body: Mutex<Option<Value>>,
}

impl MockState {
    fn respond(&self, route: &'static str, headers: &HeaderMap) -> (StatusCode, Json<Value>) {
        *self.hits.lock().unwrap().entry(route).or_default() += 1;
        *self.last_auth.lock().unwrap() = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let (status, body) = self
            .responses
            .lock()
            .unwrap()
            .get(route)
            .cloned()
            .unwrap_or((404, json!({ "message": "no canned response" })));

        (StatusCode::from_u16(status).unwrap(), Json(body))
    }
}

/// Backend double served on an ephemeral localhost port.
pub struct MockBackend {
    pub base_url: String,
    state: Arc<MockState>,
}

#[allow(dead_code)]
impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());

        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/profile", get(profile))
            .route("/api/orders", get(orders))
            .route("/api/orders/{id}", get(order))
            .route("/api/riders", get(riders))
            .route("/api/collection-centers", get(centers))
            .route("/api/hospitals", get(hospitals))
            .route("/api/sla/metrics", get(sla))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api", addr),
            state,
        }
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(self.base_url.clone()).unwrap()
    }

    /// Set the canned reply for a route name (`login`, `profile`, `orders`, ...).
    pub fn respond(&self, route: &'static str, status: u16, body: Value) {
        self.state
            .responses
            .lock()
            .unwrap()
            .insert(route, (status, body));
    }

    pub fn hits(&self, route: &'static str) -> usize {
        self.state
            .hits
            .lock()
            .unwrap()
            .get(route)
            .copied()
            .unwrap_or(0)
    }

    pub fn last_auth(&self) -> Option<String> {
        self.state.last_auth.lock().unwrap().clone()
    }

    pub fn last_query(&self) -> Option<String> {
        self.state.last_query.lock().unwrap().clone()
    }

    pub fn last_path(&self) -> Option<String> {
        self.state.last_path.lock().unwrap().clone()
    }

    pub fn last_body(&self) -> Option<Value> {
        self.state.last_body.lock().unwrap().clone()
    }
}

type Reply = (StatusCode, Json<Value>);

async fn login(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    *state.last_body.lock().unwrap() = Some(body);
    state.respond("login", &headers)
}

async fn profile(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Reply {
    state.respond("profile", &headers)
}

async fn orders(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Reply {
    *state.last_query.lock().unwrap() = query;
    state.respond("orders", &headers)
}

async fn order(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    *state.last_path.lock().unwrap() = Some(id);
    state.respond("order", &headers)
}

async fn riders(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Reply {
    state.respond("riders", &headers)
}

async fn centers(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Reply {
    state.respond("centers", &headers)
}

async fn hospitals(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Reply {
    state.respond("hospitals", &headers)
}

async fn sla(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Reply {
    state.respond("sla", &headers)
}

/// Navigator that remembers every redirect.
#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

#[allow(dead_code)]
impl RecordingNavigator {
    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Route> {
        self.routes.lock().unwrap().last().copied()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) -> Result<(), NavigationError> {
        self.routes.lock().unwrap().push(route);
        Ok(())
    }
}

/// Everything a gate test needs to poke at.
#[allow(dead_code)]
pub struct TestSession {
    pub ctx: Arc<SessionContext>,
    pub local: Arc<MemoryStorage>,
    pub session_storage: Arc<MemoryStorage>,
    pub navigator: Arc<RecordingNavigator>,
}

#[allow(dead_code)]
pub fn test_session(backend: &MockBackend) -> TestSession {
    test_session_with_clock(backend, Arc::new(SystemClock))
}

#[allow(dead_code)]
pub fn test_session_with_clock(backend: &MockBackend, clock: Arc<dyn Clock>) -> TestSession {
    let local = Arc::new(MemoryStorage::new());
    let session_storage = Arc::new(MemoryStorage::new());
    let navigator = Arc::new(RecordingNavigator::default());

    let ctx = Arc::new(SessionContext::new(
        backend.client(),
        local.clone(),
        session_storage.clone(),
        clock,
        navigator.clone(),
    ));

    TestSession {
        ctx,
        local,
        session_storage,
        navigator,
    }
}

/// Create a signed session token expiring `expires_in_secs` from now
/// (negative for an already expired token).
#[allow(dead_code)]
pub fn create_test_jwt(user_id: u64, expires_in_secs: i64) -> String {
    #[derive(Serialize)]
    struct Claims {
        sub: String,
        exp: i64,
        iat: i64,
        user_type: &'static str,
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + expires_in_secs,
        iat: now,
        user_type: "hospital",
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"test_signing_key_32_bytes_long!!"),
    )
    .expect("Failed to create JWT")
}

/// Sign arbitrary claims, for tokens shaped differently from `create_test_jwt`.
#[allow(dead_code)]
pub fn create_test_jwt_with_claims(claims: &Value) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(b"test_signing_key_32_bytes_long!!"),
    )
    .expect("Failed to create JWT")
}

/// Seconds since the epoch, as used in token claims.
#[allow(dead_code)]
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

/// JSON for a hospital user with the given status fields.
#[allow(dead_code)]
pub fn hospital_user(status: &str, network_status: Option<&str>) -> Value {
    json!({
        "id": 101,
        "email": "lab@stmary.example",
        "name": "St Mary Lab Desk",
        "user_type": "hospital",
        "status": status,
        "network_status": network_status,
        "hospital_id": 17,
        "hospital_name": "St Mary General"
    })
}

/// JSON for a successful login.
#[allow(dead_code)]
pub fn login_body(token: &str, user: Value, billing: Option<Value>) -> Value {
    let mut body = json!({ "access_token": token, "user": user });
    if let Some(billing) = billing {
        body["billing_status"] = billing;
    }
    body
}

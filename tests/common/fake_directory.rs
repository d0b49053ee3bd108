//! reqres-shaped HTTP directory served by axum on an ephemeral port.
//!
//! Every request is recorded with its method, URI and credential headers so
//! tests can assert on exactly what the client sent.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{Value, json};

use userdeck::types::UserRecord;

pub const TOKEN: &str = "QpwL5tke4Pnpja7X4";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub uri: String,
    pub authorization: Option<String>,
    pub api_key: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct FakeState {
    users: Vec<UserRecord>,
    per_page: usize,
    require_token: bool,
    requests: Vec<RecordedRequest>,
}

#[derive(Clone, Default)]
pub struct FakeDirectory {
    state: Arc<Mutex<FakeState>>,
}

impl FakeDirectory {
    pub fn new(users: Vec<UserRecord>, per_page: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                users,
                per_page,
                ..FakeState::default()
            })),
        }
    }

    /// Answer 401 to directory calls that lack `Authorization: Bearer TOKEN`.
    pub fn require_token(self) -> Self {
        self.state.lock().require_token = true;
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    pub fn uris(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.uri).collect()
    }

    /// Bind to `127.0.0.1:0` and serve in the background. Returns the API base URL.
    pub async fn spawn(&self) -> String {
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0))
            .await
            .expect("bind fake directory");
        let addr = listener.local_addr().expect("local addr");

        let router = Router::new()
            .route("/api/login", post(login))
            .route("/api/users", get(list_users))
            .route("/api/users/{id}", put(update_user).delete(delete_user))
            .with_state(self.clone());

        tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, router).await {
                eprintln!("fake directory stopped: {err}");
            }
        });

        format!("http://{addr}/api")
    }

    fn record(&self, method: &Method, uri: &Uri, headers: &HeaderMap, body: Option<Value>) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.state.lock().requests.push(RecordedRequest {
            method: method.to_string(),
            uri: uri.to_string(),
            authorization: header("authorization"),
            api_key: header("x-api-key"),
            body,
        });
    }

    fn admit(&self, headers: &HeaderMap) -> Result<(), Response> {
        if !self.state.lock().require_token {
            return Ok(());
        }
        let expected = format!("Bearer {TOKEN}");
        let presented = headers.get("authorization").and_then(|v| v.to_str().ok());
        if presented == Some(expected.as_str()) {
            Ok(())
        } else {
            Err(error(StatusCode::UNAUTHORIZED, "Missing or invalid token"))
        }
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

#[derive(Deserialize)]
struct PageQuery {
    page: Option<usize>,
}

async fn login(
    State(fake): State<FakeDirectory>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    fake.record(&method, &uri, &headers, Some(body.clone()));

    let email = body.get("email").and_then(Value::as_str).unwrap_or_default();
    let password = body
        .get("password")
        .and_then(Value::as_str)
        .unwrap_or_default();

    if password.is_empty() {
        return error(StatusCode::BAD_REQUEST, "Missing password");
    }
    if email != "eve.holt@reqres.in" {
        return error(StatusCode::BAD_REQUEST, "user not found");
    }
    Json(json!({ "token": TOKEN })).into_response()
}

async fn list_users(
    State(fake): State<FakeDirectory>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Response {
    fake.record(&method, &uri, &headers, None);
    if let Err(denied) = fake.admit(&headers) {
        return denied;
    }

    let state = fake.state.lock();
    let per_page = state.per_page.max(1);
    let page = query.page.unwrap_or(1).max(1);
    let total_pages = state.users.len().div_ceil(per_page);
    let data: Vec<&UserRecord> = state
        .users
        .iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();

    Json(json!({
        "page": page,
        "per_page": per_page,
        "total": state.users.len(),
        "total_pages": total_pages,
        "data": data,
        "support": { "url": "https://reqres.in/#support-heading" }
    }))
    .into_response()
}

/// Echoes the sent fields plus `updatedAt`, like reqres. Nothing is persisted.
async fn update_user(
    State(fake): State<FakeDirectory>,
    Path(id): Path<u64>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    fake.record(&method, &uri, &headers, Some(body.clone()));
    if let Err(denied) = fake.admit(&headers) {
        return denied;
    }
    if !fake.state.lock().users.iter().any(|u| u.id.get() == id) {
        return (StatusCode::NOT_FOUND, Json(json!({}))).into_response();
    }

    let mut echo = body;
    if let Some(fields) = echo.as_object_mut() {
        fields.insert("updatedAt".to_string(), json!("2024-05-01T12:00:00.000Z"));
    }
    Json(echo).into_response()
}

async fn delete_user(
    State(fake): State<FakeDirectory>,
    Path(id): Path<u64>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    fake.record(&method, &uri, &headers, None);
    if let Err(denied) = fake.admit(&headers) {
        return denied;
    }
    if !fake.state.lock().users.iter().any(|u| u.id.get() == id) {
        return (StatusCode::NOT_FOUND, Json(json!({}))).into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

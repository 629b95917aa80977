use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Query accepted by `POST /release/newVersions`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewVersionsQuery {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    #[serde(default)]
    pub added_values: Vec<String>,
}

/// Answer to a `NewVersionsQuery`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewVersionsReply {
    pub group_id: String,
    pub artifact_id: String,
    pub current: String,
    pub newer_versions: Vec<String>,
    pub added_values: Value,
}

/// Knobs for simulating an unhealthy server.
#[derive(Clone, Copy, Debug)]
pub struct MockOptions {
    /// Status answered by `GET /`.
    pub root_status: StatusCode,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            root_status: StatusCode::OK,
        }
    }
}

pub fn app() -> Router {
    app_with(MockOptions::default())
}

pub fn app_with(options: MockOptions) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/release/newVersions", post(new_versions))
        .route("/echo", post(echo))
        .route("/status/{code}", post(status))
        .route("/not-json", post(not_json))
        .route("/array", post(array))
        .with_state(Arc::new(options))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with(listener: TcpListener, options: MockOptions) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(options)).await
}

async fn root(State(options): State<Arc<MockOptions>>) -> (StatusCode, &'static str) {
    (options.root_status, "release service")
}

async fn new_versions(Json(query): Json<NewVersionsQuery>) -> Json<NewVersionsReply> {
    let added_values = query
        .added_values
        .iter()
        .map(|name| (name.clone(), added_value(name)))
        .collect::<serde_json::Map<_, _>>();
    Json(NewVersionsReply {
        newer_versions: newer_versions(&query.version),
        group_id: query.group_id,
        artifact_id: query.artifact_id,
        current: query.version,
        added_values: Value::Object(added_values),
    })
}

async fn echo(Json(body): Json<Value>) -> Json<Value> {
    Json(body)
}

async fn status(Path(code): Path<u16>) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((status, Json(json!({ "ok": status.is_success(), "status": code }))))
}

async fn not_json() -> &'static str {
    "definitely not json"
}

async fn array() -> Json<Value> {
    Json(json!([1, 2, 3]))
}

/// Next two patch versions and the next minor, for dotted numeric versions.
fn newer_versions(version: &str) -> Vec<String> {
    let parts: Option<Vec<u64>> = version.split('.').map(|p| p.parse().ok()).collect();
    match parts.as_deref() {
        Some([major, minor, patch]) => vec![
            format!("{major}.{minor}.{}", patch + 1),
            format!("{major}.{minor}.{}", patch + 2),
            format!("{major}.{}.0", minor + 1),
        ],
        _ => Vec::new(),
    }
}

fn added_value(name: &str) -> Value {
    match name {
        "CVE" => json!([]),
        "FRESHNESS" => json!({ "numberMissedRelease": 3, "outdatedTimeInMs": 0 }),
        "POPULARITY_1_YEAR" => json!(0),
        _ => Value::Null,
    }
}

use super::AppState;
use crate::config::parse_bool;
use crate::error::LikeError;
use crate::platform::state::{RunState, TIMESTAMP_FORMAT};
use crate::platform::task::{BatchSummary, REASON_MANUAL};
use crate::session::{SessionHealth, clamp_like_times, probe_health};
use crate::transport::http::ApiError;
use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Json},
};
use serde_json::{Map, Value, json};

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Request bodies are read leniently: an empty or malformed body counts
/// as `{}`.
fn json_object(body: &Bytes) -> Map<String, Value> {
    if body.is_empty() {
        return Map::new();
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            tracing::debug!("ignoring non-object request body");
            Map::new()
        }
    }
}

fn text_field(body: &Map<String, Value>, key: &str) -> Option<String> {
    let text = match body.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Integer-ish `times`: numbers (fractions truncated) or numeric strings.
#[allow(clippy::cast_possible_truncation)]
fn times_field(body: &Map<String, Value>) -> Option<i64> {
    match body.get("times")? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn run_times(body: &Map<String, Value>) -> u32 {
    let times = times_field(body).unwrap_or(1).clamp(1, 10);
    clamp_like_times(u32::try_from(times).unwrap_or(1))
}

/// GET /health
pub(super) async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "runtime": state.health.snapshot_json(),
    }))
}

/// GET /api/config
pub(super) async fn handle_config(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.instance.as_ref().clone())
}

/// GET /api/state
pub(super) async fn handle_state(State(state): State<AppState>) -> Json<RunState> {
    Json(state.executor.store().get())
}

/// GET /api/next_run
pub(super) async fn handle_next_run(State(state): State<AppState>) -> impl IntoResponse {
    let next_run = state
        .scheduler
        .next_run()
        .map(|at| at.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default();
    Json(json!({ "next_run": next_run }))
}

/// GET /api/napcat
pub(super) async fn handle_napcat(State(state): State<AppState>) -> Json<SessionHealth> {
    Json(probe_health(state.executor.session().as_ref()).await)
}

/// GET /api/friends
pub(super) async fn handle_friends(State(state): State<AppState>) -> ApiResult<Value> {
    let friends = state.executor.session().get_friend_list().await?;
    Ok(Json(json!({ "friends": friends })))
}

/// POST /api/toggle_schedule
pub(super) async fn handle_toggle_schedule(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<RunState> {
    let body = json_object(&body);
    let enabled = match body.get("enabled") {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(raw)) => parse_bool(raw),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(_) | None => {
            return Err(LikeError::invalid_argument("`enabled` must be a boolean").into());
        }
    };
    let updated = state.executor.store().set_schedule_enabled(enabled);
    tracing::info!(enabled, "schedule switch toggled");
    Ok(Json(updated))
}

/// POST /api/run
pub(super) async fn handle_run(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<BatchSummary> {
    let body = json_object(&body);
    let times = run_times(&body);
    let reason = text_field(&body, "reason").unwrap_or_else(|| REASON_MANUAL.to_string());

    let summary = match text_field(&body, "user_id") {
        Some(user_id) => state.executor.run_one(&user_id, times, &reason).await?,
        None => state.executor.run_all(times, &reason).await?,
    };
    Ok(Json(summary))
}

/// POST /api/like_once
pub(super) async fn handle_like_once(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<BatchSummary> {
    let body = json_object(&body);
    let summary = match text_field(&body, "user_id") {
        Some(user_id) => state.executor.run_one(&user_id, 1, REASON_MANUAL).await?,
        None => state.executor.run_all(1, REASON_MANUAL).await?,
    };
    Ok(Json(summary))
}

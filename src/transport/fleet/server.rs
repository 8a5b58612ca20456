use super::{FleetClient, FleetCommand};
use crate::diagnostics::HealthRegistry;
use crate::platform::state::{TIMESTAMP_FORMAT, local_now};
use crate::transport::auth::{SharedSecret, require_secret};
use crate::transport::http::{ApiError, fallback_not_found, parse_bind_addr, with_common_layers};
use anyhow::{Context, Result};
use axum::{
    Router,
    body::Bytes,
    extract::{Query, State},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

#[derive(Clone)]
pub struct ManagerState {
    pub fleet: Arc<FleetClient>,
    pub health: Arc<HealthRegistry>,
    pub secret: SharedSecret,
}

impl ManagerState {
    pub fn new(fleet: Arc<FleetClient>, health: Arc<HealthRegistry>, token: Option<&str>) -> Self {
        Self {
            fleet,
            health,
            secret: SharedSecret::new(token),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct BotQuery {
    #[serde(default)]
    name: String,
}

/// Run the manager API on `host:port`.
pub async fn run_manager(
    host: &str,
    port: u16,
    state: ManagerState,
    cors_origins: &[String],
) -> Result<()> {
    let addr = parse_bind_addr(host, port).context("parse manager bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind manager socket {addr}"))?;

    run_manager_with_listener(listener, state, cors_origins).await
}

pub async fn run_manager_with_listener(
    listener: tokio::net::TcpListener,
    state: ManagerState,
    cors_origins: &[String],
) -> Result<()> {
    let addr = listener
        .local_addr()
        .context("get manager listener local address")?;
    tracing::info!(%addr, bots = state.fleet.members().len(), "manager API listening");

    state.health.mark_ok("manager");
    let app = build_manager_app(state, cors_origins);
    axum::serve(listener, app)
        .await
        .context("serve manager API")?;

    Ok(())
}

pub fn build_manager_app(state: ManagerState, cors_origins: &[String]) -> Router {
    let api = Router::new()
        .route("/api/bots", get(handle_bots))
        .route("/api/bot/toggle_schedule", post(handle_toggle_schedule))
        .route("/api/bot/run", post(handle_run))
        .route_layer(middleware::from_fn_with_state(
            state.secret.clone(),
            require_secret,
        ));

    let app = api
        .route("/health", get(handle_health))
        .fallback(fallback_not_found)
        .with_state(state);

    with_common_layers(app, cors_origins)
}

fn body_value(body: &Bytes) -> Value {
    match serde_json::from_slice::<Value>(body) {
        Ok(value @ Value::Object(_)) => value,
        _ => json!({}),
    }
}

async fn handle_health(State(state): State<ManagerState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "runtime": state.health.snapshot_json(),
    }))
}

/// GET /api/bots
async fn handle_bots(State(state): State<ManagerState>) -> impl IntoResponse {
    let bots = state.fleet.list_snapshot().await;
    Json(json!({
        "now": local_now().format(TIMESTAMP_FORMAT).to_string(),
        "bots": bots,
    }))
}

/// POST /api/bot/toggle_schedule?name=
async fn handle_toggle_schedule(
    State(state): State<ManagerState>,
    Query(query): Query<BotQuery>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let body = body_value(&body);
    let enabled = body.get("enabled").cloned().unwrap_or(Value::Bool(true));
    let answer = state
        .fleet
        .forward(
            &query.name,
            FleetCommand::ToggleSchedule,
            json!({ "enabled": enabled }),
        )
        .await?;
    Ok(Json(answer))
}

/// POST /api/bot/run?name=
async fn handle_run(
    State(state): State<ManagerState>,
    Query(query): Query<BotQuery>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let answer = state
        .fleet
        .forward(&query.name, FleetCommand::Run, body_value(&body))
        .await?;
    Ok(Json(answer))
}

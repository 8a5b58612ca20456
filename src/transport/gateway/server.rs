use super::AppState;
use super::handlers::{
    handle_config, handle_friends, handle_health, handle_like_once, handle_napcat,
    handle_next_run, handle_run, handle_state, handle_toggle_schedule,
};
use crate::transport::auth::require_secret;
use crate::transport::http::{fallback_not_found, parse_bind_addr, with_common_layers};
use anyhow::{Context, Result};
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// Run the admin API on `host:port`.
pub async fn run_gateway(
    host: &str,
    port: u16,
    state: AppState,
    cors_origins: &[String],
) -> Result<()> {
    let addr = parse_bind_addr(host, port).context("parse admin bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind admin socket {addr}"))?;

    run_gateway_with_listener(listener, state, cors_origins).await
}

/// Run the admin API from a pre-bound listener.
pub async fn run_gateway_with_listener(
    listener: tokio::net::TcpListener,
    state: AppState,
    cors_origins: &[String],
) -> Result<()> {
    let addr = listener
        .local_addr()
        .context("get admin listener local address")?;
    tracing::info!(
        %addr,
        auth = if state.secret.is_open() { "open" } else { "token" },
        "admin API listening"
    );

    state.health.mark_ok("gateway");
    let app = build_app(state, cors_origins);
    axum::serve(listener, app)
        .await
        .context("serve admin API")?;

    Ok(())
}

pub fn build_app(state: AppState, cors_origins: &[String]) -> Router {
    let api = Router::new()
        .route("/api/config", get(handle_config))
        .route("/api/state", get(handle_state))
        .route("/api/next_run", get(handle_next_run))
        .route("/api/napcat", get(handle_napcat))
        .route("/api/friends", get(handle_friends))
        .route("/api/toggle_schedule", post(handle_toggle_schedule))
        .route("/api/run", post(handle_run))
        .route("/api/like_once", post(handle_like_once))
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

use crate::instance::{AdminServer, napcat_logged_in, wait_until_ready};
use likebot::config::FleetMember;
use likebot::diagnostics::HealthRegistry;
use likebot::transport::fleet::{FleetClient, ManagerState, run_manager_with_listener};
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

struct ManagerServer {
    port: u16,
    handle: tokio::task::JoinHandle<anyhow::Result<()>>,
}

impl ManagerServer {
    async fn start(bots: &[(&str, String)], instance_token: Option<&str>) -> Self {
        let members = bots
            .iter()
            .map(|(name, url)| FleetMember::parse(&format!("{name}={url}")))
            .collect::<anyhow::Result<Vec<_>>>()
            .expect("fleet directory should parse");
        let fleet = FleetClient::new(members, Duration::from_secs(2), instance_token);
        let state = ManagerState::new(Arc::new(fleet), Arc::new(HealthRegistry::new()), None);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("ephemeral manager listener should bind");
        let port = listener
            .local_addr()
            .expect("ephemeral manager listener should expose local address")
            .port();
        let handle =
            tokio::spawn(async move { run_manager_with_listener(listener, state, &[]).await });
        wait_until_ready(port).await;

        Self { port, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{path}", self.port)
    }
}

impl Drop for ManagerServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn snapshot_spans_live_and_dead_instances() {
    let napcat = napcat_logged_in().await;
    let first = AdminServer::start(&napcat.uri(), |_| {}).await;
    let third = AdminServer::start(&napcat.uri(), |config| {
        config.bot.schedule_enabled = false;
    })
    .await;

    let manager = ManagerServer::start(
        &[
            ("one", first.base_url()),
            ("two", "http://127.0.0.1:1".to_string()),
            ("three", third.base_url()),
        ],
        None,
    )
    .await;

    let body: Value = reqwest::get(manager.url("/api/bots"))
        .await
        .expect("bots request should complete")
        .json()
        .await
        .expect("bots should be json");

    let bots = body["bots"].as_array().expect("bots should be a list");
    assert_eq!(bots.len(), 3);
    assert_eq!(bots[0]["name"], "one");
    assert_eq!(bots[0]["error"], "");
    assert_eq!(bots[0]["next_run"], "2026-05-10 09:00:00");
    assert_eq!(bots[0]["napcat"]["login"]["data"]["user_id"], 20001);

    assert_eq!(bots[1]["name"], "two");
    assert!(!bots[1]["error"].as_str().unwrap().is_empty());
    assert_eq!(bots[1]["state"], json!({}));

    assert_eq!(bots[2]["error"], "");
    assert_eq!(bots[2]["state"]["schedule_enabled"], false);
}

#[tokio::test]
async fn commands_are_relayed_to_the_named_instance() {
    let napcat = napcat_logged_in().await;
    let bot = AdminServer::start(&napcat.uri(), |_| {}).await;
    let manager = ManagerServer::start(&[("alpha", bot.base_url())], None).await;
    let client = reqwest::Client::new();

    let toggled: Value = client
        .post(manager.url("/api/bot/toggle_schedule?name=alpha"))
        .json(&json!({"enabled": false}))
        .send()
        .await
        .expect("toggle request should complete")
        .json()
        .await
        .expect("toggle answer should be json");
    assert_eq!(toggled["schedule_enabled"], false);
    assert!(!bot.instance.executor.store().get().schedule_enabled);

    let summary: Value = client
        .post(manager.url("/api/bot/run?name=alpha"))
        .json(&json!({"user_id": "10001", "times": 2}))
        .send()
        .await
        .expect("run request should complete")
        .json()
        .await
        .expect("run answer should be json");
    assert_eq!(summary["success"], 1);
    assert_eq!(bot.instance.executor.store().get().last_action_reason, "manual");

    let unknown = client
        .post(manager.url("/api/bot/run?name=omega"))
        .json(&json!({}))
        .send()
        .await
        .expect("unknown request should complete");
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn instance_token_unlocks_guarded_instances() {
    let napcat = napcat_logged_in().await;
    let bot = AdminServer::start(&napcat.uri(), |config| {
        config.admin.token = Some("fleet-secret".into());
    })
    .await;

    let without = ManagerServer::start(&[("guarded", bot.base_url())], None).await;
    let body: Value = reqwest::get(without.url("/api/bots"))
        .await
        .expect("bots request should complete")
        .json()
        .await
        .expect("bots should be json");
    assert!(body["bots"][0]["error"].as_str().unwrap().contains("HTTP 401"));

    let with = ManagerServer::start(&[("guarded", bot.base_url())], Some("fleet-secret")).await;
    let body: Value = reqwest::get(with.url("/api/bots"))
        .await
        .expect("bots request should complete")
        .json()
        .await
        .expect("bots should be json");
    assert_eq!(body["bots"][0]["error"], "");
    assert_eq!(body["bots"][0]["config"]["like_times"], 10);
}

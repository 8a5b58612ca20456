#![allow(dead_code)]

use chrono::NaiveDateTime;
use likebot::Config;
use likebot::diagnostics::HealthRegistry;
use likebot::platform::cron::Clock;
use likebot::platform::daemon::BotInstance;
use likebot::session::{OneBotClient, SessionApi};
use likebot::transport::gateway::run_gateway_with_listener;
use reqwest::StatusCode;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Clock frozen at a fixed local time.
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

pub fn morning() -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2026, 5, 10)
        .and_then(|d| d.and_hms_opt(8, 0, 0))
        .expect("valid fixed time")
}

/// A NapCat-like OneBot endpoint that is logged in and accepts every like.
pub async fn napcat_logged_in() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/get_status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok", "retcode": 0, "data": {"online": true, "good": true}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/get_login_info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok", "retcode": 0, "data": {"user_id": 20001, "nickname": "bot"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/send_like"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok", "retcode": 0, "data": null
        })))
        .mount(&server)
        .await;
    server
}

/// A real admin API bound to an ephemeral port, aborted on drop.
pub struct AdminServer {
    pub port: u16,
    pub instance: BotInstance,
    pub workspace: TempDir,
    handle: tokio::task::JoinHandle<anyhow::Result<()>>,
}

impl AdminServer {
    /// `tweak` edits the config after the test defaults are applied.
    pub async fn start(napcat_url: &str, tweak: impl FnOnce(&mut Config)) -> Self {
        let workspace = TempDir::new().expect("temp workspace should be created");

        let mut config = Config::default();
        config.session.api_url = napcat_url.to_string();
        config.bot.targets = vec!["10001".into(), "10002".into()];
        config.bot.delay_secs = 0;
        config.bot.state_file = Some(workspace.path().join("state.json"));
        config.admin.enabled = true;
        tweak(&mut config);

        let session: Arc<dyn SessionApi> = Arc::new(OneBotClient::new(
            &config.session.api_url,
            None,
            Duration::from_secs(2),
        ));
        let instance = BotInstance::build(&config, session, Arc::new(FixedClock(morning())))
            .expect("bot instance should build");
        let state = instance.app_state(&config, Arc::new(HealthRegistry::new()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("ephemeral admin listener should bind");
        let port = listener
            .local_addr()
            .expect("ephemeral admin listener should expose local address")
            .port();

        let handle =
            tokio::spawn(async move { run_gateway_with_listener(listener, state, &[]).await });
        wait_until_ready(port).await;

        Self {
            port,
            instance,
            workspace,
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url())
    }
}

impl Drop for AdminServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn wait_until_ready(port: u16) {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .expect("reqwest client should be built");

    for _ in 0..80 {
        let health = client
            .get(format!("http://127.0.0.1:{port}/health"))
            .send()
            .await;
        if matches!(health, Ok(resp) if resp.status() == StatusCode::OK) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    panic!("server did not become ready on port {port}");
}

use crate::instance::{AdminServer, napcat_logged_in};
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn read_endpoints_describe_the_instance() {
    let napcat = napcat_logged_in().await;
    let server = AdminServer::start(&napcat.uri(), |config| {
        config.bot.like_times = 7;
    })
    .await;
    let client = reqwest::Client::new();

    let config: Value = client
        .get(server.url("/api/config"))
        .send()
        .await
        .expect("config request should complete")
        .json()
        .await
        .expect("config should be json");
    assert_eq!(config["targets"], json!(["10001", "10002"]));
    assert_eq!(config["like_times"], 7);
    assert_eq!(config["schedule_time"], "09:00");
    assert!(config["state_file"].as_str().unwrap().ends_with("state.json"));

    let state: Value = client
        .get(server.url("/api/state"))
        .send()
        .await
        .expect("state request should complete")
        .json()
        .await
        .expect("state should be json");
    assert_eq!(state["schedule_enabled"], true);
    assert_eq!(state["last_action_at"], "");

    let next_run: Value = client
        .get(server.url("/api/next_run"))
        .send()
        .await
        .expect("next_run request should complete")
        .json()
        .await
        .expect("next_run should be json");
    assert_eq!(next_run["next_run"], "2026-05-10 09:00:00");

    let napcat_health: Value = client
        .get(server.url("/api/napcat"))
        .send()
        .await
        .expect("napcat request should complete")
        .json()
        .await
        .expect("napcat should be json");
    assert_eq!(napcat_health["error"], "");
    assert_eq!(napcat_health["login"]["data"]["user_id"], 20001);
}

#[tokio::test]
async fn manual_run_likes_every_target_and_records_outcome() {
    let napcat = MockServer::start().await;
    for user in ["10001", "10002"] {
        Mock::given(method("POST"))
            .and(path("/send_like"))
            .and(body_json(json!({"user_id": user, "times": 3})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"status": "ok", "retcode": 0})),
            )
            .expect(1)
            .mount(&napcat)
            .await;
    }

    let server = AdminServer::start(&napcat.uri(), |_| {}).await;
    let response = reqwest::Client::new()
        .post(server.url("/api/run"))
        .json(&json!({"times": 3}))
        .send()
        .await
        .expect("run request should complete");
    assert_eq!(response.status(), StatusCode::OK);
    let summary: Value = response.json().await.expect("summary should be json");
    assert_eq!(summary["success"], 2);
    assert_eq!(summary["fail"], 0);

    let state = server.instance.executor.store().get();
    assert_eq!(state.last_action_reason, "manual");
    assert_eq!(state.last_action_ok, Some(true));
    assert!(state.last_action_at.is_some());

    let persisted = std::fs::read_to_string(server.workspace.path().join("state.json"))
        .expect("state file should exist");
    let persisted: Value = serde_json::from_str(&persisted).expect("state file should be json");
    assert_eq!(persisted["last_action"], "manual");
    assert_eq!(persisted["last_action_ok"], true);

    napcat.verify().await;
}

#[tokio::test]
async fn run_finishes_and_records_after_client_gives_up() {
    let napcat = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send_like"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "ok", "retcode": 0}))
                .set_delay(Duration::from_millis(500)),
        )
        .expect(2)
        .mount(&napcat)
        .await;

    let server = AdminServer::start(&napcat.uri(), |_| {}).await;
    let impatient = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .expect("reqwest client should be built");
    let abandoned = impatient.post(server.url("/api/run")).send().await;
    assert!(abandoned.is_err());

    let mut recorded = None;
    for _ in 0..100 {
        let state = server.instance.executor.store().get();
        if state.last_action_at.is_some() && !server.instance.executor.is_running() {
            recorded = Some(state);
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    let state = recorded.expect("batch outcome should be recorded");
    assert_eq!(state.last_action_reason, "manual");
    assert_eq!(state.last_action_ok, Some(true));

    napcat.verify().await;
}

#[tokio::test]
async fn rejected_like_counts_as_failure_without_aborting() {
    let napcat = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send_like"))
        .and(body_json(json!({"user_id": "10001", "times": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "failed", "retcode": 1200, "wording": "like limit reached"
        })))
        .mount(&napcat)
        .await;
    Mock::given(method("POST"))
        .and(path("/send_like"))
        .and(body_json(json!({"user_id": "10002", "times": 1})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "ok", "retcode": 0})),
        )
        .mount(&napcat)
        .await;

    let server = AdminServer::start(&napcat.uri(), |_| {}).await;
    let summary: Value = reqwest::Client::new()
        .post(server.url("/api/run"))
        .send()
        .await
        .expect("run request should complete")
        .json()
        .await
        .expect("summary should be json");
    assert_eq!(summary["success"], 1);
    assert_eq!(summary["fail"], 1);
    assert_eq!(summary["failed_targets"], json!(["10001"]));
    assert_eq!(server.instance.executor.store().get().last_action_ok, Some(false));
}

#[tokio::test]
async fn toggle_schedule_persists_switch() {
    let napcat = napcat_logged_in().await;
    let server = AdminServer::start(&napcat.uri(), |_| {}).await;

    let state: Value = reqwest::Client::new()
        .post(server.url("/api/toggle_schedule"))
        .json(&json!({"enabled": "off"}))
        .send()
        .await
        .expect("toggle request should complete")
        .json()
        .await
        .expect("toggle answer should be json");
    assert_eq!(state["schedule_enabled"], false);

    let persisted = std::fs::read_to_string(server.workspace.path().join("state.json"))
        .expect("state file should exist");
    assert!(persisted.contains(r#""schedule_enabled": false"#));
}

#[tokio::test]
async fn session_outage_is_reported_not_fatal() {
    let server = AdminServer::start("http://127.0.0.1:1", |_| {}).await;
    let client = reqwest::Client::new();

    let health: Value = client
        .get(server.url("/api/napcat"))
        .send()
        .await
        .expect("napcat request should complete")
        .json()
        .await
        .expect("napcat should be json");
    assert!(!health["error"].as_str().unwrap().is_empty());
    assert!(health["login"].is_null());

    let friends = client
        .get(server.url("/api/friends"))
        .send()
        .await
        .expect("friends request should complete");
    assert_eq!(friends.status(), StatusCode::BAD_GATEWAY);
    let body: Value = friends.json().await.expect("error should be json");
    assert_eq!(body["kind"], "upstream_unreachable");
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let napcat = napcat_logged_in().await;
    let server = AdminServer::start(&napcat.uri(), |_| {}).await;

    let response = reqwest::get(server.url("/api/nope"))
        .await
        .expect("request should complete");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.expect("error should be json");
    assert_eq!(body["kind"], "not_found");
}

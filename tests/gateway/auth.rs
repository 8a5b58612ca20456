use crate::instance::{AdminServer, napcat_logged_in};
use reqwest::StatusCode;

#[tokio::test]
async fn admin_token_is_accepted_in_every_position() {
    let napcat = napcat_logged_in().await;
    let server = AdminServer::start(&napcat.uri(), |config| {
        config.admin.token = Some("letmein".into());
    })
    .await;
    let client = reqwest::Client::new();

    let anonymous = client
        .get(server.url("/api/state"))
        .send()
        .await
        .expect("anonymous request should complete");
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let wrong = client
        .get(server.url("/api/state"))
        .bearer_auth("letmeout")
        .send()
        .await
        .expect("wrong-token request should complete");
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let bearer = client
        .get(server.url("/api/state"))
        .bearer_auth("letmein")
        .send()
        .await
        .expect("bearer request should complete");
    assert_eq!(bearer.status(), StatusCode::OK);

    let header = client
        .get(server.url("/api/state"))
        .header("X-Admin-Token", "letmein")
        .send()
        .await
        .expect("header request should complete");
    assert_eq!(header.status(), StatusCode::OK);

    let query = client
        .get(server.url("/api/state?token=letmein"))
        .send()
        .await
        .expect("query request should complete");
    assert_eq!(query.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_stays_public_behind_token() {
    let napcat = napcat_logged_in().await;
    let server = AdminServer::start(&napcat.uri(), |config| {
        config.admin.token = Some("letmein".into());
    })
    .await;

    let health = reqwest::get(server.url("/health"))
        .await
        .expect("health request should complete");
    assert_eq!(health.status(), StatusCode::OK);
    let body: serde_json::Value = health.json().await.expect("health should be json");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["runtime"]["components"]["gateway"]["status"], "ok");
}

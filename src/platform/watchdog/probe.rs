use super::WatchFuture;
use crate::error::{LikeError, Result};
use crate::session::SessionHealth;
use crate::utils::http_client::build_http_client;
use crate::utils::text::clip;
use reqwest::Client;
use std::time::Duration;

/// Reads the session health a bot instance reports about itself.
pub trait HealthProbe: Send + Sync {
    fn probe<'a>(&'a self, bot_url: &'a str) -> WatchFuture<'a, Result<SessionHealth>>;
}

/// `GET {bot_url}/api/napcat`.
pub struct HttpHealthProbe {
    client: Client,
    token: Option<String>,
}

impl HttpHealthProbe {
    pub fn new(timeout: Duration, token: Option<String>) -> Self {
        Self {
            client: build_http_client(timeout),
            token: token.filter(|token| !token.trim().is_empty()),
        }
    }
}

impl HealthProbe for HttpHealthProbe {
    fn probe<'a>(&'a self, bot_url: &'a str) -> WatchFuture<'a, Result<SessionHealth>> {
        Box::pin(async move {
            let url = format!("{}/api/napcat", bot_url.trim_end_matches('/'));
            let mut request = self.client.get(&url);
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| LikeError::unreachable(url.as_str(), e))?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(LikeError::UpstreamUnreachable {
                    target: url,
                    status: Some(status.as_u16()),
                    message: clip(&body, 200),
                });
            }
            response
                .json::<SessionHealth>()
                .await
                .map_err(|e| {
                    LikeError::unreachable(url.as_str(), format!("invalid health payload: {e}"))
                })
        })
    }
}

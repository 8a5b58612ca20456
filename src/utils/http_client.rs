use reqwest::Client;
use std::time::Duration;

/// Client for short request/response calls against OneBot sessions and
/// fleet instances. `timeout` bounds every request end to end.
pub fn build_http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(5)))
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .unwrap_or_else(|_| Client::new())
}

use reqwest::Client;
use std::time::Duration;

/// Shared client for generative backends. Per-request deadlines are applied on
/// each call; the client-level timeout is only an upper bound.
pub fn build_backend_client() -> Client {
    build_backend_client_with_timeout(120)
}

pub fn build_backend_client_with_timeout(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .unwrap_or_else(|_| Client::new())
}

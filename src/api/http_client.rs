use once_cell::sync::OnceCell;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

use super::client::{ClientConfig, DEFAULT_TIMEOUT_SECS};
use crate::error::Result;

/// Process-wide client for the default transport settings, so every backend
/// shares one connection pool.
static SHARED_CLIENT: OnceCell<Client> = OnceCell::new();

/// User agent sent when the configuration doesn't override it
pub fn default_user_agent() -> String {
    format!("warp-cli/{}", env!("CARGO_PKG_VERSION"))
}

fn builder(timeout_secs: u64, user_agent: &str) -> ClientBuilder {
    ClientBuilder::new()
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(30))
        .timeout(Duration::from_secs(timeout_secs))
        .tcp_keepalive(Duration::from_secs(60))
        .tcp_nodelay(true)
        .user_agent(user_agent)
        .use_rustls_tls()
}

/// Get the shared HTTP client, building it on first use
pub fn shared_client() -> Result<Client> {
    SHARED_CLIENT
        .get_or_try_init(|| builder(DEFAULT_TIMEOUT_SECS, &default_user_agent()).build())
        .cloned()
        .map_err(Into::into)
}

/// Create an HTTP client with custom timeout and user agent
pub fn create_custom_client(timeout_secs: u64, user_agent: &str) -> Result<Client> {
    Ok(builder(timeout_secs, user_agent).build()?)
}

/// Client for a backend: the shared pool unless the config changes transport settings
pub fn client_for(config: &ClientConfig) -> Result<Client> {
    if config.timeout == DEFAULT_TIMEOUT_SECS && config.user_agent == default_user_agent() {
        shared_client()
    } else {
        create_custom_client(config.timeout, &config.user_agent)
    }
}

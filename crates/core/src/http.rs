use reqwest::{Client, ClientBuilder};
use std::time::Duration;

use crate::error::BotResult;

const USER_AGENT: &str = concat!("dexscout/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client for providers and the REST persistence backend
pub fn create_client(timeout: Duration) -> BotResult<Client> {
    let client = ClientBuilder::new()
        .user_agent(USER_AGENT)
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .timeout(timeout)
        .build()?;
    Ok(client)
}

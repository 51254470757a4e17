//! Shared HTTP client construction.

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};

/// Default `User-Agent`; some hosts answer 403 to anonymous clients.
pub const DEFAULT_USER_AGENT: &str = "OpenGamesLauncher/1.0 (+local)";

/// HTTP settings shared by downloads and bulletin fetches.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub user_agent: String,
    /// Connection establishment limit.
    pub connect_timeout: Duration,
    /// Maximum silence between reads while streaming a body.
    pub read_timeout: Duration,
    /// Total limit for a bulletin request, body included.
    pub bulletin_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.into(),
            connect_timeout: Duration::from_secs(60),
            read_timeout: Duration::from_secs(60),
            bulletin_timeout: Duration::from_secs(20),
        }
    }
}

/// Builds the client used for every request the launcher makes.
///
/// Only connect and read timeouts are set at the client level so large
/// archives are not cut off by a total deadline.
pub fn build_client(config: &HttpConfig) -> Result<reqwest::Client, crate::NetError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .connect_timeout(config.connect_timeout)
        .read_timeout(config.read_timeout)
        .build()?;
    Ok(client)
}

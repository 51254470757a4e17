//! Short text resources such as patch notes or news pages.

use std::time::Duration;

use tracing::debug;

use crate::NetError;

/// Fetches bulletin text with a per-request deadline.
#[derive(Debug, Clone)]
pub struct BulletinFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl BulletinFetcher {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// GETs `url` and returns the decoded body.
    ///
    /// The whole request, body included, must finish within the
    /// fetcher's timeout. Non-2xx responses are errors.
    pub async fn fetch(&self, url: &str) -> Result<String, NetError> {
        let response = self.client.get(url).timeout(self.timeout).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NetError::Status {
                url: url.to_string(),
                status,
            });
        }

        let text = response.text().await?;
        debug!(url, chars = text.len(), "bulletin fetched");
        Ok(text)
    }
}

/// Returns at most the first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

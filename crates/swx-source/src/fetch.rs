//! HTTP retrieval of published index files

use crate::{SourceError, SourceResult};
use std::time::Duration;
use tracing::debug;

/// Thin wrapper over a shared `reqwest` client with a request timeout
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> SourceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SourceError::from)?;
        Ok(Self { client })
    }

    /// Fetch one text resource. Non-2xx status is `SourceUnavailable`.
    pub async fn fetch_text(&self, url: &str) -> SourceResult<String> {
        debug!(%url, "fetching resource");
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(SourceError::SourceUnavailable(format!(
                "{} returned {}",
                url,
                resp.status()
            )));
        }
        Ok(resp.text().await?)
    }

    /// List remote filenames from a directory index page, keeping entries
    /// with the given suffix.
    pub async fn list_resources(&self, index_url: &str, suffix: &str) -> SourceResult<Vec<String>> {
        let body = self.fetch_text(index_url).await?;
        Ok(extract_hrefs(&body, suffix))
    }
}

/// Extract href targets with the given suffix from an HTML directory index,
/// reduced to bare filenames, first-seen order, deduplicated.
pub fn extract_hrefs(html: &str, suffix: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for (pos, _) in html.match_indices("href=\"") {
        let rest = &html[pos + 6..];
        let Some(end) = rest.find('"') else { continue };
        let target = &rest[..end];
        if !target.ends_with(suffix) {
            continue;
        }
        let name = target.rsplit('/').next().unwrap_or(target).to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

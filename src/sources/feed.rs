//! HTTP access to the raw trend endpoints.
//!
//! Both endpoints are reached through a CORS-relay proxy that takes the
//! URL-encoded target appended to its own URL. Only the nested list path of
//! each response is inspected; everything else about the vendor JSON is opaque.

use crate::error::{Error, Result};
use crate::utils::truncate_for_log;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Async JSON GET.
pub trait JsonFetch {
    /// Fetch `url` and parse the body as JSON.
    ///
    /// # Errors
    ///
    /// [`Error::Transport`] for network and HTTP status failures,
    /// [`Error::MalformedResponse`] when the body is not JSON.
    fn get_json(&self, url: &str) -> impl Future<Output = Result<Value>> + Send;
}

/// `reqwest`-backed [`JsonFetch`].
#[derive(Debug, Clone, Default)]
pub struct HttpFeed {
    http: reqwest::Client,
}

impl HttpFeed {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl JsonFetch for HttpFeed {
    #[instrument(level = "info", skip(self))]
    async fn get_json(&self, url: &str) -> Result<Value> {
        let t0 = Instant::now();
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Trend source returned an error status");
            return Err(Error::Transport(format!("trend source returned {status}")));
        }
        let body = response.text().await?;
        debug!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            bytes = body.len(),
            "Fetched trend source"
        );
        serde_json::from_str(&body).map_err(|e| {
            warn!(
                error = %e,
                body = %truncate_for_log(&body, 200),
                "Trend source body is not JSON"
            );
            Error::MalformedResponse(format!("body is not JSON: {e}"))
        })
    }
}

/// One raw trend endpoint and where its entry list lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEndpoint {
    pub url: String,
    /// Dot-separated path to the entry array, e.g. `data.word_list`.
    pub list_path: String,
}

impl SourceEndpoint {
    /// The URL to request, routed through `proxy` unless it is empty.
    pub fn proxied_url(&self, proxy: &str) -> String {
        if proxy.is_empty() {
            self.url.clone()
        } else {
            format!("{proxy}{}", urlencoding::encode(&self.url))
        }
    }
}

/// Walk `path` into `body` and return the non-empty entry array found there.
///
/// # Errors
///
/// [`Error::MalformedResponse`] when a segment is missing, the target is not
/// an array, or the array is empty.
pub fn extract_list<'a>(body: &'a Value, path: &str) -> Result<&'a [Value]> {
    let mut node = body;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        node = node
            .get(segment)
            .ok_or_else(|| Error::MalformedResponse(format!("missing field `{segment}` of `{path}`")))?;
    }
    let list = node
        .as_array()
        .ok_or_else(|| Error::MalformedResponse(format!("`{path}` is not an array")))?;
    if list.is_empty() {
        return Err(Error::MalformedResponse(format!("`{path}` is empty")));
    }
    Ok(list)
}

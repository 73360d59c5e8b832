//! The network seam: fetching one JSON document by URL.

use async_trait::async_trait;
use serde_json::Value;

use crate::FetchError;

/// Fetches and parses one remote JSON document.
///
/// The loader only ever issues GETs through this trait, so tests and other
/// transports can stand in for HTTP.
#[async_trait]
pub trait JsonFetcher: Send + Sync {
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError>;
}

#[cfg(feature = "http")]
pub use http::HttpFetcher;

#[cfg(feature = "http")]
mod http {
    use std::time::Duration;

    use async_trait::async_trait;
    use reqwest::header::{ACCEPT, CACHE_CONTROL, HeaderMap, HeaderValue};
    use serde_json::Value;
    use tracing::debug;

    use super::JsonFetcher;
    use crate::FetchError;

    /// Plain HTTPS GET client for catalog configs and source documents.
    ///
    /// Requests carry no credentials and ask intermediaries not to serve
    /// cached copies.
    pub struct HttpFetcher {
        client: reqwest::Client,
    }

    impl HttpFetcher {
        /// Build a fetcher with a per-request timeout and optional user agent.
        pub fn new(timeout: Duration, user_agent: Option<&str>) -> Result<Self, FetchError> {
            let mut headers = HeaderMap::new();
            headers.insert(
                ACCEPT,
                HeaderValue::from_static("application/json, text/plain, */*"),
            );
            headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

            let mut builder = reqwest::Client::builder()
                .timeout(timeout)
                .default_headers(headers);
            if let Some(agent) = user_agent {
                builder = builder.user_agent(agent.to_string());
            }
            Ok(Self {
                client: builder.build()?,
            })
        }
    }

    #[async_trait]
    impl JsonFetcher for HttpFetcher {
        async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
            debug!(url = %url, "GET");
            let resp = self.client.get(url).send().await?;
            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(FetchError::Server {
                    status: status.as_u16(),
                    body,
                });
            }

            let body = resp.text().await?;
            Ok(serde_json::from_str(&body)?)
        }
    }
}

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use crate::cache::TtlCache;
use crate::config::{CacheConfig, ProxyConfig};
use crate::error::FetchError;
use crate::models::post::Post;
use crate::models::session::SortMode;

/// One page of upstream search results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub posts: Vec<Post>,

    #[serde(default)]
    pub cursor: Option<String>,
}

/// Seam between the orchestration layers and the upstream proxy. The
/// production implementation is `ProxyClient`; tests substitute their own.
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn fetch_page(
        &self,
        term: &str,
        cursor: Option<&str>,
        sort: SortMode,
    ) -> Result<SearchPage, FetchError>;
}

/// HTTP client for the proxy's single search endpoint, with a bounded TTL'd
/// page cache in front of it.
pub struct ProxyClient {
    client: Client,
    base_url: String,
    cache: Mutex<TtlCache<SearchPage>>,
}

impl ProxyClient {
    pub fn new(proxy: &ProxyConfig, cache: &CacheConfig) -> anyhow::Result<Self> {
        let client = build_http_client(proxy.request_timeout_seconds)?;

        Ok(Self {
            client,
            base_url: proxy.base_url.trim_end_matches('/').to_string(),
            cache: Mutex::new(TtlCache::new(
                Duration::from_secs(cache.search_ttl_seconds),
                cache.search_max_entries,
            )),
        })
    }

    fn cache_key(term: &str, cursor: Option<&str>, sort: SortMode) -> String {
        format!("{}|{}|{}", term, cursor.unwrap_or(""), sort)
    }
}

/// Shared HTTP client defaults: one timeout, one user agent, connection
/// pooling across all proxy calls.
pub fn build_http_client(timeout_seconds: u64) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(concat!("skysift/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))
}

/// Pulls a human-readable message out of a `{error|message}` JSON body.
fn extract_error_message(body: &str, status: StatusCode) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .or_else(|| value.get("error"))
                .and_then(|m| m.as_str())
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| format!("HTTP {status}"))
}

#[async_trait]
impl PostSource for ProxyClient {
    async fn fetch_page(
        &self,
        term: &str,
        cursor: Option<&str>,
        sort: SortMode,
    ) -> Result<SearchPage, FetchError> {
        let key = Self::cache_key(term, cursor, sort);

        if let Some(page) = self.cache.lock().await.get(&key) {
            debug!("Cache hit for '{}'", term);
            return Ok(page.clone());
        }

        let mut url = format!(
            "{}/search?term={}&sort={}",
            self.base_url,
            urlencoding::encode(term),
            sort
        );
        if let Some(cursor) = cursor {
            url.push_str("&cursor=");
            url.push_str(&urlencoding::encode(cursor));
        }

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    term: term.to_string(),
                }
            } else {
                FetchError::Network {
                    term: term.to_string(),
                    source: e,
                }
            }
        })?;

        let status = response.status();

        if status == StatusCode::GATEWAY_TIMEOUT {
            return Err(FetchError::Timeout {
                term: term.to_string(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Upstream {
                term: term.to_string(),
                status: status.as_u16(),
                message: extract_error_message(&body, status),
            });
        }

        let page: SearchPage = response.json().await.map_err(|e| FetchError::Malformed {
            term: term.to_string(),
            message: e.to_string(),
        })?;

        let mut cache = self.cache.lock().await;
        cache.insert(key, page.clone());
        cache.enforce_limit();

        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_includes_all_dimensions() {
        let a = ProxyClient::cache_key("rust", None, SortMode::Top);
        let b = ProxyClient::cache_key("rust", Some("abc"), SortMode::Top);
        let c = ProxyClient::cache_key("rust", None, SortMode::Latest);

        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, "rust||top");
    }

    #[test]
    fn test_extract_error_message_prefers_message_field() {
        let status = StatusCode::BAD_REQUEST;
        assert_eq!(
            extract_error_message(r#"{"message": "term too long"}"#, status),
            "term too long"
        );
        assert_eq!(
            extract_error_message(r#"{"error": "invalid sort"}"#, status),
            "invalid sort"
        );
        assert_eq!(
            extract_error_message("<html>nope</html>", status),
            "HTTP 400 Bad Request"
        );
    }
}

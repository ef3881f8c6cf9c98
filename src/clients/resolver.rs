use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use crate::cache::TtlCache;
use crate::config::{CacheConfig, ProxyConfig};

use super::proxy::build_http_client;

#[derive(Debug, Deserialize)]
struct ResolveResponse {
    did: String,
}

/// Resolves author handles to stable actor identifiers through the proxy.
/// Results are cached far longer than search pages since a handle rarely
/// changes its identifier.
pub struct ResolverClient {
    client: Client,
    base_url: String,
    cache: Mutex<TtlCache<String>>,
}

impl ResolverClient {
    pub fn new(proxy: &ProxyConfig, cache: &CacheConfig) -> Result<Self> {
        let client = build_http_client(proxy.request_timeout_seconds)?;

        Ok(Self {
            client,
            base_url: proxy.base_url.trim_end_matches('/').to_string(),
            cache: Mutex::new(TtlCache::new(
                Duration::from_secs(cache.identifier_ttl_seconds),
                cache.identifier_max_entries,
            )),
        })
    }

    pub async fn resolve_handle(&self, handle: &str) -> Result<String> {
        let key = handle.trim().trim_start_matches('@').to_lowercase();
        if key.is_empty() {
            anyhow::bail!("Handle cannot be empty");
        }

        if let Some(identifier) = self.cache.lock().await.get(&key) {
            debug!("Identifier cache hit for '{}'", key);
            return Ok(identifier.clone());
        }

        let url = format!(
            "{}/resolve?handle={}",
            self.base_url,
            urlencoding::encode(&key)
        );

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to resolve '{}': {} - {}", key, status, body);
        }

        let resolved: ResolveResponse = response.json().await?;

        let mut cache = self.cache.lock().await;
        cache.insert(key, resolved.did.clone());
        cache.enforce_limit();

        Ok(resolved.did)
    }
}

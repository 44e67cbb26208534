//! Shared upstream HTTP client cache, keyed by `(channel_name, insecure)` so
//! that a channel configured with `insecure_skip_verify` never shares a
//! connection pool with one that verifies certificates normally.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(86_400);
const READ_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
#[error("failed to build upstream http client: {0}")]
pub struct HttpClientError(String);

pub struct HttpClientCache {
    clients: Mutex<HashMap<(String, bool), wreq::Client>>,
}

impl HttpClientCache {
    pub fn new() -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the shared client for `channel_name`/`insecure`, building and
    /// caching a fresh one on first use.
    pub fn get(&self, channel_name: &str, insecure: bool) -> Result<wreq::Client, HttpClientError> {
        let key = (channel_name.to_string(), insecure);
        let mut guard = self
            .clients
            .lock()
            .map_err(|_| HttpClientError("client cache lock poisoned".to_string()))?;
        if let Some(client) = guard.get(&key) {
            return Ok(client.clone());
        }
        let client = build_client(insecure)?;
        guard.insert(key, client.clone());
        Ok(client)
    }
}

impl Default for HttpClientCache {
    fn default() -> Self {
        Self::new()
    }
}

fn build_client(insecure: bool) -> Result<wreq::Client, HttpClientError> {
    wreq::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .read_timeout(READ_TIMEOUT)
        .tls_cert_verification(!insecure)
        .build()
        .map_err(|err| HttpClientError(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_lookups_for_the_same_key_succeed() {
        let cache = HttpClientCache::new();
        assert!(cache.get("prod", false).is_ok());
        assert!(cache.get("prod", false).is_ok());
    }

    #[test]
    fn distinct_insecure_flags_are_cached_separately() {
        let cache = HttpClientCache::new();
        assert!(cache.get("prod", false).is_ok());
        assert!(cache.get("prod", true).is_ok());
    }
}

//! Key Scheduler: picks the next API key to try for an upstream channel and
//! tracks keys that have been marked failed or deprioritized.
//!
//! The failed-key set is process-wide rather than per-channel: a key is
//! almost always scoped to one channel in practice, and a single set keeps
//! the hot path (one read-lock touch per attempt) simpler than plumbing a
//! per-channel set through every call site. Declared trade-off.

use std::collections::HashSet;

use tokio::sync::RwLock;

use crate::config::UpstreamChannel;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("no available api key for this upstream")]
    NoAvailableKey,
}

#[derive(Debug, Default)]
pub struct KeyScheduler {
    failed_keys: RwLock<HashSet<String>>,
}

impl KeyScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the first key in `channel`'s current order that is in neither
    /// `excluded` (already tried this request) nor the process failed-key
    /// set. Never returns a key present in either set.
    pub async fn next_key(
        &self,
        channel: &UpstreamChannel,
        excluded: &HashSet<String>,
    ) -> Result<String, SchedulerError> {
        let failed = self.failed_keys.read().await;
        let keys = channel.api_keys.read().await;
        keys.iter()
            .find(|key| !excluded.contains(key.as_str()) && !failed.contains(key.as_str()))
            .cloned()
            .ok_or(SchedulerError::NoAvailableKey)
    }

    pub async fn mark_key_failed(&self, key: &str) {
        self.failed_keys.write().await.insert(key.to_string());
    }

    pub async fn is_key_failed(&self, key: &str) -> bool {
        self.failed_keys.read().await.contains(key)
    }

    /// Moves `key` to the end of `channel`'s key list. A no-op if the key is
    /// not present. Preserves the relative order of every other key.
    pub async fn deprioritize_key(&self, channel: &UpstreamChannel, key: &str) {
        let mut keys = channel.api_keys.write().await;
        if let Some(pos) = keys.iter().position(|k| k == key) {
            let moved = keys.remove(pos);
            keys.push(moved);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceType;
    use std::collections::HashMap;
    use tokio::sync::RwLock as TokioRwLock;

    fn channel(keys: Vec<&str>) -> UpstreamChannel {
        UpstreamChannel {
            name: "c".to_string(),
            service_type: ServiceType::Claude,
            base_url: "https://example.invalid".to_string(),
            api_keys: TokioRwLock::new(keys.into_iter().map(String::from).collect()),
            insecure_skip_verify: false,
            model_map: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn next_key_returns_first_available() {
        let scheduler = KeyScheduler::new();
        let ch = channel(vec!["k1", "k2", "k3"]);
        let key = scheduler.next_key(&ch, &HashSet::new()).await.unwrap();
        assert_eq!(key, "k1");
    }

    #[tokio::test]
    async fn next_key_skips_excluded_and_failed() {
        let scheduler = KeyScheduler::new();
        let ch = channel(vec!["k1", "k2", "k3"]);
        scheduler.mark_key_failed("k1").await;
        let mut excluded = HashSet::new();
        excluded.insert("k2".to_string());
        let key = scheduler.next_key(&ch, &excluded).await.unwrap();
        assert_eq!(key, "k3");
    }

    #[tokio::test]
    async fn next_key_errors_when_all_unavailable() {
        let scheduler = KeyScheduler::new();
        let ch = channel(vec!["k1"]);
        scheduler.mark_key_failed("k1").await;
        let err = scheduler.next_key(&ch, &HashSet::new()).await.unwrap_err();
        assert_eq!(err, SchedulerError::NoAvailableKey);
    }

    #[tokio::test]
    async fn deprioritize_moves_key_to_end_and_preserves_others() {
        let scheduler = KeyScheduler::new();
        let ch = channel(vec!["k1", "k2", "k3"]);
        scheduler.deprioritize_key(&ch, "k1").await;
        let keys = ch.api_keys.read().await.clone();
        assert_eq!(keys, vec!["k2", "k3", "k1"]);
    }

    #[tokio::test]
    async fn deprioritize_unknown_key_is_noop() {
        let scheduler = KeyScheduler::new();
        let ch = channel(vec!["k1", "k2"]);
        scheduler.deprioritize_key(&ch, "nope").await;
        let keys = ch.api_keys.read().await.clone();
        assert_eq!(keys, vec!["k1", "k2"]);
    }
}

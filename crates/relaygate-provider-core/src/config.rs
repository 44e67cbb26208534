//! Upstream channel and process configuration data model.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Claude,
    Openai,
    OpenaiOld,
    Gemini,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Claude => "claude",
            ServiceType::Openai => "openai",
            ServiceType::OpenaiOld => "openai_old",
            ServiceType::Gemini => "gemini",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalance {
    #[default]
    Sequential,
    RoundRobin,
}

/// On-disk shape of a single upstream channel. Deserialized straight out of
/// the TOML config file; [`UpstreamChannel`] is the runtime form with the key
/// list behind a lock so the scheduler can reorder it under concurrent load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamChannelFile {
    pub name: String,
    pub service_type: ServiceType,
    pub base_url: String,
    #[serde(default)]
    pub api_keys: Vec<String>,
    #[serde(default)]
    pub insecure_skip_verify: bool,
    #[serde(default)]
    pub model_map: HashMap<String, String>,
}

/// A single upstream target: one provider account reachable through a list of
/// API keys tried in order (and reordered as keys fail).
#[derive(Debug)]
pub struct UpstreamChannel {
    pub name: String,
    pub service_type: ServiceType,
    pub base_url: String,
    pub api_keys: RwLock<Vec<String>>,
    pub insecure_skip_verify: bool,
    pub model_map: HashMap<String, String>,
}

impl From<UpstreamChannelFile> for UpstreamChannel {
    fn from(file: UpstreamChannelFile) -> Self {
        UpstreamChannel {
            name: file.name,
            service_type: file.service_type,
            base_url: file.base_url,
            api_keys: RwLock::new(file.api_keys),
            insecure_skip_verify: file.insecure_skip_verify,
            model_map: file.model_map,
        }
    }
}

impl UpstreamChannel {
    /// Maps a client-requested model name through this channel's model_map,
    /// falling back to the requested name unchanged when there is no entry.
    pub fn resolve_model<'a>(&'a self, requested: &'a str) -> &'a str {
        self.model_map
            .get(requested)
            .map(String::as_str)
            .unwrap_or(requested)
    }
}

/// On-disk shape of the whole process configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub current_upstream: String,
    #[serde(default)]
    pub load_balance: LoadBalance,
    pub proxy_access_key: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_health_check_path")]
    pub health_check_path: String,
    #[serde(default)]
    pub enable_web_ui: bool,
    #[serde(default)]
    pub upstreams: Vec<UpstreamChannelFile>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_health_check_path() -> String {
    "/health".to_string()
}

/// Runtime configuration: one [`UpstreamChannel`] per configured upstream,
/// keyed by name, plus the process-wide routing knobs.
#[derive(Debug)]
pub struct Config {
    pub current_upstream: String,
    pub load_balance: LoadBalance,
    pub proxy_access_key: String,
    pub host: String,
    pub port: u16,
    pub health_check_path: String,
    pub enable_web_ui: bool,
    pub upstreams: HashMap<String, UpstreamChannel>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("current_upstream {0:?} is not a configured upstream")]
    UnknownCurrentUpstream(String),
}

impl From<ConfigFile> for Config {
    fn from(file: ConfigFile) -> Self {
        Config {
            current_upstream: file.current_upstream,
            load_balance: file.load_balance,
            proxy_access_key: file.proxy_access_key,
            host: file.host,
            port: file.port,
            health_check_path: file.health_check_path,
            enable_web_ui: file.enable_web_ui,
            upstreams: file
                .upstreams
                .into_iter()
                .map(|u| (u.name.clone(), UpstreamChannel::from(u)))
                .collect(),
        }
    }
}

impl Config {
    /// Validates cross-field invariants the plain `From` conversion can't
    /// enforce: the current upstream must exist. An upstream with an empty
    /// `api_keys` list is a valid-but-unusable channel — the per-request
    /// failover loop reports that case as `NoKeys` when it's selected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.upstreams.contains_key(&self.current_upstream) {
            return Err(ConfigError::UnknownCurrentUpstream(
                self.current_upstream.clone(),
            ));
        }
        Ok(())
    }

    pub fn current_channel(&self) -> Option<&UpstreamChannel> {
        self.upstreams.get(&self.current_upstream)
    }
}

//! CLI/ENV-sourced settings layered over the persisted TOML config file.
//! Precedence is CLI flag > environment variable > config file value, with
//! `clap`'s `env` attribute handling the first two for free.

use std::path::{Path, PathBuf};

use clap::Parser;
use relaygate_provider_core::{Config, ConfigError, ConfigFile};

#[derive(Debug, Parser, Clone)]
#[command(name = "relaygate", about = "A protocol-translating reverse proxy for the Claude Messages API.")]
pub struct CliArgs {
    /// Path to the TOML configuration file.
    #[arg(long, env = "CONFIG_PATH", default_value = "config.toml")]
    pub config_path: PathBuf,

    /// Overrides `proxy_access_key` from the config file. Required, one way
    /// or the other, for the process to start.
    #[arg(long, env = "PROXY_ACCESS_KEY")]
    pub proxy_access_key: Option<String>,

    /// Overrides the config file's `host`.
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Overrides the config file's `port`.
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Overrides the config file's `health_check_path`.
    #[arg(long, env = "HEALTH_CHECK_PATH")]
    pub health_check_path: Option<String>,

    /// Overrides the config file's `enable_web_ui`.
    #[arg(long, env = "ENABLE_WEB_UI")]
    pub enable_web_ui: Option<bool>,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to parse config file {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
    #[error("proxy_access_key is not set in the config file or PROXY_ACCESS_KEY/--proxy-access-key")]
    MissingProxyAccessKey,
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Reads and parses the TOML config file at `path`, without applying CLI/ENV
/// overrides. Exposed separately so `/admin/config/reload` can re-run just
/// this half without re-parsing `CliArgs`.
pub fn read_config_file(path: &Path) -> Result<ConfigFile, SettingsError> {
    let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads the config file named by `args.config_path`, applies the CLI/ENV
/// overrides `args` carries, validates the result, and returns a ready-to-use
/// runtime [`Config`].
pub fn load_config(args: &CliArgs) -> Result<Config, SettingsError> {
    let mut file = read_config_file(&args.config_path)?;

    if let Some(proxy_access_key) = &args.proxy_access_key {
        file.proxy_access_key = proxy_access_key.clone();
    }
    if let Some(host) = &args.host {
        file.host = host.clone();
    }
    if let Some(port) = args.port {
        file.port = port;
    }
    if let Some(health_check_path) = &args.health_check_path {
        file.health_check_path = health_check_path.clone();
    }
    if let Some(enable_web_ui) = args.enable_web_ui {
        file.enable_web_ui = enable_web_ui;
    }

    if file.proxy_access_key.trim().is_empty() {
        return Err(SettingsError::MissingProxyAccessKey);
    }

    let config: Config = file.into();
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A throwaway config file under the system temp dir, removed on drop.
    struct ScratchFile {
        path: PathBuf,
    }

    impl ScratchFile {
        fn new(label: &str, contents: &str) -> Self {
            let path = std::env::temp_dir().join(format!(
                "relaygate-settings-test-{label}-{}.toml",
                std::process::id()
            ));
            std::fs::write(&path, contents).unwrap();
            Self { path }
        }
    }

    impl Drop for ScratchFile {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.path);
        }
    }

    fn args_with_path(path: PathBuf) -> CliArgs {
        CliArgs {
            config_path: path,
            proxy_access_key: None,
            host: None,
            port: None,
            health_check_path: None,
            enable_web_ui: None,
        }
    }

    #[test]
    fn loads_a_valid_config_file() {
        let file = ScratchFile::new(
            "valid",
            r#"
            current_upstream = "prod"
            proxy_access_key = "secret"

            [[upstreams]]
            name = "prod"
            service_type = "claude"
            base_url = "https://api.anthropic.com"
            api_keys = ["sk-ant-1"]
            "#,
        );
        let config = load_config(&args_with_path(file.path.clone())).unwrap();
        assert_eq!(config.current_upstream, "prod");
        assert_eq!(config.proxy_access_key, "secret");
    }

    #[test]
    fn cli_override_takes_precedence_over_file_value() {
        let file = ScratchFile::new(
            "override",
            r#"
            current_upstream = "prod"
            proxy_access_key = "from-file"
            port = 9000

            [[upstreams]]
            name = "prod"
            service_type = "claude"
            base_url = "https://api.anthropic.com"
            api_keys = ["sk-ant-1"]
            "#,
        );
        let mut args = args_with_path(file.path.clone());
        args.proxy_access_key = Some("from-cli".to_string());
        args.port = Some(1234);
        let config = load_config(&args).unwrap();
        assert_eq!(config.proxy_access_key, "from-cli");
        assert_eq!(config.port, 1234);
    }

    #[test]
    fn missing_proxy_access_key_is_rejected() {
        let file = ScratchFile::new(
            "missing-key",
            r#"
            current_upstream = "prod"
            proxy_access_key = ""

            [[upstreams]]
            name = "prod"
            service_type = "claude"
            base_url = "https://api.anthropic.com"
            api_keys = ["sk-ant-1"]
            "#,
        );
        let err = load_config(&args_with_path(file.path.clone())).unwrap_err();
        assert!(matches!(err, SettingsError::MissingProxyAccessKey));
    }

    #[test]
    fn missing_file_surfaces_a_read_error() {
        let err = load_config(&args_with_path(PathBuf::from("/nonexistent/relaygate.toml"))).unwrap_err();
        assert!(matches!(err, SettingsError::Read { .. }));
    }
}

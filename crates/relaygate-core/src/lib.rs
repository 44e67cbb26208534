//! Protocol-agnostic core of the relaygate proxy process: configuration
//! loading, the shared upstream HTTP client cache, the typed `ProxyError`
//! taxonomy, and the Request Router failover loop that ties the Key
//! Scheduler, the Failure Classifier, and the provider adapters together.

pub mod config_store;
pub mod engine;
pub mod error;
pub mod http_client;
pub mod settings;

pub use config_store::ConfigStore;
pub use engine::{route_request, AppState, RouterResponse};
pub use error::{LastFailure, ProxyError};
pub use http_client::{HttpClientCache, HttpClientError};
pub use settings::{load_config, CliArgs, SettingsError};

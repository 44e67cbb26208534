//! Protocol-agnostic core of the relaygate proxy: the upstream configuration
//! model, the Key Scheduler, the Failure Classifier, and the `ProviderAdapter`
//! trait every protocol adapter in `relaygate-provider-impl` implements.

pub mod adapter;
pub mod classify;
pub mod config;
pub mod decoder;
pub mod errors;
pub mod scheduler;

pub use adapter::{strip_client_auth_headers, AdaptedRequest, ProviderAdapter, UpstreamHttpRequest};
pub use classify::{classify, ClassifyOutcome, FailoverInfo, HtmlReason};
pub use config::{Config, ConfigError, ConfigFile, LoadBalance, ServiceType, UpstreamChannel, UpstreamChannelFile};
pub use decoder::{DecoderState, ToolBlockState};
pub use errors::{ProviderError, ProviderResult};
pub use scheduler::{KeyScheduler, SchedulerError};

use thiserror::Error;

/// Errors an adapter can raise while building an upstream request or
/// translating an upstream response. Distinct from transport/HTTP failures,
/// which the Failure Classifier handles instead.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{0} does not support this operation")]
    Unsupported(&'static str),
    #[error("invalid upstream channel configuration: {0}")]
    InvalidConfig(String),
    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

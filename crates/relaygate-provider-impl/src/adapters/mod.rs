pub mod claude;
pub mod gemini;
pub mod openai;
pub mod openai_old;

use std::sync::Arc;

use relaygate_provider_core::{ProviderAdapter, ServiceType};

/// Returns the adapter for a service type. Adapters are stateless, so one
/// `Arc` per type is cheap to construct per request; callers that want to
/// avoid the allocation can cache these behind the `Config`/`AppState` layer.
pub fn for_service_type(service_type: ServiceType) -> Arc<dyn ProviderAdapter> {
    match service_type {
        ServiceType::Claude => Arc::new(claude::ClaudeAdapter),
        ServiceType::Openai => Arc::new(openai::OpenAiAdapter),
        ServiceType::OpenaiOld => Arc::new(openai_old::OpenAiLegacyAdapter),
        ServiceType::Gemini => Arc::new(gemini::GeminiAdapter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_service_type_has_an_adapter() {
        for service_type in [
            ServiceType::Claude,
            ServiceType::Openai,
            ServiceType::OpenaiOld,
            ServiceType::Gemini,
        ] {
            let _ = for_service_type(service_type);
        }
    }
}

//! Concrete `ProviderAdapter` implementations (Claude, OpenAI, legacy OpenAI
//! completions, Gemini), the Event Emitter that builds Claude SSE frames,
//! and the Stream Pump that drives an adapter's decoder over an upstream
//! byte stream.

pub mod adapters;
pub mod emitter;
pub mod pump;
pub mod stop_reason;

pub use adapters::for_service_type;
pub use pump::{pump, PumpError};

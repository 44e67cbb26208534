//! Pure, provider-agnostic translation helpers shared by the adapters in
//! `relaygate-provider-impl`: JSON-Schema cleaning and the Claude-canonical
//! to OpenAI/Gemini message-shape conversions.

pub mod gemini_messages;
pub mod openai_messages;
pub mod schema;

pub use schema::clean_schema;

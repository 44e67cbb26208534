//! Wire-level types for every protocol this proxy speaks, plus the
//! canonical intermediate representation and the SSE framing primitives
//! shared by all of them.

pub mod canonical;
pub mod claude;
pub mod gemini;
pub mod openai;
pub mod sse;

pub use canonical::{
    CanonicalMessage, CanonicalRequest, ContentBlock, ImageSource, Role, ToolResultContent,
    ToolSpec, normalize_role,
};
pub use sse::{SseEvent, SseParser, encode_frame};

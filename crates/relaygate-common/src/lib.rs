//! Shared, dependency-light helpers used across the relaygate workspace.

pub mod ids;

pub use ids::{new_block_id, new_message_id};

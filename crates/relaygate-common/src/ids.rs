use rand::Rng;
use rand::distr::Alphanumeric;

/// Opaque identifiers are 24 lowercase/alphanumeric characters, unique enough
/// per-process that collisions are not a practical concern within one stream.
fn random_suffix(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect()
}

/// A fresh Claude-shaped message id, e.g. `msg_01abc...`.
pub fn new_message_id() -> String {
    format!("msg_{}", random_suffix(24))
}

/// A fresh Claude-shaped tool-use block id, e.g. `toolu_01abc...`.
pub fn new_block_id() -> String {
    format!("toolu_{}", random_suffix(24))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_ids_are_unique_and_long_enough() {
        let a = new_message_id();
        let b = new_message_id();
        assert_ne!(a, b);
        assert!(a.len() >= 10);
        assert!(a.starts_with("msg_"));
    }

    #[test]
    fn block_ids_have_tool_prefix() {
        let id = new_block_id();
        assert!(id.starts_with("toolu_"));
        assert!(id.len() >= 10);
    }
}

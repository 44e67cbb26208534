//! Per-stream state the Stream Pump hands to an adapter's `decode_line` on
//! every line, so the adapter can assign Claude content-block indices and
//! accumulate partial tool-call arguments. Scoped to a single request's
//! stream; never shared across requests.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct ToolBlockState {
    pub block_index: u32,
    pub id: String,
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Default)]
pub struct DecoderState {
    next_block_index: u32,
    text_block: Option<u32>,
    /// Keyed by the upstream's own notion of "which tool call is this" (for
    /// example OpenAI's `tool_calls[].index`), not the Claude block index.
    tool_blocks: HashMap<u32, ToolBlockState>,
    message_id: String,
    model: String,
    message_started: bool,
    message_stopped: bool,
}

impl DecoderState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-loads the message id and model a `message_start` event should
    /// carry, so adapters can emit it the first time they see output without
    /// needing those values threaded through every `decode_line` call.
    pub fn with_message(message_id: String, model: String) -> Self {
        Self {
            message_id,
            model,
            ..Self::default()
        }
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns `true` the first time it's called on a given state, `false`
    /// every time after. Lets the Stream Pump emit `message_start` exactly
    /// once per stream.
    pub fn take_message_start(&mut self) -> bool {
        if self.message_started {
            return false;
        }
        self.message_started = true;
        true
    }

    /// Mirrors [`Self::take_message_start`] for `message_stop`: `true` the
    /// first time, `false` after. Lets the Stream Pump guarantee exactly one
    /// terminal `message_stop` even if an adapter already forwarded the
    /// upstream's own one (Claude passthrough marks it via this method too).
    pub fn take_message_stop(&mut self) -> bool {
        if self.message_stopped {
            return false;
        }
        self.message_stopped = true;
        true
    }

    /// Allocates the next Claude content-block index without recording it
    /// against any particular slot. Used by adapters (Gemini) whose tool
    /// calls arrive whole, with no incremental accumulation to key on.
    pub fn take_next_index(&mut self) -> u32 {
        let index = self.next_block_index;
        self.next_block_index += 1;
        index
    }

    /// Returns `(index, newly_opened)` for the text block, opening one if
    /// this is the first text delta seen in the stream.
    pub fn open_text_block(&mut self) -> (u32, bool) {
        if let Some(index) = self.text_block {
            return (index, false);
        }
        let index = self.take_next_index();
        self.text_block = Some(index);
        (index, true)
    }

    pub fn text_block_index(&self) -> Option<u32> {
        self.text_block
    }

    pub fn close_text_block(&mut self) -> Option<u32> {
        self.text_block.take()
    }

    /// Returns `(block_index, newly_opened)` for the tool call at
    /// `provider_index`, allocating a fresh Claude block index the first
    /// time this provider_index is seen.
    pub fn tool_block_index(&mut self, provider_index: u32) -> (u32, bool) {
        if let Some(state) = self.tool_blocks.get(&provider_index) {
            return (state.block_index, false);
        }
        let block_index = self.take_next_index();
        self.tool_blocks.insert(
            provider_index,
            ToolBlockState {
                block_index,
                ..Default::default()
            },
        );
        (block_index, true)
    }

    pub fn tool_block_mut(&mut self, provider_index: u32) -> Option<&mut ToolBlockState> {
        self.tool_blocks.get_mut(&provider_index)
    }

    pub fn tool_block(&self, provider_index: u32) -> Option<&ToolBlockState> {
        self.tool_blocks.get(&provider_index)
    }

    pub fn open_tool_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.tool_blocks.values().map(|s| s.block_index)
    }
}

//! Stream Pump: turns a raw upstream byte stream into a stream of
//! SSE-framed Claude events, by running every line through the adapter's
//! `decode_line` against a decoder state scoped to this one pump.

use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::stream::{unfold, Stream, StreamExt};
use relaygate_protocol::sse::SseParser;
use relaygate_provider_core::{DecoderState, ProviderAdapter};

use crate::emitter;

#[derive(Debug)]
pub struct PumpError(pub String);

impl fmt::Display for PumpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "upstream stream error: {}", self.0)
    }
}

impl std::error::Error for PumpError {}

type BoxedByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, PumpError>> + Send>>;

struct PumpState {
    upstream: BoxedByteStream,
    parser: SseParser,
    decoder: DecoderState,
    pending: VecDeque<Bytes>,
    adapter: Arc<dyn ProviderAdapter>,
    finished: bool,
}

/// Wraps any upstream byte stream (errors already converted to [`PumpError`])
/// into a stream of output SSE frames. Each `(event, data)` line the SSE
/// parser extracts is handed to the adapter's `decode_line`; whatever bytes
/// come back are queued and emitted before the pump reads further upstream
/// bytes, so output ordering matches input ordering.
pub fn pump<S>(
    adapter: Arc<dyn ProviderAdapter>,
    upstream: S,
    message_id: String,
    model: String,
) -> impl Stream<Item = Result<Bytes, PumpError>>
where
    S: Stream<Item = Result<Bytes, PumpError>> + Send + 'static,
{
    let mut decoder = DecoderState::with_message(message_id, model);
    let mut pending = VecDeque::new();
    // message_start is emitted here, unconditionally, before a single
    // upstream byte has been read — no adapter is trusted to guarantee it.
    if decoder.take_message_start() {
        pending.push_back(emitter::message_start(decoder.message_id(), decoder.model()));
    }

    let state = PumpState {
        upstream: Box::pin(upstream),
        parser: SseParser::new(),
        decoder,
        pending,
        adapter,
        finished: false,
    };

    unfold(state, |mut state| async move {
        loop {
            if let Some(frame) = state.pending.pop_front() {
                return Some((Ok(frame), state));
            }
            if state.finished {
                return None;
            }
            match state.upstream.next().await {
                Some(Ok(bytes)) => {
                    let events = state.parser.push_bytes(&bytes);
                    for event in events {
                        let frames =
                            state
                                .adapter
                                .decode_line(event.event.as_deref(), &event.data, &mut state.decoder);
                        state.pending.extend(frames);
                    }
                    continue;
                }
                Some(Err(err)) => return Some((Err(err), state)),
                None => {
                    let events = state.parser.finish();
                    for event in events {
                        let frames =
                            state
                                .adapter
                                .decode_line(event.event.as_deref(), &event.data, &mut state.decoder);
                        state.pending.extend(frames);
                    }
                    // Guarantee exactly one terminal message_stop even if the
                    // upstream never sent a finish_reason / message_stop of
                    // its own (e.g. a dropped connection after partial
                    // content).
                    if state.decoder.take_message_stop() {
                        state.pending.push_back(emitter::message_stop());
                    }
                    state.finished = true;
                    continue;
                }
            }
        }
    })
}

//! The SSE relay: one upstream event stream in, one framed HTTP body out.
//!
//! The relay forwards events unbuffered and in order. Around them it weaves
//! the invocation's payment proof: a proof already captured when the
//! connection opens goes out first, and a proof that appears mid-stream is
//! emitted before the next forwarded event. A proof value is never sent
//! twice on the same connection. `done` and `error` are terminal — nothing
//! is written after them.

use std::sync::Arc;

use async_stream::stream;
use futures::{Stream, StreamExt};
use tracing::error;

use paystream_client::{EventStream, ProofLedger};
use paystream_core::event::StreamEvent;
use paystream_core::sse::SseFrame;
use paystream_core::types::InvocationId;

const ENCODE_FAILURE_FRAME: &str = r#"{"type":"error","msg":"event serialization failed"}"#;

/// Ties the ledger entry's lifetime to the relay itself: the proof is
/// evicted when the relay stream is dropped, whether it ran to completion
/// or the client disconnected mid-flight.
struct EvictOnDrop {
    ledger: Arc<ProofLedger>,
    invocation: InvocationId,
}

impl Drop for EvictOnDrop {
    fn drop(&mut self) {
        self.ledger.evict(self.invocation);
    }
}

/// Translate one invocation's events into SSE frames.
pub fn relay(
    invocation: InvocationId,
    mut events: EventStream<'static>,
    ledger: Arc<ProofLedger>,
) -> impl Stream<Item = SseFrame> + Send + 'static {
    stream! {
        let guard = EvictOnDrop { ledger, invocation };
        let mut last_sent: Option<String> = None;

        // A proof captured by the outbound call before this stream opened
        // is delivered ahead of any agent event.
        if let Some(frame) = fresh_proof_frame(&guard, &mut last_sent) {
            yield frame;
        }

        while let Some(item) = events.next().await {
            if let Some(frame) = fresh_proof_frame(&guard, &mut last_sent) {
                yield frame;
            }

            let event = match item {
                Ok(event) => event,
                // Terminal for this connection; headers are long committed,
                // so the failure travels in-band.
                Err(err) => StreamEvent::error(err.to_string()),
            };

            match SseFrame::from_event(&event) {
                Ok(frame) => {
                    yield frame;
                    if event.is_terminal() {
                        break;
                    }
                }
                Err(err) => {
                    error!("failed to encode stream event: {err}");
                    yield SseFrame::new(ENCODE_FAILURE_FRAME);
                    break;
                }
            }
        }
    }
}

/// The invocation's current proof, if it has not yet been sent on this
/// connection.
fn fresh_proof_frame(guard: &EvictOnDrop, last_sent: &mut Option<String>) -> Option<SseFrame> {
    let proof = guard.ledger.get(guard.invocation)?;
    if last_sent.as_deref() == Some(proof.as_str()) {
        return None;
    }
    let frame = SseFrame::payment_proof(&proof);
    *last_sent = Some(proof);
    Some(frame)
}

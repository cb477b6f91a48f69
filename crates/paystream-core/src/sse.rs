//! Server-Sent Events framing.
//!
//! One frame per event, `data: <json>\n\n`, with an optional `event:` name
//! line for synthetic frames (payment proofs). The decoder is incremental:
//! feed it raw body chunks and collect whole frames as they complete,
//! regardless of where chunk boundaries fall.

use serde_json::json;

use crate::error::Result;
use crate::event::StreamEvent;

/// One SSE frame: an optional event name and a data payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

impl SseFrame {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            event: None,
            data: data.into(),
        }
    }

    pub fn named(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: Some(event.into()),
            data: data.into(),
        }
    }

    /// Frame for a forwarded invocation event.
    pub fn from_event(event: &StreamEvent) -> Result<Self> {
        Ok(Self::new(serde_json::to_string(event)?))
    }

    /// Synthetic `event: payment` frame carrying a captured proof header.
    pub fn payment_proof(proof: &str) -> Self {
        Self::named("payment", json!({ "proof": proof }).to_string())
    }

    /// Serialize to the wire text, terminating blank line included.
    pub fn encode(&self) -> String {
        match &self.event {
            Some(name) => format!("event: {name}\ndata: {}\n\n", self.data),
            None => format!("data: {}\n\n", self.data),
        }
    }

    /// Decode the data payload as an invocation event.
    pub fn to_event(&self) -> Result<StreamEvent> {
        Ok(serde_json::from_str(&self.data)?)
    }
}

/// Incremental SSE decoder.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and drain every frame it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buf.windows(2).position(|w| w == b"\n\n") {
            let raw = self.buf[..pos].to_vec();
            self.buf.drain(..pos + 2);
            if let Some(frame) = parse_frame(&String::from_utf8_lossy(&raw)) {
                frames.push(frame);
            }
        }
        frames
    }
}

fn parse_frame(text: &str) -> Option<SseFrame> {
    let mut event = None;
    let mut data_lines: Vec<&str> = Vec::new();

    for line in text.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.starts_with(':') {
            // comment line
            continue;
        }
        if let Some(rest) = line.strip_prefix("event:") {
            event = Some(rest.trim_start().to_string());
        } else if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.strip_prefix(' ').unwrap_or(rest));
        }
        // other fields (id:, retry:) are not part of this protocol
    }

    if event.is_none() && data_lines.is_empty() {
        return None;
    }
    Some(SseFrame {
        event,
        data: data_lines.join("\n"),
    })
}

use serde::{Deserialize, Serialize};

/// Event kinds an invocation stream can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Status,
    Message,
    Payment,
    Done,
    Error,
}

/// Settlement details for one micropayment, as reported by the upstream
/// emitter once a signed call has cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub success: bool,
    pub network: String,
    pub transaction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
}

/// Union of all events one invocation can produce.
///
/// Wire shape is `{"type": "...", "msg": ...}`; `done` carries no payload.
/// `message` events are incremental text fragments — consumers concatenate
/// them in emission order to reconstruct the full response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Status { msg: String },
    Message { msg: String },
    Payment { msg: PaymentReceipt },
    Done,
    Error { msg: String },
}

impl StreamEvent {
    pub fn status(msg: impl Into<String>) -> Self {
        Self::Status { msg: msg.into() }
    }

    pub fn message(msg: impl Into<String>) -> Self {
        Self::Message { msg: msg.into() }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error { msg: msg.into() }
    }

    /// Get the event kind
    pub fn kind(&self) -> EventKind {
        match self {
            StreamEvent::Status { .. } => EventKind::Status,
            StreamEvent::Message { .. } => EventKind::Message,
            StreamEvent::Payment { .. } => EventKind::Payment,
            StreamEvent::Done => EventKind::Done,
            StreamEvent::Error { .. } => EventKind::Error,
        }
    }

    /// True for `done` and `error`, after which a stream must not yield
    /// further events.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done | StreamEvent::Error { .. })
    }
}

impl PaymentReceipt {
    pub fn new(success: bool, network: impl Into<String>, transaction: impl Into<String>) -> Self {
        Self {
            success,
            network: network.into(),
            transaction: transaction.into(),
            payer: None,
        }
    }

    pub fn with_payer(mut self, payer: impl Into<String>) -> Self {
        self.payer = Some(payer.into());
        self
    }
}

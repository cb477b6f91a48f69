use thiserror::Error;

use paystream_core::types::{AgentDescriptor, AskRequest, InvocationId};

use crate::signer::SignerError;
use crate::stream::EventStream;

// Error types
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("upstream request failed: {message}")]
    Upstream { message: String },
    #[error("upstream requires payment and no signer is configured")]
    PaymentRequired,
    #[error("payment signing failed: {message}")]
    Signer { message: String },
    #[error("invalid configuration: {message}")]
    Config { message: String },
    #[error("failed to decode upstream event: {source}")]
    Decode {
        #[from]
        source: serde_json::Error,
    },
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Upstream {
            message: err.to_string(),
        }
    }
}

impl From<SignerError> for ClientError {
    fn from(err: SignerError) -> Self {
        ClientError::Signer {
            message: err.to_string(),
        }
    }
}

/// The three upstream calls the proxy makes.
///
/// Every ask carries the [`InvocationId`] it serves so captured payment
/// proofs can be attributed to exactly one connection.
#[async_trait::async_trait]
pub trait AgentApi: Send + Sync {
    /// Fetch the agent catalog.
    async fn list_agents(&self) -> Result<Vec<AgentDescriptor>, ClientError>;

    /// Start a streaming ask and return its event stream.
    async fn ask_stream(
        &self,
        invocation: InvocationId,
        request: &AskRequest,
    ) -> Result<EventStream<'static>, ClientError>;

    /// Non-streaming ask; returns the full response text.
    async fn ask_send(
        &self,
        invocation: InvocationId,
        request: &AskRequest,
    ) -> Result<String, ClientError>;
}

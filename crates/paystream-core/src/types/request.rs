use serde::{Deserialize, Serialize};

use crate::JsonValue;
use crate::types::ids::AgentId;

/// One ask, as sent upstream. Created per HTTP call; not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskRequest {
    #[serde(alias = "agentId")]
    pub agent: AgentId,
    pub input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonValue>,
}

impl AskRequest {
    pub fn new(agent: impl Into<AgentId>, input: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            input: input.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Body of a non-streaming ask answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
    pub response: String,
}

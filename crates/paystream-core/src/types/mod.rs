pub mod agent;
pub mod ids;
pub mod request;

pub use agent::AgentDescriptor;
pub use ids::{AgentId, InvocationId};
pub use request::{AskRequest, AskResponse};

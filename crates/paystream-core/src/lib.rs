pub mod error;
pub mod event;
pub mod sse;
pub mod types;

pub use error::{ProxyError, Result};
/// Re-export to ensure the same type is used
pub use serde_json::Value as JsonValue;

/// Response header carrying a captured payment proof.
///
/// Lowercase so it can be used with `HeaderName::from_static` on the
/// serving side as well as for case-insensitive lookups on responses.
pub const PAYMENT_PROOF_HEADER: &str = "x-payment-response";

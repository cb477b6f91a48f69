use thiserror::Error;

impl ProxyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ProxyError {
    fn from(err: serde_json::Error) -> Self {
        let msg = format!("Failed to parse JSON: {err}");
        Self::new(msg)
    }
}

#[derive(Error, Debug)]
#[error("paystream error: {message}")]
pub struct ProxyError {
    pub message: String,
}

pub type Result<T> = std::result::Result<T, ProxyError>;

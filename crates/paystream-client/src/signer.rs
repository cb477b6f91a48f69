//! Payment authorization signing.
//!
//! When the upstream rejects a call with HTTP 402 it returns a challenge
//! describing the required payment. A [`PaymentSigner`] turns that challenge
//! into an `X-PAYMENT` header value; the transport retries the call once
//! with the header attached. The signing scheme itself is a pluggable seam —
//! [`Secp256k1Signer`] covers networks settled with ECDSA keys.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use secp256k1::hashes::sha256;
use secp256k1::{Message, SECP256K1, SecretKey};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use paystream_core::JsonValue;

/// Request header carrying the signed payment authorization.
pub const PAYMENT_HEADER: &str = "x-payment";

#[derive(Error, Debug)]
pub enum SignerError {
    #[error("invalid signing key: {0}")]
    InvalidKey(String),
    #[error("failed to encode challenge payload: {0}")]
    Payload(String),
}

/// A 402 challenge as received from upstream, paired with the network the
/// proxy is configured to pay on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentChallenge {
    pub network: String,
    pub body: JsonValue,
}

impl PaymentChallenge {
    pub fn new(network: impl Into<String>, body: JsonValue) -> Self {
        Self {
            network: network.into(),
            body,
        }
    }

    /// Deterministic byte encoding of the challenge, the input to signing.
    pub fn canonical_payload(&self) -> Result<Vec<u8>, SignerError> {
        serde_json::to_vec(&json!({
            "network": self.network,
            "challenge": self.body,
        }))
        .map_err(|err| SignerError::Payload(err.to_string()))
    }
}

/// Produces an `X-PAYMENT` header value for a challenge.
pub trait PaymentSigner: Send + Sync {
    fn sign(&self, challenge: &PaymentChallenge) -> Result<String, SignerError>;
}

/// ECDSA signer over secp256k1, keyed by a hex-encoded secret key.
pub struct Secp256k1Signer {
    secret_key: SecretKey,
}

impl Secp256k1Signer {
    pub fn from_hex(secret_hex: &str) -> Result<Self, SignerError> {
        let bytes = hex::decode(secret_hex.trim())
            .map_err(|err| SignerError::InvalidKey(err.to_string()))?;
        let secret_key = SecretKey::from_slice(&bytes)
            .map_err(|err| SignerError::InvalidKey(err.to_string()))?;
        Ok(Self { secret_key })
    }
}

impl PaymentSigner for Secp256k1Signer {
    fn sign(&self, challenge: &PaymentChallenge) -> Result<String, SignerError> {
        let payload = challenge.canonical_payload()?;
        let message = Message::from_hashed_data::<sha256::Hash>(&payload);
        let signature = SECP256K1.sign_ecdsa(&message, &self.secret_key);
        Ok(BASE64.encode(signature.serialize_compact()))
    }
}

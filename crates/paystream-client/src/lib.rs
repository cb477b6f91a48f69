pub mod api;
pub mod http;
pub mod ledger;
pub mod signer;
pub mod stream;

pub use api::{AgentApi, ClientError};
pub use http::HttpAgentApi;
pub use ledger::ProofLedger;
pub use signer::{PaymentChallenge, PaymentSigner, Secp256k1Signer, SignerError};
pub use stream::EventStream;

use std::sync::Arc;

use futures::{StreamExt, TryStreamExt};
use log::{debug, warn};
use reqwest::{Client as HttpClient, StatusCode, Url};

use paystream_core::event::StreamEvent;
use paystream_core::sse::SseDecoder;
use paystream_core::types::{AgentDescriptor, AskRequest, AskResponse, InvocationId};
use paystream_core::{JsonValue, PAYMENT_PROOF_HEADER};

use crate::api::{AgentApi, ClientError};
use crate::ledger::ProofLedger;
use crate::signer::{PAYMENT_HEADER, PaymentChallenge, PaymentSigner};
use crate::stream::EventStream;

/// Request header carrying the upstream API key.
const API_KEY_HEADER: &str = "x-api-key";

struct SigningConfig {
    network: String,
    signer: Arc<dyn PaymentSigner>,
}

/// Reqwest-backed [`AgentApi`] implementation.
///
/// Every ask response is inspected for a payment-proof header, which is
/// recorded in the shared [`ProofLedger`] under the ask's invocation id.
pub struct HttpAgentApi {
    http_client: HttpClient,
    base_url: Url,
    api_key: Option<String>,
    ledger: Arc<ProofLedger>,
    signing: Option<SigningConfig>,
}

impl HttpAgentApi {
    pub fn new(base_url: &str, ledger: Arc<ProofLedger>) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(base_url).map_err(|err| ClientError::Config {
            message: format!("invalid base url: {err}"),
        })?;
        // Url::join drops the last path segment without this.
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }
        Ok(Self {
            http_client: HttpClient::new(),
            base_url,
            api_key: None,
            ledger,
            signing: None,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Enable payment signing. Calls rejected with 402 are retried once with
    /// a header produced by `signer`.
    pub fn with_signer(
        mut self,
        network: impl Into<String>,
        signer: Arc<dyn PaymentSigner>,
    ) -> Self {
        self.signing = Some(SigningConfig {
            network: network.into(),
            signer,
        });
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url.join(path).map_err(|err| ClientError::Config {
            message: format!("invalid endpoint '{path}': {err}"),
        })
    }

    fn post_json(&self, url: Url, request: &AskRequest) -> reqwest::RequestBuilder {
        let mut builder = self.http_client.post(url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        builder
    }

    /// POST an ask, honoring one 402 round trip, and capture any proof
    /// header on the final response.
    async fn send_with_payment(
        &self,
        invocation: InvocationId,
        url: Url,
        request: &AskRequest,
    ) -> Result<reqwest::Response, ClientError> {
        let response = self.post_json(url.clone(), request).send().await?;

        let response = if response.status() == StatusCode::PAYMENT_REQUIRED {
            let Some(signing) = &self.signing else {
                return Err(ClientError::PaymentRequired);
            };
            let body = response.json::<JsonValue>().await.unwrap_or(JsonValue::Null);
            let challenge = PaymentChallenge::new(signing.network.clone(), body);
            let header = signing.signer.sign(&challenge)?;
            debug!("retrying {invocation} with signed payment header");

            let retried = self
                .post_json(url, request)
                .header(PAYMENT_HEADER, header)
                .send()
                .await?;
            if retried.status() == StatusCode::PAYMENT_REQUIRED {
                return Err(ClientError::Upstream {
                    message: "payment was not accepted by upstream".to_string(),
                });
            }
            retried
        } else {
            response
        };

        self.capture_proof(invocation, &response);
        Ok(response)
    }

    /// Header capture never fails; a missing header is simply not a proof.
    fn capture_proof(&self, invocation: InvocationId, response: &reqwest::Response) {
        if let Some(proof) = response
            .headers()
            .get(PAYMENT_PROOF_HEADER)
            .and_then(|value| value.to_str().ok())
        {
            debug!("captured payment proof for {invocation}");
            self.ledger.record(invocation, proof);
        }
    }
}

#[async_trait::async_trait]
impl AgentApi for HttpAgentApi {
    async fn list_agents(&self) -> Result<Vec<AgentDescriptor>, ClientError> {
        let url = self.endpoint("agents")?;
        let mut builder = self.http_client.get(url);
        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        let agents = builder
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<AgentDescriptor>>()
            .await?;
        Ok(agents)
    }

    async fn ask_stream(
        &self,
        invocation: InvocationId,
        request: &AskRequest,
    ) -> Result<EventStream<'static>, ClientError> {
        let url = self.endpoint("ask/stream")?;
        let response = self
            .send_with_payment(invocation, url, request)
            .await?
            .error_for_status()?;

        let mut decoder = SseDecoder::new();
        let stream = response
            .bytes_stream()
            .map_err(ClientError::from)
            .map_ok(move |chunk: bytes::Bytes| {
                let events: Vec<Result<StreamEvent, ClientError>> = decoder
                    .feed(&chunk)
                    .into_iter()
                    .filter_map(|frame| match frame.to_event() {
                        Ok(event) => Some(Ok(event)),
                        Err(err) => {
                            // Matches the browser parser: malformed frames
                            // are dropped, not fatal.
                            warn!("skipping malformed upstream frame: {err}");
                            None
                        }
                    })
                    .collect();
                futures::stream::iter(events)
            })
            .try_flatten()
            .boxed();

        Ok(stream)
    }

    async fn ask_send(
        &self,
        invocation: InvocationId,
        request: &AskRequest,
    ) -> Result<String, ClientError> {
        let url = self.endpoint("ask/send")?;
        let body = self
            .send_with_payment(invocation, url, request)
            .await?
            .error_for_status()?
            .json::<AskResponse>()
            .await?;
        Ok(body.response)
    }
}

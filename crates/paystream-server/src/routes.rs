use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderValue, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use paystream_client::{AgentApi, ProofLedger};
use paystream_core::types::{AgentDescriptor, AgentId, AskRequest, AskResponse, InvocationId};
use paystream_core::{JsonValue, PAYMENT_PROOF_HEADER};

use crate::error::ApiError;
use crate::relay;

#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn AgentApi>,
    pub ledger: Arc<ProofLedger>,
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/api/agents", get(list_agents))
        .route("/api/stream", post(ask_stream))
        // Legacy route shape kept for the deployed web client.
        .route("/api/ask", post(ask_stream))
        .route("/api/send", post(ask_send))
        .layer(middleware::from_fn(log_request))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn log_request(request: Request, next: Next) -> Response {
    info!("{} {}", request.method(), request.uri().path());
    next.run(request).await
}

/// Loose body shape shared by both ask variants: `/api/stream` sends
/// `{agent, input, metadata?}`, `/api/ask` sends
/// `{agentId, input, userName?, userId?}`.
#[derive(Debug, Deserialize)]
struct AskPayload {
    #[serde(default, alias = "agentId")]
    agent: Option<AgentId>,
    #[serde(default)]
    input: Option<String>,
    #[serde(default)]
    metadata: Option<JsonValue>,
    #[serde(default, rename = "userName")]
    user_name: Option<String>,
    #[serde(default, rename = "userId")]
    user_id: Option<String>,
}

impl AskPayload {
    fn into_request(self) -> Result<AskRequest, ApiError> {
        let agent = self.agent.filter(|agent| !agent.is_empty());
        let input = self.input.filter(|input| !input.is_empty());
        let (Some(agent), Some(input)) = (agent, input) else {
            return Err(ApiError::bad_request("Missing 'agent' or 'input'"));
        };

        let metadata = self.metadata.or_else(|| {
            let mut fields = serde_json::Map::new();
            if let Some(name) = self.user_name {
                fields.insert("userName".to_string(), name.into());
            }
            if let Some(id) = self.user_id {
                fields.insert("userId".to_string(), id.into());
            }
            (!fields.is_empty()).then(|| JsonValue::Object(fields))
        });

        let mut request = AskRequest::new(agent, input);
        if let Some(metadata) = metadata {
            request = request.with_metadata(metadata);
        }
        Ok(request)
    }
}

async fn list_agents(
    State(state): State<AppState>,
) -> Result<Json<Vec<AgentDescriptor>>, ApiError> {
    let agents = state.api.list_agents().await.map_err(|err| {
        error!("failed to list agents: {err}");
        ApiError::upstream("Failed to list agents")
    })?;
    Ok(Json(agents))
}

async fn ask_stream(
    State(state): State<AppState>,
    Json(payload): Json<AskPayload>,
) -> Result<Response, ApiError> {
    let request = payload.into_request()?;
    let invocation = InvocationId::new();

    // Failures past this point are in-band `error` frames; only setup
    // failures can still change the HTTP status.
    let events = state
        .api
        .ask_stream(invocation, &request)
        .await
        .map_err(|err| {
            error!("stream setup for agent {} failed: {err}", request.agent);
            ApiError::upstream(err.to_string())
        })?;

    let frames = relay::relay(invocation, events, state.ledger.clone())
        .map(|frame| Ok::<_, Infallible>(frame.encode()));

    // Intermediaries must not cache, transform or buffer the stream.
    let response = Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache, no-transform")
        .header(header::CONNECTION, "keep-alive")
        .header("x-accel-buffering", "no")
        .body(Body::from_stream(frames))
        .map_err(|err| ApiError::upstream(err.to_string()))?;
    Ok(response)
}

async fn ask_send(
    State(state): State<AppState>,
    Json(payload): Json<AskPayload>,
) -> Result<Response, ApiError> {
    let request = payload.into_request()?;
    let invocation = InvocationId::new();

    let answer = state
        .api
        .ask_send(invocation, &request)
        .await
        .map_err(|err| {
            error!("ask for agent {} failed: {err}", request.agent);
            ApiError::upstream(err.to_string())
        })?;

    // The invocation is over; its proof leaves the ledger with the response.
    let proof = state.ledger.evict(invocation);

    let mut response = Json(AskResponse { response: answer }).into_response();
    if let Some(proof) = proof {
        if let Ok(value) = HeaderValue::from_str(&proof) {
            response.headers_mut().insert(PAYMENT_PROOF_HEADER, value);
        }
    }
    Ok(response)
}

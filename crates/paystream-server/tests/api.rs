use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use futures::StreamExt;
use futures::stream;
use serde_json::{Value, json};
use tower::ServiceExt;

use paystream_client::{AgentApi, ClientError, EventStream, ProofLedger};
use paystream_core::event::StreamEvent;
use paystream_core::sse::{SseDecoder, SseFrame};
use paystream_core::types::{AgentDescriptor, AskRequest, InvocationId};
use paystream_server::{AppState, app_router};

struct MockAgentApi {
    agents: Vec<AgentDescriptor>,
    events: Vec<StreamEvent>,
    answer: String,
    proof: Option<String>,
    fail_listing: bool,
    ledger: Arc<ProofLedger>,
}

#[async_trait]
impl AgentApi for MockAgentApi {
    async fn list_agents(&self) -> Result<Vec<AgentDescriptor>, ClientError> {
        if self.fail_listing {
            return Err(ClientError::Upstream {
                message: "catalog unavailable".to_string(),
            });
        }
        Ok(self.agents.clone())
    }

    async fn ask_stream(
        &self,
        invocation: InvocationId,
        _request: &AskRequest,
    ) -> Result<EventStream<'static>, ClientError> {
        if let Some(proof) = &self.proof {
            self.ledger.record(invocation, proof);
        }
        let events = self.events.clone();
        Ok(stream::iter(events.into_iter().map(Ok)).boxed())
    }

    async fn ask_send(
        &self,
        invocation: InvocationId,
        _request: &AskRequest,
    ) -> Result<String, ClientError> {
        if let Some(proof) = &self.proof {
            self.ledger.record(invocation, proof);
        }
        Ok(self.answer.clone())
    }
}

fn mock_app(
    events: Vec<StreamEvent>,
    proof: Option<&str>,
    fail_listing: bool,
) -> (Router, Arc<ProofLedger>) {
    let ledger = Arc::new(ProofLedger::new());
    let api = MockAgentApi {
        agents: vec![
            AgentDescriptor::new("a1", "Echo"),
            AgentDescriptor::new("a2", "Sage").with_description("Knows things"),
        ],
        events,
        answer: "hello there".to_string(),
        proof: proof.map(String::from),
        fail_listing,
        ledger: ledger.clone(),
    };
    let state = AppState {
        api: Arc::new(api),
        ledger: ledger.clone(),
    };
    (app_router(state), ledger)
}

async fn post_json(app: Router, uri: &str, body: Value) -> axum::response::Response {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

async fn body_frames(response: axum::response::Response) -> Vec<SseFrame> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    SseDecoder::new().feed(&bytes)
}

fn happy_events() -> Vec<StreamEvent> {
    vec![
        StreamEvent::status("Contacting agent"),
        StreamEvent::message("Hel"),
        StreamEvent::message("lo"),
        StreamEvent::Done,
    ]
}

#[tokio::test]
async fn lists_agents() {
    let (app, _ledger) = mock_app(vec![], None, false);
    let response = app
        .oneshot(Request::builder().uri("/api/agents").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let agents: Vec<AgentDescriptor> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(agents.len(), 2);
    assert_eq!(agents[1].description.as_deref(), Some("Knows things"));
}

#[tokio::test]
async fn listing_failure_maps_to_500() {
    let (app, _ledger) = mock_app(vec![], None, true);
    let response = app
        .oneshot(Request::builder().uri("/api/agents").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({"error": "Failed to list agents"}));
}

#[tokio::test]
async fn missing_input_is_a_400() {
    let (app, _ledger) = mock_app(happy_events(), None, false);
    let response = post_json(app, "/api/stream", json!({"agent": "a1"})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({"error": "Missing 'agent' or 'input'"}));
}

#[tokio::test]
async fn empty_agent_is_a_400() {
    let (app, _ledger) = mock_app(happy_events(), None, false);
    let response = post_json(app, "/api/stream", json!({"agent": "", "input": "hi"})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn streams_events_with_no_buffering_headers() {
    let (app, _ledger) = mock_app(happy_events(), None, false);
    let response = post_json(app, "/api/stream", json!({"agent": "a1", "input": "hi"})).await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "text/event-stream");
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache, no-transform");
    assert_eq!(headers["x-accel-buffering"], "no");

    let frames = body_frames(response).await;
    let events: Vec<StreamEvent> = frames.iter().map(|f| f.to_event().unwrap()).collect();
    assert_eq!(events, happy_events());

    // Exactly one terminal frame, and it is the last one.
    assert_eq!(events.last(), Some(&StreamEvent::Done));
    assert_eq!(
        events.iter().filter(|e| e.is_terminal()).count(),
        1
    );

    // No payment frame was injected, since nothing was captured.
    assert!(frames.iter().all(|f| f.event.is_none()));

    let text: String = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Message { msg } => Some(msg.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(text, "Hello");
}

#[tokio::test]
async fn legacy_ask_route_accepts_agent_id_shape() {
    let (app, _ledger) = mock_app(happy_events(), None, false);
    let response = post_json(
        app,
        "/api/ask",
        json!({"agentId": "a1", "input": "hi", "userName": "web-client"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let frames = body_frames(response).await;
    assert_eq!(frames.last().unwrap().to_event().unwrap(), StreamEvent::Done);
}

#[tokio::test]
async fn captured_proof_leads_the_stream_and_is_evicted() {
    let (app, ledger) = mock_app(happy_events(), Some("proof-1"), false);
    let response = post_json(app, "/api/stream", json!({"agent": "a1", "input": "hi"})).await;

    let frames = body_frames(response).await;
    assert_eq!(frames[0], SseFrame::payment_proof("proof-1"));
    assert_eq!(
        frames
            .iter()
            .filter(|f| f.event.as_deref() == Some("payment"))
            .count(),
        1
    );

    // Fully consumed stream leaves nothing behind.
    assert!(ledger.is_empty());
}

#[tokio::test]
async fn send_returns_answer_and_proof_header() {
    let (app, ledger) = mock_app(vec![], Some("proof-send"), false);
    let response = post_json(app, "/api/send", json!({"agent": "a1", "input": "hi"})).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-payment-response"], "proof-send");

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({"response": "hello there"}));

    assert!(ledger.is_empty());
}

#[tokio::test]
async fn send_without_proof_has_no_header() {
    let (app, _ledger) = mock_app(vec![], None, false);
    let response = post_json(app, "/api/send", json!({"agent": "a1", "input": "hi"})).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-payment-response").is_none());
}

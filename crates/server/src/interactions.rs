use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use ticketbot_discord::{
    events::{HandlerResult, InteractionContext, InteractionRouter},
    payload::parse_interaction,
    verify::{SignatureVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER},
};
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct InteractionsState {
    verifier: Arc<SignatureVerifier>,
    router: Arc<InteractionRouter>,
}

impl InteractionsState {
    pub fn new(verifier: SignatureVerifier, router: InteractionRouter) -> Self {
        Self { verifier: Arc::new(verifier), router: Arc::new(router) }
    }

    pub fn handler_count(&self) -> usize {
        self.router.handler_count()
    }
}

pub fn router(state: InteractionsState) -> Router {
    Router::new().route("/interactions", post(interactions)).with_state(state)
}

/// Discord's interactions endpoint. The reply to each interaction is the HTTP response body.
pub async fn interactions(
    State(state): State<InteractionsState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|value| value.to_str().ok());
    let timestamp = headers.get(TIMESTAMP_HEADER).and_then(|value| value.to_str().ok());
    let (Some(signature), Some(timestamp)) = (signature, timestamp) else {
        warn!(
            event_name = "ingress.discord.signature_missing",
            correlation_id = "unknown",
            "interaction request without signature headers"
        );
        return (StatusCode::UNAUTHORIZED, "missing request signature").into_response();
    };

    if let Err(error) = state.verifier.verify(signature, timestamp, &body) {
        warn!(
            event_name = "ingress.discord.signature_rejected",
            correlation_id = "unknown",
            error = %error,
            "interaction signature rejected"
        );
        return (StatusCode::UNAUTHORIZED, "invalid request signature").into_response();
    }

    let envelope = match parse_interaction(&body) {
        Ok(envelope) => envelope,
        Err(error) => {
            warn!(
                event_name = "ingress.discord.payload_rejected",
                correlation_id = "unknown",
                error = %error,
                "interaction payload could not be decoded"
            );
            return (StatusCode::BAD_REQUEST, "invalid interaction payload").into_response();
        }
    };

    let ctx = InteractionContext::for_envelope(&envelope);
    info!(
        event_name = "ingress.discord.interaction_received",
        correlation_id = %ctx.correlation_id,
        kind = ?envelope.event.kind(),
        user_id = envelope.user_id.as_deref().unwrap_or("unknown"),
        "interaction received"
    );

    match state.router.route(&envelope, &ctx).await {
        HandlerResult::Responded(response) => {
            debug!(
                event_name = "ingress.discord.interaction_responded",
                correlation_id = %ctx.correlation_id,
                callback_type = response.callback_type(),
                "interaction answered"
            );
            (StatusCode::OK, Json(response)).into_response()
        }
        HandlerResult::Ignored => StatusCode::NO_CONTENT.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use ed25519_dalek::{Signer, SigningKey};
    use reqwest::Client;
    use serde_json::{json, Value};
    use ticketbot_core::config::AppConfig;
    use ticketbot_discord::{
        events::ticket_router,
        orchestrator::TicketFormService,
        verify::{SignatureVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER},
    };
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{router, InteractionsState};
    use crate::crm::HubSpotTicketSubmitter;

    const TIMESTAMP: &str = "1730000000";

    fn signing_key() -> SigningKey {
        SigningKey::from_bytes(&[11_u8; 32])
    }

    fn app(crm_base_url: String) -> Router {
        let mut crm = AppConfig::default().crm;
        crm.base_url = crm_base_url;
        crm.api_token = "pat-na1-test".to_string().into();
        let submitter = HubSpotTicketSubmitter::from_config(Client::new(), &crm);
        let verifier =
            SignatureVerifier::from_hex(&hex::encode(signing_key().verifying_key().to_bytes()))
                .expect("valid public key");

        router(InteractionsState::new(
            verifier,
            ticket_router(Arc::new(TicketFormService::new(submitter))),
        ))
    }

    fn signed(body: &Value) -> Request<Body> {
        let bytes = serde_json::to_vec(body).expect("encode");
        let mut message = TIMESTAMP.as_bytes().to_vec();
        message.extend_from_slice(&bytes);
        let signature = hex::encode(signing_key().sign(&message).to_bytes());

        Request::builder()
            .method("POST")
            .uri("/interactions")
            .header("content-type", "application/json")
            .header(SIGNATURE_HEADER, signature)
            .header(TIMESTAMP_HEADER, TIMESTAMP)
            .body(Body::from(bytes))
            .expect("request")
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    fn form_submission(subject: &str, description: &str) -> Value {
        json!({
            "id": "int-form-1",
            "type": 5,
            "member": { "user": { "id": "U1" } },
            "data": {
                "custom_id": "ticketModal",
                "components": [
                    { "type": 1, "components": [
                        { "type": 4, "custom_id": "subject", "value": subject }
                    ]},
                    { "type": 1, "components": [
                        { "type": 4, "custom_id": "description", "value": description }
                    ]}
                ]
            }
        })
    }

    #[tokio::test]
    async fn ping_is_answered_with_pong() {
        let (status, body) =
            send(app("http://127.0.0.1:9".to_string()), signed(&json!({ "id": "p", "type": 1 })))
                .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "type": 1 }));
    }

    #[tokio::test]
    async fn unsigned_and_tampered_requests_are_rejected() {
        let unsigned = Request::builder()
            .method("POST")
            .uri("/interactions")
            .body(Body::from(r#"{"id":"p","type":1}"#))
            .expect("request");
        let (status, _) = send(app("http://127.0.0.1:9".to_string()), unsigned).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let mut tampered = signed(&json!({ "id": "p", "type": 1 }));
        *tampered.body_mut() = Body::from(r#"{"id":"p","type":2}"#);
        let (status, _) = send(app("http://127.0.0.1:9".to_string()), tampered).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn signed_garbage_is_a_bad_request() {
        let (status, _) = send(
            app("http://127.0.0.1:9".to_string()),
            signed(&json!({ "unexpected": true })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_command_gets_no_content() {
        let (status, body) = send(
            app("http://127.0.0.1:9".to_string()),
            signed(&json!({ "id": "c", "type": 2, "data": { "name": "weather" } })),
        )
        .await;

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn ticketform_command_and_submission_create_ticket() {
        let hubspot = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/crm/v3/objects/tickets"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "42" })))
            .expect(1)
            .mount(&hubspot)
            .await;
        let app = app(hubspot.uri());

        let (status, form) = send(
            app.clone(),
            signed(&json!({ "id": "c", "type": 2, "data": { "name": "ticketform" } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(form["type"], json!(9));
        assert_eq!(form["data"]["components"][0]["components"][0]["custom_id"], json!("subject"));
        assert_eq!(
            form["data"]["components"][1]["components"][0]["custom_id"],
            json!("description")
        );

        let (status, reply) =
            send(app, signed(&form_submission("Login issue", "Cannot log in"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply["type"], json!(4));
        assert_eq!(reply["data"]["flags"], json!(64));
        assert!(reply["data"]["content"].as_str().is_some_and(|content| content.contains("42")));
    }

    #[tokio::test]
    async fn crm_outage_replies_with_generic_failure() {
        let hubspot = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .expect(1)
            .mount(&hubspot)
            .await;

        let (status, reply) =
            send(app(hubspot.uri()), signed(&form_submission("Login issue", "Cannot log in")))
                .await;

        assert_eq!(status, StatusCode::OK);
        let content = reply["data"]["content"].as_str().expect("content");
        assert_eq!(content, "❌ There was an error creating your ticket. Please try again later.");
        assert!(!content.contains("500"));
        assert!(!content.contains("exploded"));
    }

    #[tokio::test]
    async fn blank_description_never_reaches_crm() {
        let hubspot = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "1" })))
            .expect(0)
            .mount(&hubspot)
            .await;

        let (status, reply) =
            send(app(hubspot.uri()), signed(&form_submission("Login issue", "  "))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply["data"]["flags"], json!(64));
        assert!(reply["data"]["content"]
            .as_str()
            .is_some_and(|content| content.contains("no ticket was created")));
    }
}

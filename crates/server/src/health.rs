use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

pub const SERVICE_NAME: &str = "ticketbot-server";

#[derive(Clone)]
pub struct HealthState {
    crm_endpoint: String,
}

impl HealthState {
    pub fn new(crm_endpoint: impl Into<String>) -> Self {
        Self { crm_endpoint: crm_endpoint.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub crm_endpoint: String,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

/// Liveness only; the CRM is not called, its endpoint is reported for operators.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let payload = HealthResponse {
        status: "ready",
        service: SERVICE_NAME,
        crm_endpoint: state.crm_endpoint,
        checked_at: Utc::now().to_rfc3339(),
    };
    (StatusCode::OK, Json(payload))
}

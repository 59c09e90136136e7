//! HubSpot ticket creation.
//!
//! One `POST /crm/v3/objects/tickets` per submission, no retries. Every failure is
//! logged here with full detail and folded into [`TicketResult::Failed`].

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use ticketbot_core::{config::CrmConfig, TicketRequest, TicketResult, TicketSubmitter};
use tracing::{info, warn};

const TICKETS_PATH: &str = "/crm/v3/objects/tickets";

#[derive(Debug, Serialize)]
struct CreateTicketBody<'a> {
    properties: TicketProperties<'a>,
}

#[derive(Debug, Serialize)]
struct TicketProperties<'a> {
    hs_ticket_subject: &'a str,
    content: &'a str,
    hs_pipeline: &'a str,
    hs_pipeline_stage: &'a str,
    status: &'a str,
}

pub struct HubSpotTicketSubmitter {
    client: Client,
    base_url: String,
    api_token: SecretString,
    pipeline: String,
    pipeline_stage: String,
    ticket_status: String,
}

impl HubSpotTicketSubmitter {
    pub fn from_config(client: Client, config: &CrmConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            api_token: config.api_token.clone(),
            pipeline: config.pipeline.clone(),
            pipeline_stage: config.pipeline_stage.clone(),
            ticket_status: config.ticket_status.clone(),
        }
    }

    pub fn tickets_url(&self) -> String {
        format!("{}{TICKETS_PATH}", self.base_url.trim_end_matches('/'))
    }

    fn body<'a>(&'a self, request: &'a TicketRequest) -> CreateTicketBody<'a> {
        CreateTicketBody {
            properties: TicketProperties {
                hs_ticket_subject: request.subject(),
                content: request.description(),
                hs_pipeline: &self.pipeline,
                hs_pipeline_stage: &self.pipeline_stage,
                status: &self.ticket_status,
            },
        }
    }

    async fn create(&self, request: &TicketRequest) -> Result<String, String> {
        let response = self
            .client
            .post(self.tickets_url())
            .bearer_auth(self.api_token.expose_secret())
            .json(&self.body(request))
            .send()
            .await
            .map_err(|error| format!("ticket request failed: {error}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("ticket endpoint returned {status}: {body}"));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|error| format!("failed to decode ticket response: {error}"))?;

        ticket_id(&payload).ok_or_else(|| format!("ticket response has no id: {payload}"))
    }
}

/// HubSpot documents `id` as a string; numeric ids are accepted too.
fn ticket_id(payload: &Value) -> Option<String> {
    let id = match payload.get("id")? {
        Value::String(id) => id.trim().to_string(),
        Value::Number(id) => id.to_string(),
        _ => return None,
    };
    (!id.is_empty()).then_some(id)
}

#[async_trait]
impl TicketSubmitter for HubSpotTicketSubmitter {
    async fn submit(&self, request: &TicketRequest) -> TicketResult {
        match self.create(request).await {
            Ok(ticket_id) => {
                info!(
                    event_name = "crm.ticket.created",
                    ticket_id = %ticket_id,
                    "hubspot ticket created"
                );
                TicketResult::Created { ticket_id }
            }
            Err(reason) => {
                warn!(
                    event_name = "crm.ticket.failed",
                    endpoint = %self.tickets_url(),
                    error = %reason,
                    "hubspot ticket creation failed"
                );
                TicketResult::failed(reason)
            }
        }
    }
}

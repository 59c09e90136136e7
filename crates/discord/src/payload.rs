//! Decoding of Discord interaction request bodies.
//!
//! Only the fields the ticket flow needs are read; everything else in the
//! payload is ignored so new Discord fields never break parsing.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use crate::events::{CommandInvocation, FormSubmission, InteractionEnvelope, InteractionEvent};

const PING: u8 = 1;
const APPLICATION_COMMAND: u8 = 2;
const MODAL_SUBMIT: u8 = 5;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("interaction body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("interaction payload is missing `{0}`")]
    MissingField(&'static str),
}

#[derive(Debug, Deserialize)]
struct RawInteraction {
    id: String,
    #[serde(rename = "type")]
    kind: u8,
    data: Option<RawData>,
    member: Option<RawMember>,
    user: Option<RawUser>,
}

#[derive(Debug, Deserialize)]
struct RawData {
    name: Option<String>,
    custom_id: Option<String>,
    #[serde(default)]
    components: Vec<RawComponent>,
}

#[derive(Debug, Deserialize)]
struct RawComponent {
    custom_id: Option<String>,
    value: Option<String>,
    #[serde(default)]
    components: Vec<RawComponent>,
}

#[derive(Debug, Deserialize)]
struct RawMember {
    user: Option<RawUser>,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    id: String,
}

pub fn parse_interaction(body: &[u8]) -> Result<InteractionEnvelope, PayloadError> {
    let raw: RawInteraction = serde_json::from_slice(body)?;

    // Guild interactions carry the user under `member`, DMs under `user`.
    let user_id = raw
        .member
        .and_then(|member| member.user)
        .or(raw.user)
        .map(|user| user.id);

    let event = match raw.kind {
        PING => InteractionEvent::Ping,
        APPLICATION_COMMAND => {
            let name = raw
                .data
                .and_then(|data| data.name)
                .ok_or(PayloadError::MissingField("data.name"))?;
            InteractionEvent::CommandInvoked(CommandInvocation { command_name: name })
        }
        MODAL_SUBMIT => {
            let data = raw.data.ok_or(PayloadError::MissingField("data"))?;
            let form_id = data.custom_id.ok_or(PayloadError::MissingField("data.custom_id"))?;
            let mut fields = BTreeMap::new();
            collect_text_values(&data.components, &mut fields);
            InteractionEvent::FormSubmitted(FormSubmission { form_id, fields })
        }
        other => InteractionEvent::Unsupported { kind: other },
    };

    Ok(InteractionEnvelope { interaction_id: raw.id, user_id, event })
}

fn collect_text_values(components: &[RawComponent], fields: &mut BTreeMap<String, String>) {
    for component in components {
        if let (Some(custom_id), Some(value)) = (&component.custom_id, &component.value) {
            fields.insert(custom_id.clone(), value.clone());
        }
        collect_text_values(&component.components, fields);
    }
}

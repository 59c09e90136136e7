use std::collections::BTreeMap;

use ticketbot_core::{
    ApplicationError, TicketRequest, TicketRequestError, TicketResult, TicketSubmitter,
};
use tracing::{debug, info, warn};

use crate::{
    commands::TICKET_COMMAND_NAME,
    components::{
        ticket_created_message, ticket_form_modal, InteractionResponse, DESCRIPTION_FIELD,
        SUBJECT_FIELD,
    },
    events::InteractionContext,
};

/// Drives the ticket flow: `/ticketform` shows the form, a submitted form becomes a ticket.
pub struct TicketFormService<S> {
    submitter: S,
}

impl<S> TicketFormService<S>
where
    S: TicketSubmitter,
{
    pub fn new(submitter: S) -> Self {
        Self { submitter }
    }

    /// Returns the ticket form for `ticketform`; any other command name is not ours.
    pub fn on_command(&self, command_name: &str) -> Option<InteractionResponse> {
        if command_name != TICKET_COMMAND_NAME {
            return None;
        }
        Some(InteractionResponse::Modal(ticket_form_modal()))
    }

    /// Validates the submitted fields, submits exactly one ticket, and builds the reply.
    ///
    /// Submission failures become an ephemeral apology; only invalid input is returned as
    /// an error, and in that case the submitter is never called.
    pub async fn on_form_submit(
        &self,
        fields: &BTreeMap<String, String>,
        ctx: &InteractionContext,
    ) -> Result<InteractionResponse, TicketRequestError> {
        let request = TicketRequest::from_parts(
            fields.get(SUBJECT_FIELD).map(String::as_str),
            fields.get(DESCRIPTION_FIELD).map(String::as_str),
        )?;

        debug!(
            event_name = "application.ticket.submitting",
            correlation_id = %ctx.correlation_id,
            subject_len = request.subject().len(),
            description_len = request.description().len(),
            "submitting ticket"
        );

        match self.submitter.submit(&request).await {
            TicketResult::Created { ticket_id } => {
                info!(
                    event_name = "application.ticket.created",
                    correlation_id = %ctx.correlation_id,
                    ticket_id = %ticket_id,
                    "ticket created"
                );
                Ok(ticket_created_message(&ticket_id))
            }
            TicketResult::Failed { reason } => {
                let interface =
                    ApplicationError::Integration(reason).into_interface(&ctx.correlation_id);
                warn!(
                    event_name = "application.ticket.failed",
                    correlation_id = %ctx.correlation_id,
                    error = %interface,
                    "ticket creation failed"
                );
                Ok(InteractionResponse::ephemeral(interface.user_message()))
            }
        }
    }
}

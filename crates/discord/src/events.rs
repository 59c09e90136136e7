use std::{collections::BTreeMap, collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;
use ticketbot_core::{ApplicationError, TicketRequestError, TicketSubmitter};
use tracing::{debug, warn};

use crate::{
    commands::TICKET_COMMAND_NAME,
    components::{InteractionResponse, TICKET_FORM_ID},
    orchestrator::TicketFormService,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InteractionEnvelope {
    pub interaction_id: String,
    pub user_id: Option<String>,
    pub event: InteractionEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InteractionEvent {
    Ping,
    CommandInvoked(CommandInvocation),
    FormSubmitted(FormSubmission),
    Unsupported { kind: u8 },
}

impl InteractionEvent {
    pub fn kind(&self) -> InteractionKind {
        match self {
            Self::Ping => InteractionKind::Ping,
            Self::CommandInvoked(_) => InteractionKind::Command,
            Self::FormSubmitted(_) => InteractionKind::FormSubmit,
            Self::Unsupported { .. } => InteractionKind::Unsupported,
        }
    }

    /// Commands route by name and form submissions by form id; other kinds have no route.
    pub fn route_key(&self) -> Option<RouteKey> {
        match self {
            Self::CommandInvoked(invocation) => {
                Some(RouteKey::new(InteractionKind::Command, &invocation.command_name))
            }
            Self::FormSubmitted(submission) => {
                Some(RouteKey::new(InteractionKind::FormSubmit, &submission.form_id))
            }
            Self::Ping | Self::Unsupported { .. } => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandInvocation {
    pub command_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormSubmission {
    pub form_id: String,
    pub fields: BTreeMap<String, String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    Ping,
    Command,
    FormSubmit,
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub kind: InteractionKind,
    pub identifier: String,
}

impl RouteKey {
    pub fn new(kind: InteractionKind, identifier: impl Into<String>) -> Self {
        Self { kind, identifier: identifier.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InteractionContext {
    pub correlation_id: String,
}

impl InteractionContext {
    pub fn for_envelope(envelope: &InteractionEnvelope) -> Self {
        Self { correlation_id: envelope.interaction_id.clone() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Responded(InteractionResponse),
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandlerError {
    #[error(transparent)]
    InvalidForm(#[from] TicketRequestError),
}

impl From<HandlerError> for ApplicationError {
    fn from(value: HandlerError) -> Self {
        match value {
            HandlerError::InvalidForm(error) => Self::Validation(error),
        }
    }
}

#[async_trait]
pub trait InteractionHandler: Send + Sync {
    fn route_key(&self) -> RouteKey;
    async fn handle(
        &self,
        envelope: &InteractionEnvelope,
        ctx: &InteractionContext,
    ) -> Result<HandlerResult, HandlerError>;
}

/// Dispatches each interaction to at most one handler, keyed by kind and identifier.
///
/// The router keeps no per-interaction state: routing the same envelope twice runs its
/// handler twice.
#[derive(Default)]
pub struct InteractionRouter {
    handlers: HashMap<RouteKey, Arc<dyn InteractionHandler>>,
}

impl InteractionRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: InteractionHandler + 'static,
    {
        self.handlers.insert(handler.route_key(), Arc::new(handler));
    }

    pub async fn route(
        &self,
        envelope: &InteractionEnvelope,
        ctx: &InteractionContext,
    ) -> HandlerResult {
        if envelope.event == InteractionEvent::Ping {
            return HandlerResult::Responded(InteractionResponse::Pong);
        }

        let Some(handler) = envelope.event.route_key().and_then(|key| self.handlers.get(&key))
        else {
            debug!(
                event_name = "ingress.discord.interaction_ignored",
                correlation_id = %ctx.correlation_id,
                kind = ?envelope.event.kind(),
                "no handler registered for interaction"
            );
            return HandlerResult::Ignored;
        };

        match handler.handle(envelope, ctx).await {
            Ok(result) => result,
            Err(error) => {
                let interface = ApplicationError::from(error).into_interface(&ctx.correlation_id);
                warn!(
                    event_name = "ingress.discord.handler_failed",
                    correlation_id = %interface.correlation_id(),
                    error = %interface,
                    "interaction handler failed; replying with generic failure"
                );
                HandlerResult::Responded(InteractionResponse::ephemeral(interface.user_message()))
            }
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

pub fn ticket_router<S>(service: Arc<TicketFormService<S>>) -> InteractionRouter
where
    S: TicketSubmitter + 'static,
{
    let mut router = InteractionRouter::new();
    router.register(TicketCommandHandler::new(service.clone()));
    router.register(TicketFormHandler::new(service));
    router
}

pub struct TicketCommandHandler<S> {
    service: Arc<TicketFormService<S>>,
}

impl<S> TicketCommandHandler<S>
where
    S: TicketSubmitter,
{
    pub fn new(service: Arc<TicketFormService<S>>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> InteractionHandler for TicketCommandHandler<S>
where
    S: TicketSubmitter + 'static,
{
    fn route_key(&self) -> RouteKey {
        RouteKey::new(InteractionKind::Command, TICKET_COMMAND_NAME)
    }

    async fn handle(
        &self,
        envelope: &InteractionEnvelope,
        _ctx: &InteractionContext,
    ) -> Result<HandlerResult, HandlerError> {
        let InteractionEvent::CommandInvoked(invocation) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        Ok(match self.service.on_command(&invocation.command_name) {
            Some(response) => HandlerResult::Responded(response),
            None => HandlerResult::Ignored,
        })
    }
}

pub struct TicketFormHandler<S> {
    service: Arc<TicketFormService<S>>,
}

impl<S> TicketFormHandler<S>
where
    S: TicketSubmitter,
{
    pub fn new(service: Arc<TicketFormService<S>>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> InteractionHandler for TicketFormHandler<S>
where
    S: TicketSubmitter + 'static,
{
    fn route_key(&self) -> RouteKey {
        RouteKey::new(InteractionKind::FormSubmit, TICKET_FORM_ID)
    }

    async fn handle(
        &self,
        envelope: &InteractionEnvelope,
        ctx: &InteractionContext,
    ) -> Result<HandlerResult, HandlerError> {
        let InteractionEvent::FormSubmitted(submission) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let response = self.service.on_form_submit(&submission.fields, ctx).await?;
        Ok(HandlerResult::Responded(response))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use ticketbot_core::{TicketRequest, TicketResult, TicketSubmitter};

    use super::{
        ticket_router, CommandInvocation, FormSubmission, HandlerResult, InteractionContext,
        InteractionEnvelope, InteractionEvent, InteractionRouter,
    };
    use crate::components::InteractionResponse;
    use crate::orchestrator::TicketFormService;

    #[derive(Clone, Default)]
    struct RecordingSubmitter {
        submitted: Arc<Mutex<Vec<TicketRequest>>>,
    }

    #[async_trait]
    impl TicketSubmitter for RecordingSubmitter {
        async fn submit(&self, request: &TicketRequest) -> TicketResult {
            let mut submitted = self.submitted.lock().expect("lock");
            submitted.push(request.clone());
            TicketResult::Created { ticket_id: format!("T-{}", submitted.len()) }
        }
    }

    fn ctx() -> InteractionContext {
        InteractionContext { correlation_id: "int-test".to_owned() }
    }

    fn router_with_recorder() -> (InteractionRouter, RecordingSubmitter) {
        let submitter = RecordingSubmitter::default();
        let router = ticket_router(Arc::new(TicketFormService::new(submitter.clone())));
        (router, submitter)
    }

    fn command(name: &str) -> InteractionEnvelope {
        InteractionEnvelope {
            interaction_id: "int-cmd".to_owned(),
            user_id: Some("U1".to_owned()),
            event: InteractionEvent::CommandInvoked(CommandInvocation {
                command_name: name.to_owned(),
            }),
        }
    }

    fn form(form_id: &str, fields: &[(&str, &str)]) -> InteractionEnvelope {
        InteractionEnvelope {
            interaction_id: "int-form".to_owned(),
            user_id: Some("U1".to_owned()),
            event: InteractionEvent::FormSubmitted(FormSubmission {
                form_id: form_id.to_owned(),
                fields: fields
                    .iter()
                    .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
                    .collect::<BTreeMap<_, _>>(),
            }),
        }
    }

    #[test]
    fn ticket_router_registers_command_and_form_handlers() {
        let (router, _) = router_with_recorder();
        assert_eq!(router.handler_count(), 2);
    }

    #[tokio::test]
    async fn routes_ticket_command_to_form_display() {
        let (router, _) = router_with_recorder();

        let result = router.route(&command("ticketform"), &ctx()).await;

        assert!(matches!(result, HandlerResult::Responded(InteractionResponse::Modal(_))));
    }

    #[tokio::test]
    async fn unknown_command_and_form_ids_are_silently_ignored() {
        let (router, submitter) = router_with_recorder();
        let ctx = ctx();

        assert_eq!(router.route(&command("weather"), &ctx).await, HandlerResult::Ignored);
        assert_eq!(
            router
                .route(&form("feedbackModal", &[("subject", "a"), ("description", "b")]), &ctx)
                .await,
            HandlerResult::Ignored
        );
        assert!(submitter.submitted.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn unsupported_interactions_are_ignored_and_ping_is_answered() {
        let router = InteractionRouter::new();
        let ctx = ctx();
        let unsupported = InteractionEnvelope {
            interaction_id: "int-x".to_owned(),
            user_id: None,
            event: InteractionEvent::Unsupported { kind: 3 },
        };
        let ping = InteractionEnvelope {
            interaction_id: "int-ping".to_owned(),
            user_id: None,
            event: InteractionEvent::Ping,
        };

        assert_eq!(router.route(&unsupported, &ctx).await, HandlerResult::Ignored);
        assert_eq!(
            router.route(&ping, &ctx).await,
            HandlerResult::Responded(InteractionResponse::Pong)
        );
    }

    #[tokio::test]
    async fn invalid_form_gets_exactly_one_generic_failure_reply() {
        let (router, submitter) = router_with_recorder();

        let result = router
            .route(
                &form("ticketModal", &[("subject", "Login issue"), ("description", "   ")]),
                &ctx(),
            )
            .await;

        let HandlerResult::Responded(InteractionResponse::Message { content, ephemeral }) = result
        else {
            panic!("expected an ephemeral failure reply");
        };
        assert!(ephemeral);
        assert!(content.contains("no ticket was created"));
        assert!(!content.contains("description"), "internal detail must not reach the user");
        assert!(submitter.submitted.lock().expect("lock").is_empty());
    }

    /// Known limitation: there is no dedup state, so a redelivered interaction is handled again.
    #[tokio::test]
    async fn routing_the_same_submission_twice_submits_twice() {
        let (router, submitter) = router_with_recorder();
        let envelope =
            form("ticketModal", &[("subject", "Login issue"), ("description", "Cannot log in")]);
        let ctx = InteractionContext::for_envelope(&envelope);

        let first = router.route(&envelope, &ctx).await;
        let second = router.route(&envelope, &ctx).await;

        assert_ne!(first, second);
        assert!(matches!(
            first,
            HandlerResult::Responded(ref response)
                if response.content().is_some_and(|content| content.contains("T-1"))
        ));
        assert!(matches!(
            second,
            HandlerResult::Responded(ref response)
                if response.content().is_some_and(|content| content.contains("T-2"))
        ));
        assert_eq!(submitter.submitted.lock().expect("lock").len(), 2);
    }
}

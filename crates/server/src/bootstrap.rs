use std::sync::Arc;

use axum::Router;
use reqwest::Client;
use ticketbot_core::config::AppConfig;
use ticketbot_discord::{
    commands::{ticket_command, CommandRegistrar, GuildCommandRegistrar, RegistrationError},
    events::ticket_router,
    orchestrator::TicketFormService,
    verify::{SignatureError, SignatureVerifier},
};
use thiserror::Error;
use tracing::info;

use crate::{crm::HubSpotTicketSubmitter, health, interactions};

pub struct Application {
    pub config: AppConfig,
    pub interactions: interactions::InteractionsState,
    pub health: health::HealthState,
    pub registrar: Arc<dyn CommandRegistrar>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("discord public key is unusable: {0}")]
    Verifier(#[source] SignatureError),
}

/// Wires the HTTP client, submitter, router, and registrar from an already validated config.
pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let verifier =
        SignatureVerifier::from_hex(&config.discord.public_key).map_err(BootstrapError::Verifier)?;

    let client = Client::new();
    let submitter = HubSpotTicketSubmitter::from_config(client.clone(), &config.crm);
    let health = health::HealthState::new(submitter.tickets_url());
    let router = ticket_router(Arc::new(TicketFormService::new(submitter)));
    let interactions = interactions::InteractionsState::new(verifier, router);

    let registrar = GuildCommandRegistrar::new(
        client,
        config.discord.api_base_url.clone(),
        config.discord.application_id.clone(),
        config.discord.guild_id.clone(),
        config.discord.bot_token.clone(),
    );

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        handler_count = interactions.handler_count(),
        "interaction handlers registered"
    );

    Ok(Application { config, interactions, health, registrar: Arc::new(registrar) })
}

impl Application {
    pub fn http_router(&self) -> Router {
        interactions::router(self.interactions.clone()).merge(health::router(self.health.clone()))
    }

    pub async fn register_commands(&self) -> Result<usize, RegistrationError> {
        self.registrar.register(&[ticket_command()]).await
    }
}

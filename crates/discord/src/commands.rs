use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

pub const TICKET_COMMAND_NAME: &str = "ticketform";

const CHAT_INPUT_COMMAND_TYPE: u8 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommandDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    kind: u8,
}

impl CommandDefinition {
    pub fn chat_input(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self { name: name.into(), description: description.into(), kind: CHAT_INPUT_COMMAND_TYPE }
    }
}

pub fn ticket_command() -> CommandDefinition {
    CommandDefinition::chat_input(TICKET_COMMAND_NAME, "Open a ticket form modal")
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("command registration request failed: {0}")]
    Transport(String),
    #[error("command registration rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Publishes slash command definitions to the chat platform.
#[async_trait]
pub trait CommandRegistrar: Send + Sync {
    /// Replaces the registered command set; returns how many commands were sent.
    async fn register(&self, commands: &[CommandDefinition]) -> Result<usize, RegistrationError>;
}

/// Registers guild-scoped commands through the Discord REST API.
pub struct GuildCommandRegistrar {
    client: Client,
    api_base_url: String,
    application_id: String,
    guild_id: String,
    bot_token: SecretString,
}

impl GuildCommandRegistrar {
    pub fn new(
        client: Client,
        api_base_url: impl Into<String>,
        application_id: impl Into<String>,
        guild_id: impl Into<String>,
        bot_token: SecretString,
    ) -> Self {
        Self {
            client,
            api_base_url: api_base_url.into(),
            application_id: application_id.into(),
            guild_id: guild_id.into(),
            bot_token,
        }
    }

    fn commands_url(&self) -> String {
        format!(
            "{}/applications/{}/guilds/{}/commands",
            self.api_base_url.trim_end_matches('/'),
            self.application_id,
            self.guild_id
        )
    }
}

#[async_trait]
impl CommandRegistrar for GuildCommandRegistrar {
    async fn register(&self, commands: &[CommandDefinition]) -> Result<usize, RegistrationError> {
        let url = self.commands_url();
        debug!(
            event_name = "egress.discord.commands_put",
            guild_id = %self.guild_id,
            command_count = commands.len(),
            "refreshing application commands"
        );

        let response = self
            .client
            .put(&url)
            .header("Authorization", format!("Bot {}", self.bot_token.expose_secret()))
            .json(commands)
            .send()
            .await
            .map_err(|error| RegistrationError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                event_name = "egress.discord.commands_rejected",
                guild_id = %self.guild_id,
                status = %status,
                "discord rejected command registration"
            );
            return Err(RegistrationError::Rejected { status: status.as_u16(), body });
        }

        Ok(commands.len())
    }
}

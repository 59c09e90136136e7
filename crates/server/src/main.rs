mod bootstrap;
mod crm;
mod health;
mod interactions;

use anyhow::Result;
use ticketbot_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use ticketbot_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // A missing .env is normal in deployments that set real environment variables
    let dotenv_path = dotenvy::dotenv().ok();

    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    if let Some(path) = dotenv_path {
        tracing::debug!(
            event_name = "system.config.dotenv_loaded",
            correlation_id = "bootstrap",
            path = %path.display(),
            "loaded environment from .env"
        );
    }

    let app = bootstrap::bootstrap_with_config(config)?;

    match app.register_commands().await {
        Ok(count) => tracing::info!(
            event_name = "system.server.commands_registered",
            correlation_id = "bootstrap",
            guild_id = %app.config.discord.guild_id,
            command_count = count,
            "slash commands registered"
        ),
        Err(error) => tracing::error!(
            event_name = "system.server.commands_failed",
            correlation_id = "bootstrap",
            guild_id = %app.config.discord.guild_id,
            error = %error,
            "slash command registration failed; continuing without it"
        ),
    }

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "ticketbot-server listening for interactions"
    );
    axum::serve(listener, app.http_router()).with_graceful_shutdown(wait_for_shutdown()).await?;
    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "ticketbot-server stopping"
    );

    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            event_name = "system.server.signal_failed",
            correlation_id = "shutdown",
            error = %error,
            "could not listen for ctrl-c; serving until killed"
        );
        std::future::pending::<()>().await;
    }
}

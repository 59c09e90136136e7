//! Discord Integration - HTTP interactions bot interface
//!
//! This crate provides the Discord side of ticketbot:
//! - **Payloads** (`payload`) - decode signed interaction bodies into typed events
//! - **Verification** (`verify`) - Ed25519 request signature checks
//! - **Events** (`events`) - `InteractionRouter` and the ticket handlers
//! - **Orchestration** (`orchestrator`) - `/ticketform` command and form submission flow
//! - **Components** (`components`) - modal and ephemeral reply builders
//! - **Commands** (`commands`) - slash command definitions and guild registration
//!
//! # Getting Started
//!
//! 1. Create an application at https://discord.com/developers/applications
//! 2. Set the Interactions Endpoint URL to `https://<host>/interactions`
//! 3. Invite the bot to a guild with the `applications.commands` scope
//! 4. Set env vars: `TICKETBOT_DISCORD_BOT_TOKEN`, `TICKETBOT_DISCORD_APPLICATION_ID`,
//!    `TICKETBOT_DISCORD_GUILD_ID`, `TICKETBOT_DISCORD_PUBLIC_KEY`
//!
//! # Architecture
//!
//! ```text
//! Discord POST → verify → parse → InteractionRouter → TicketFormService → TicketSubmitter
//!                                        ↓
//!                          InteractionResponse (modal | ephemeral reply)
//! ```

pub mod commands;
pub mod components;
pub mod events;
pub mod orchestrator;
pub mod payload;
pub mod verify;

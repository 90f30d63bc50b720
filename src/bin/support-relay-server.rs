// ABOUTME: Support relay server binary
// ABOUTME: Loads environment configuration, wires the assistant client and ticket store, and serves HTTP
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Support Relay Server Binary
//!
//! Serves `POST /api/chat` for the support widget.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use support_relay::{
    assistant::OpenAiAssistantClient,
    config::ServerConfig,
    constants::chat::CHAT_PATH,
    logging,
    relay::{AssistantRelay, RelaySettings},
    server::RelayServer,
    tickets::create_ticket_store,
};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "support-relay-server")]
#[command(about = "Support chat relay - drives assistant runs for the support widget")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    info!("Starting support relay");
    info!("{}", config.summary());

    let assistant = Arc::new(OpenAiAssistantClient::new(&config.assistant)?);
    let tickets = create_ticket_store(&config.tickets).await?;

    let relay = Arc::new(AssistantRelay::new(
        assistant,
        tickets,
        RelaySettings {
            assistant_id: config.assistant.assistant_id.clone(),
            polling: config.polling,
        },
    ));

    info!("=== Available API Endpoints ===");
    info!("   Chat:    http://{}:{}{CHAT_PATH}", config.host, config.http_port);
    info!("   Health:  http://{}:{}/health", config.host, config.http_port);
    info!("   Ready:   http://{}:{}/ready", config.host, config.http_port);

    if let Err(e) = RelayServer::new(config, relay).run().await {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}

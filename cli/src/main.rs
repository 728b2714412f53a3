//! A command-line client for the FamilyLedger backend.

/// Configuration and argument parsing
mod config;

use clap::Parser;
use config::{Command, Config};
use familyledger_core::types::LoginRequest;
use familyledger_core::{ApiClient, Error, MemoryCredentials, SessionEvent};
use serde::Serialize;
use std::{process::ExitCode, sync::Arc};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let credentials = Arc::new(MemoryCredentials::new(config.token.clone()));
    let (session_tx, session_rx) = unbounded_channel::<SessionEvent>();

    let client = match ApiClient::new(&config.client_config(), credentials) {
        Ok(client) => client.with_observer(Arc::new(session_tx)),
        Err(err) => {
            tracing::error!(%err, "could not build client");
            return ExitCode::FAILURE;
        }
    };

    let res = run(&client, config.command).await;
    // closes the channel once any background session dispatch has finished
    drop(client);
    report_session_events(session_rx).await;

    match res {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(%err, "request failed");
            ExitCode::FAILURE
        }
    }
}

/// Run one command and render its result as pretty JSON.
async fn run(client: &ApiClient, command: Command) -> familyledger_core::Result<String> {
    match command {
        Command::Login { email, password } => {
            let session = client.login(&LoginRequest { email, password }).await?;
            render(&session)
        }
        Command::Me => render(&client.me().await?),
        Command::Goals => render(&client.list_goals().await?),
        Command::Tasks { completed } => render(&client.list_tasks(completed).await?),
        Command::Pets => render(&client.list_pets().await?),
        Command::Shopping => render(&client.list_shopping_lists().await?),
        Command::Documents => render(&client.list_legal_documents().await?),
    }
}

fn render<T: Serialize>(value: &T) -> familyledger_core::Result<String> {
    serde_json::to_string_pretty(value).map_err(Error::Encode)
}

async fn report_session_events(mut rx: UnboundedReceiver<SessionEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            SessionEvent::Unauthorized => {
                tracing::warn!("session expired, run `familyledger login` for a new token")
            }
        }
    }
}

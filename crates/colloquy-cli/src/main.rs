mod config;

use clap::{Parser, Subcommand};
use colloquy_agent::LlmClient;
use colloquy_core::Provider;
use colloquy_gateway::GatewayServer;
use colloquy_session::{DialogConfig, DialogEngine, Participant, SessionRegistry, TurnEvent};
use config::ColloquyConfig;
use futures_util::StreamExt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "colloquy", about = "Colloquy: moderated dialogs between two AI models")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "colloquy.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run one dialog in the terminal
    Run {
        /// Topic of the dialog
        #[arg(long)]
        topic: String,
        /// Provider for participant A
        #[arg(long, default_value = "openai")]
        a: Provider,
        /// Provider for participant B
        #[arg(long, default_value = "anthropic")]
        b: Provider,
        /// Role label for participant A
        #[arg(long, default_value = "")]
        a_label: String,
        /// Role label for participant B
        #[arg(long, default_value = "")]
        b_label: String,
        /// Total number of model turns
        #[arg(long, default_value_t = 6)]
        turns: u32,
        /// Rules shared by both participants
        #[arg(long, default_value = "")]
        rules: String,
        /// Delay after each token, in milliseconds
        #[arg(long, default_value_t = 0)]
        token_delay_ms: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let config = ColloquyConfig::load(&cli.config).await?;
    let llm = Arc::new(LlmClient::new(config.providers.clone()));

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);

            let registry = SessionRegistry::new(llm, config.dialog.engine_options());
            let app = GatewayServer::build_with_static(registry, config.server.static_dir);

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!("Colloquy gateway listening on {}", addr);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
            info!("Gateway shut down");
        }
        Commands::Run {
            topic,
            a,
            b,
            a_label,
            b_label,
            turns,
            rules,
            token_delay_ms,
        } => {
            let mut dialog = DialogConfig::new(
                topic,
                Participant::new(a).with_label(a_label),
                Participant::new(b).with_label(b_label),
            );
            dialog.max_turns = turns;
            dialog.token_delay_ms = token_delay_ms;
            dialog.rules = rules;
            dialog.validate()?;

            let engine = Arc::new(DialogEngine::new(
                "terminal",
                dialog,
                llm,
                config.dialog.engine_options(),
            ));

            tokio::select! {
                result = print_dialog(&engine) => result?,
                _ = shutdown_signal() => engine.shutdown(),
            }
        }
    }

    Ok(())
}

/// Stream a dialog to stdout, one block per turn.
async fn print_dialog(engine: &Arc<DialogEngine>) -> anyhow::Result<()> {
    let mut events = engine.stream();
    let mut out = std::io::stdout();

    while let Some(event) = events.next().await {
        match event? {
            TurnEvent::TurnStart {
                turn, role_label, ..
            } => {
                write!(out, "\n[{}] {role_label}: ", turn + 1)?;
            }
            TurnEvent::Token { token, .. } => write!(out, "{token}")?,
            TurnEvent::TurnEnd { .. } => writeln!(out)?,
            TurnEvent::DialogEnd { total_turns } => {
                writeln!(out, "\nDialog finished after {total_turns} turns.")?;
            }
        }
        out.flush()?;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

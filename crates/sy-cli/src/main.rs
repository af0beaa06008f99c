//! switchyard: natural-language command router with multi-backend model dispatch.
//!
//! Reads requests from stdin, routes each to a domain handler and prints
//! the planned downstream call or the model's answer.

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use sy_cli::config::{AppConfig, config_path};
use sy_cli::handlers::HandlerTable;
use sy_cli::session::{Response, Session};
use sy_intent::KeywordDetector;
use sy_llm::{ChatModel, Dispatcher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays the conversation.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    if std::env::var("SWITCHYARD_LOG_JSON").is_ok_and(|v| v == "1") {
        builder.json().init();
    } else {
        builder.init();
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "switchyard starting");

    // ── Load config ─────────────────────────────────────────────
    let path = config_path(std::env::args().nth(1), |key| std::env::var(key).ok());
    let config = AppConfig::load(&path)?;
    tracing::info!(
        path = %path.display(),
        backend_override = ?config.routing.backend,
        organization = %config.defaults.organization,
        "config loaded"
    );

    // ── Backends ────────────────────────────────────────────────
    let dispatcher = Arc::new(Dispatcher::from_config(&config.llm).await?);
    println!("switchyard {}", env!("CARGO_PKG_VERSION"));
    for (backend, available) in dispatcher.availability() {
        let status = if available { "available" } else { "not available" };
        println!("  {backend:<10} {status}");
    }
    if dispatcher.availability().iter().all(|(_, ok)| !ok) {
        println!("  No language-model backend is reachable; only pattern extraction will work.");
    }
    println!("Type /help for commands.\n");

    // ── Session ─────────────────────────────────────────────────
    let model: Arc<dyn ChatModel> = dispatcher;
    let detector = KeywordDetector::with_settings(
        Arc::clone(&model),
        config.pattern_settings(),
        config.consensus_policy(),
    );
    let handlers = HandlerTable::standard(model, &config.defaults);
    tracing::info!(handler_count = handlers.len(), "handler table initialized");
    let session = Session::new(detector, handlers);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("switchyard> ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown signal received");
                None
            }
        };
        let Some(line) = line else {
            println!();
            break;
        };

        match session.respond(&line).await {
            Response::Exit => break,
            Response::Silent => {}
            Response::Text(text) => println!("{text}\n"),
        }
    }

    tracing::info!("switchyard stopped");
    Ok(())
}

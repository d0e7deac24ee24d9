//! riad CLI — interactive terminal chat with the assistant.
//!
//! Wires the full stack: conversation store (memory or SQLite per
//! config), tool adapters seeded with demo data, the five agents, the
//! supervisor, and the message gateway. Reads messages from stdin and
//! prints reply fragments, one conversation per `--user` identity.

use clap::Parser;
use riad_agents::{
    Agent, AlertsAgent, IntentRouter, LegalAgent, NegotiationAgent, SearchAgent, SmalltalkAgent,
    Supervisor,
};
use riad_config::AppConfig;
use riad_core::adapter::ConversationStore;
use riad_core::conversation::{InboundMessage, UserId};
use riad_core::event::{DomainEvent, EventBus};
use riad_gateway::{ConsoleTransport, MessageGateway};
use riad_store::{InMemoryStore, SqliteStore};
use riad_tools::{AlertMatcher, CatalogSearch, CorpusRetriever, InMemoryAlertStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

mod seed;

#[derive(Parser)]
#[command(
    name = "riad",
    about = "riad — conversational real-estate assistant",
    version
)]
struct Cli {
    /// Path to the config file
    #[arg(short, long, default_value = "riad.toml")]
    config: PathBuf,

    /// Identity to chat as (one conversation per identity)
    #[arg(short, long, default_value = "local-user")]
    user: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = AppConfig::load_from(&cli.config)?;

    let store: Arc<dyn ConversationStore> = match config.store.backend.as_str() {
        "sqlite" => Arc::new(SqliteStore::new(&config.store.path).await?),
        _ => Arc::new(InMemoryStore::new()),
    };

    let catalog = Arc::new(CatalogSearch::with_listings(seed::sample_listings()));
    let retriever = Arc::new(CorpusRetriever::new(seed::legal_corpus()));
    let alerts = Arc::new(InMemoryAlertStore::new(config.alerts.max_notifications));
    let events = Arc::new(EventBus::default());

    // The ingestion path feeds the matcher with freshly scraped
    // listings; in the CLI the `/ingest` command simulates it.
    let matcher = AlertMatcher::new(alerts.clone(), events.clone());

    let agents: Vec<Arc<dyn Agent>> = vec![
        Arc::new(SearchAgent::new(
            catalog.clone(),
            alerts.clone(),
            config.max_results,
        )),
        Arc::new(NegotiationAgent::new(config.negotiation.clone())),
        Arc::new(LegalAgent::new(retriever, config.legal.clone())),
        Arc::new(AlertsAgent::new(alerts.clone())),
        Arc::new(SmalltalkAgent),
    ];
    let supervisor = Arc::new(Supervisor::new(
        agents,
        IntentRouter::new(config.router.min_confidence),
        Duration::from_secs(config.gateway.turn_timeout_secs),
        config.history_limit,
    ));
    let gateway = MessageGateway::new(
        store,
        supervisor,
        events.clone(),
        config.gateway.fragment_cap,
    );

    // Surface alert notifications next to the chat
    let mut event_rx = events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = event_rx.recv().await {
            if let DomainEvent::AlertMatched { owner, listing_id, .. } = event.as_ref() {
                println!("\n🔔 [{owner}] Nouveau bien correspondant à ton alerte : {listing_id}");
            }
        }
    });

    let user = UserId::from(&cli.user);
    let listing_count = catalog.len().await;
    info!(user = %user, listings = listing_count, "riad ready");

    println!("🏠 riad — assistant immobilier");
    println!("Tape ton message ({} comme identité), « exit » pour quitter.\n", user);

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    loop {
        match lines.next_line().await? {
            Some(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if matches!(line, "exit" | "quit" | "/exit" | "/quit" | ":q") {
                    break;
                }

                // Simulate the ingestion path: "/ingest <ville> <prix>"
                if let Some(rest) = line.strip_prefix("/ingest ") {
                    let mut parts = rest.split_whitespace();
                    let location = parts.next().unwrap_or("Casablanca").to_string();
                    let price: f64 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(500_000.0);
                    let listing = seed::ingested_listing(&location, price);
                    println!("📥 Nouveau bien ingéré : {} ({})", listing.title, listing.id);
                    catalog.insert(listing.clone()).await;
                    matcher.ingest(&listing).await;
                    continue;
                }

                gateway
                    .serve(&user, InboundMessage::text(line), &ConsoleTransport)
                    .await?;
            }
            None => break, // EOF (Ctrl+D)
        }
    }

    println!("À bientôt ! 👋");
    Ok(())
}

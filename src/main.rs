use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use canteen::cli::{Cli, Commands};
use canteen::config::{self, Config, LogFormat};
use canteen::store::TokenStore;
use canteen::suggest::{SuggestionContext, SuggestionService, TimeOfDay};
use canteen::{api, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load()?;
    init_tracing(cfg.log_format);

    let args = Cli::parse();

    let result = match args.command {
        Some(Commands::Serve { port, seed_demo }) => {
            let port = port.unwrap_or(cfg.port);
            let seed_demo = seed_demo || cfg.seed_demo;
            run_server(cfg, port, seed_demo).await
        }
        Some(Commands::Suggest { hour, day }) => run_suggest(&cfg, hour, day).await,
        None => {
            let (port, seed_demo) = (cfg.port, cfg.seed_demo);
            run_server(cfg, port, seed_demo).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "canteen=debug,tower_http=debug".into()),
    );
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn run_server(cfg: Config, port: u16, seed_demo: bool) -> anyhow::Result<()> {
    let mut store = TokenStore::new();
    if seed_demo {
        store.seed_demo()?;
    }

    let suggestions = SuggestionService::from_config(&cfg.llm)?;
    let state = Arc::new(AppState::new(cfg, store, suggestions));
    let app = api::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("canteen token service listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_suggest(cfg: &Config, hour: Option<u32>, day: Option<String>) -> anyhow::Result<()> {
    let service = SuggestionService::from_config(&cfg.llm)?;

    let mut context = SuggestionContext::now();
    if let Some(hour) = hour {
        context.time_of_day = TimeOfDay::from_hour(hour);
    }
    if let Some(day) = day {
        context.day_of_week = day;
    }

    let outcome = service.suggest_for(context).await;

    println!(
        "Suggestions for {} {} ({:?}):",
        outcome.context.day_of_week,
        outcome.context.time_of_day.as_str(),
        outcome.source
    );
    for item in &outcome.suggested_items {
        println!("  - {}", item);
    }
    if let Some(notice) = &outcome.notice {
        println!("Note: {}", notice);
    }
    Ok(())
}

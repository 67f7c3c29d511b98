use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use event_finder_lib::config::ConfigStore;
use event_finder_lib::render::{render_text, render_view};
use event_finder_lib::ticketmaster::HttpTransport;
use event_finder_lib::widget::SearchWidget;

#[derive(Parser)]
#[command(name = "event-finder")]
#[command(about = "Find upcoming music events by artist or city")]
struct Cli {
    /// Print a plain-text listing instead of HTML cards
    #[arg(long, global = true)]
    text: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search by artist name, falling back to a city search
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Show featured events without touching the cache
    Featured,
    /// Empty the local cache, then show featured events
    Clear,
    /// Store the Ticketmaster API key in the config file
    SetKey { api_key: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_store = ConfigStore::load();

    let state = match cli.command {
        Commands::SetKey { api_key } => {
            config_store
                .update(|config| config.api_key = Some(api_key.trim().to_string()))
                .context("failed to save api key")?;
            println!("API key saved.");
            return Ok(());
        }
        Commands::Search { query } => open_widget(&config_store)?.submit(&query.join(" ")).await,
        Commands::Featured => open_widget(&config_store)?.featured().await,
        Commands::Clear => open_widget(&config_store)?.load().await,
    };

    let output = if cli.text {
        render_text(&state)
    } else {
        render_view(&state)
    };
    println!("{output}");

    if state.is_error() {
        std::process::exit(1);
    }
    Ok(())
}

fn open_widget(config_store: &ConfigStore) -> Result<SearchWidget<HttpTransport>> {
    let config = config_store.read().with_env_overrides();
    event_finder_lib::open_widget(&config).context("failed to start event search")
}

//! Restaurant finder CLI
//!
//! Usage:
//!     restaurant-finder search "cheap italian food in Boston"
//!     restaurant-finder search --location "Santa Monica" --cuisine japanese --limit 5
//!     restaurant-finder summary
//!     restaurant-finder serve --port 8080

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use restaurant_finder::api::AppState;
use restaurant_finder::models::Coordinates;
use restaurant_finder::{FinderConfig, SearchCoordinator, SearchInput, SearchOverrides, logging, web};

/// Restaurant finder - describe what you want to eat, get ranked restaurants
#[derive(Parser)]
#[command(name = "restaurant-finder")]
#[command(version)]
#[command(about = "Natural-language restaurant search", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true, env = "RESTAURANT_FINDER_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for restaurants
    Search(SearchArgs),

    /// Show counts over the current dataset
    Summary {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Run the HTTP API
    Serve {
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}

#[derive(Args)]
struct SearchArgs {
    /// Free-text request, e.g. "cheap sushi near downtown LA"
    query: Option<String>,

    /// Location to search around
    #[arg(short, long)]
    location: Option<String>,

    /// Cuisine (american, chinese, italian, ...)
    #[arg(long)]
    cuisine: Option<String>,

    /// Price range (budget, moderate, expensive, luxury or $..$$$$)
    #[arg(long)]
    price: Option<String>,

    /// Minimum rating from 0 to 5
    #[arg(long)]
    min_rating: Option<f64>,

    /// Maximum distance in miles
    #[arg(long)]
    max_distance: Option<f64>,

    /// Search origin as "lat,lon"
    #[arg(long, value_parser = parse_coordinates)]
    near: Option<Coordinates>,

    /// Maximum number of results
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

fn parse_coordinates(value: &str) -> Result<Coordinates, String> {
    value.parse()
}

impl SearchArgs {
    fn input(&self) -> SearchInput {
        SearchInput {
            query: self.query.clone(),
            overrides: SearchOverrides {
                location: self.location.clone(),
                cuisine: self.cuisine.clone(),
                price_range: self.price.clone(),
                rating_min: self.min_rating,
                max_distance: self.max_distance,
                origin: self.near,
            },
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = FinderConfig::load_from_path(cli.config).context("Failed to load configuration")?;
    logging::init(&config.logging, cli.verbose)?;
    tracing::debug!("Loaded configuration: model={} dataset={}", config.ai.model, config.data.key);

    let coordinator = SearchCoordinator::from_config(&config)?;

    match cli.command {
        Commands::Search(args) => cmd_search(&coordinator, &args).await,
        Commands::Summary { json } => cmd_summary(&coordinator, json).await,
        Commands::Serve { port } => {
            let state = AppState {
                coordinator: Arc::new(coordinator),
            };
            web::run(port, state).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn cmd_search(coordinator: &SearchCoordinator, args: &SearchArgs) -> Result<ExitCode> {
    let input = args.input();
    let (handle, registration) = SearchCoordinator::abort_pair();

    let search = coordinator.search_abortable(&input, args.limit, registration);
    tokio::pin!(search);
    let finished = tokio::select! {
        result = &mut search => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };
    let result = match finished {
        Some(result) => result,
        None => {
            handle.abort();
            search.await
        }
    };

    match result {
        Ok(response) if args.json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(ExitCode::SUCCESS)
        }
        Ok(response) => {
            print!("{response}");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::debug!("Search failed: {}", e);
            eprintln!("{}", e.user_message());
            Ok(ExitCode::from(2))
        }
    }
}

async fn cmd_summary(coordinator: &SearchCoordinator, json: bool) -> Result<ExitCode> {
    let summary = coordinator
        .summary()
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{summary}");
    }
    Ok(ExitCode::SUCCESS)
}

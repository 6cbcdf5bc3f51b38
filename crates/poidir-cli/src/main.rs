mod app;
mod device;
mod repl;

use clap::{Parser, Subcommand};
use poidir_core::ProviderKind;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::app::{print_places, App};

#[derive(Debug, Parser)]
#[command(name = "poidir")]
#[command(about = "Search nearby places through Geoapify, HERE, or Google Places")]
struct Cli {
    /// Provider to use instead of POIDIR_PROVIDER (geoapify, here, google)
    #[arg(long, global = true)]
    provider: Option<ProviderKind>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one search around the current location
    Search {
        /// Free text or a category label such as "coffee"
        query: Vec<String>,
        /// Provider category code to browse (e.g. catering, 100-1000, cafe)
        #[arg(long)]
        category: Option<String>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print completion suggestions for partial input
    Autocomplete {
        query: Vec<String>,
    },
    /// Resolve the current location and describe it
    Locate,
    /// Interactive search session
    Repl,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = poidir_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let app = App::build(&config, cli.provider)?;
    tracing::debug!(provider = %app.coordinator.provider(), "poidir ready");

    match cli.command {
        Commands::Search {
            query,
            category,
            json,
        } => {
            let places = app.search_once(&query.join(" "), category.as_deref()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&places)?);
            } else {
                print_places(&places);
            }
        }
        Commands::Autocomplete { query } => {
            let suggestions = app
                .coordinator
                .autocomplete(&query.join(" "), &CancellationToken::new())
                .await?;
            for suggestion in suggestions {
                println!("{suggestion}");
            }
        }
        Commands::Locate => {
            let resolver = app.coordinator.resolver();
            let coordinate = resolver.resolve().await?;
            if !coordinate.is_valid() {
                anyhow::bail!(
                    "no location available: configure a device position or POIDIR_DEFAULT_LOCATION"
                );
            }
            match resolver.describe(coordinate).await {
                Some(address) => println!("{coordinate} ({address})"),
                None => println!("{coordinate}"),
            }
        }
        Commands::Repl => repl::run_repl(&app).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests;

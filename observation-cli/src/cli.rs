use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use inquire::Text;
use observation_core::{
    CancellationToken, Config, DraftMode, ObservationId, ObservationsApi, Outcome,
};
use tracing::info;

use crate::{output, view};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "observations", version, about = "Record weather observations")]
pub struct Cli {
    /// Service base URL; overrides API_BASE_URL and the config file.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the service base URL in the config file.
    Configure,

    /// List all observations.
    List,

    /// Show a single observation.
    Show {
        id: ObservationId,
    },

    /// Record a new observation.
    New,

    /// Edit an existing observation.
    Edit {
        id: ObservationId,
    },

    /// Delete an observation.
    Delete {
        id: ObservationId,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;
        let base_url = self.base_url;
        let connect = || {
            let base_url = base_url.clone().unwrap_or_else(|| config.resolve_base_url());
            info!(%base_url, "using observations service");
            ObservationsApi::new(base_url)
        };

        match self.command {
            Command::Configure => configure(&config),
            Command::List => list(&connect(), &CancellationToken::new()).await,
            Command::Show { id } => {
                let token = CancellationToken::new();
                if let Outcome::Completed(observation) = connect().read(id, &token).await? {
                    output::print_observation(&observation);
                }
                Ok(())
            }
            Command::New => view::run_form(&connect(), DraftMode::Create).await,
            Command::Edit { id } => view::run_form(&connect(), DraftMode::Edit(id)).await,
            Command::Delete { id } => {
                let token = CancellationToken::new();
                if let Outcome::Completed(()) = connect().delete(id, &token).await? {
                    println!("Deleted observation {id}.");
                }
                Ok(())
            }
        }
    }
}

/// The listing view the form navigates back to.
/// Prints every observation. Stops quietly once `token` fires.
pub async fn list(api: &ObservationsApi, token: &CancellationToken) -> anyhow::Result<()> {
    match api.list(token).await? {
        Outcome::Completed(observations) => output::print_table(&observations),
        Outcome::Cancelled => eprintln!("Listing cancelled."),
    }
    Ok(())
}

fn configure(config: &Config) -> anyhow::Result<()> {
    let mut config = config.clone();
    let current = config.resolve_base_url();
    let url = Text::new("Observations service base URL:")
        .with_initial_value(&current)
        .prompt()
        .context("Failed to read base URL")?;

    config.set_api_base_url(&url)?;
    config.save()?;

    println!("Saved base URL to {}", Config::config_file_path()?.display());
    Ok(())
}

//! nomad-event-logger: watches a Nomad cluster and writes new events to sinks.
//!
//! Events go to stdout and/or a file as one JSON object per line; the agent's
//! own logs go to stderr.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use nomad_event_logger::{Agent, Config};
use tracing_subscriber::EnvFilter;

/// Nomad event collection agent
#[derive(Parser)]
#[command(name = "nomad-event-logger", version)]
#[command(
    about = "A Nomad event collection agent",
    long_about = "Processes Nomad cluster events and dumps them to sink providers.\n\
                  Supports stdout and file sinks with JSON formatted output."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML config file (flags and environment override it)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Nomad server address
    #[arg(long, global = true, env = "NOMAD_ADDR")]
    nomad_addr: Option<String>,

    /// Nomad ACL token
    #[arg(long, global = true, env = "NOMAD_TOKEN", hide_env_values = true)]
    nomad_token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Nomad event collection agent
    Start(StartArgs),
}

#[derive(Args)]
struct StartArgs {
    /// Sink providers (stdout, file)
    #[arg(long, value_delimiter = ',')]
    sinks: Option<Vec<String>>,

    /// Event types to monitor (allocation, evaluation, node, job, deployment, task).
    /// Defaults to all if not specified.
    #[arg(long, value_delimiter = ',')]
    event_types: Option<Vec<String>>,

    /// File path for file sink
    #[arg(long)]
    file_path: Option<PathBuf>,

    /// Rate limit for allocation queries (e.g. 5s, 1m)
    #[arg(long)]
    rate_limit: Option<String>,

    /// How long to wait for managers on shutdown (e.g. 60s)
    #[arg(long)]
    grace: Option<String>,
}

impl Cli {
    /// Flag/environment layer of the configuration.
    fn overrides(&self) -> Config {
        let Commands::Start(start) = &self.command;
        Config {
            nomad_addr: self.nomad_addr.clone(),
            nomad_token: self.nomad_token.clone(),
            sinks: start.sinks.clone(),
            event_types: start.event_types.clone(),
            rate_limit: start.rate_limit.clone(),
            file_path: start.file_path.clone(),
            grace: start.grace.clone(),
            wait_time: None,
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_current_span(true)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = Config::defaults();
    if let Some(path) = &cli.config {
        config = config.merge(Config::from_file(path)?);
        tracing::info!(path = %path.display(), "using config file");
    }
    let settings = config
        .merge(cli.overrides())
        .validate()
        .context("invalid configuration")?;

    let agent = Agent::builder(settings)
        .build()
        .context("failed to create agent")?;

    tracing::info!(event_types = ?agent.event_types(), "starting agent");
    agent.run_until_signal().await?;
    Ok(())
}

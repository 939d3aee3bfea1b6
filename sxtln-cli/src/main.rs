///! Sextillion CLI
///!
///! Command-line interface for the sextillion cluster service

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::auth::AuthCommands;
use commands::cluster::ClusterCommands;
use commands::config::ConfigCommands;
use commands::{Context, Overrides};
use std::io;
use sxtln_common::{ConfigStore, OutputFormat, DEFAULT_BASE_URL};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sxtln", author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// API server address
    #[arg(long, env = "SXTLN_SERVER", default_value = DEFAULT_BASE_URL, global = true)]
    server: String,

    /// Output format (json, yaml)
    #[arg(short, long, global = true)]
    output: Option<String>,

    /// Token to use for this call instead of the stored one
    #[arg(long, global = true)]
    token: Option<String>,

    /// API key to use for this call instead of the stored one
    #[arg(long, global = true)]
    apikey: Option<String>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authentication commands
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Local configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Manage clusters
    Cluster {
        #[command(subcommand)]
        command: ClusterCommands,
    },
    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        tracing::debug!(error = ?err, "command failed");
        output::print_error(&user_message(&err));
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        generate_completions(shell);
        return Ok(());
    }

    let store = ConfigStore::default_location()?;
    let config = store.load()?;
    let mut ctx = Context {
        server: cli.server,
        store,
        config,
        overrides: Overrides {
            // unknown formats are ignored rather than rejected
            output: cli.output.as_deref().and_then(OutputFormat::parse),
            token: cli.token,
            api_key: cli.apikey,
        },
    };

    match cli.command {
        Commands::Auth { command } => {
            commands::auth::handle_auth_command(command, &mut ctx).await?
        }
        Commands::Config { command } => {
            commands::config::handle_config_command(command, &mut ctx)?
        }
        Commands::Cluster { command } => {
            commands::cluster::handle_cluster_command(command, &ctx).await?
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Map failures to the message shown to the user
fn user_message(err: &anyhow::Error) -> String {
    match err
        .downcast_ref::<sxtln_common::Error>()
        .and_then(sxtln_common::Error::status)
    {
        Some(400) => "invalid parameter. check your parameters".to_string(),
        Some(401) => "unauthorized. login to sextillion with 'auth login' or 'config set-apikey'"
            .to_string(),
        _ => format!("{:#}", err),
    }
}

/// Generate shell completions
fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;

    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(shell, &mut cmd, name, &mut io::stdout());
}

//! Cachet CLI: command-line client for a Cachet credential node.
//!
//! Subcommands: init, identity, identities, resolve, templates, issue,
//! verify, history, forget, status.

mod client;
mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use client::NodeClient;

/// Cachet: DID credential lifecycle engine.
#[derive(Parser, Debug)]
#[command(name = "cachet", version, about, long_about = None)]
struct Cli {
    /// API endpoint of the node.
    #[arg(short, long, global = true, default_value = "http://127.0.0.1:9101")]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default node configuration.
    Init(commands::init::InitArgs),
    /// Generate a new identity held by the node.
    Identity(commands::identity::IdentityArgs),
    /// List identities held by the node.
    Identities,
    /// Resolve a DID to its document.
    Resolve(commands::resolve::ResolveArgs),
    /// List credential templates.
    Templates,
    /// Issue a verifiable credential.
    Issue(commands::issue::IssueArgs),
    /// Verify a verifiable credential.
    Verify(commands::verify::VerifyArgs),
    /// List issued credentials.
    History(commands::history::HistoryArgs),
    /// Remove a credential from history.
    Forget(commands::forget::ForgetArgs),
    /// Query the status of a running node.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = NodeClient::new(&cli.endpoint);

    match &cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::Identity(args) => commands::identity::run(args, &client).await,
        Commands::Identities => commands::identities::run(&client).await,
        Commands::Resolve(args) => commands::resolve::run(args, &client).await,
        Commands::Templates => commands::templates::run(&client).await,
        Commands::Issue(args) => commands::issue::run(args, &client).await,
        Commands::Verify(args) => commands::verify::run(args, &client).await,
        Commands::History(args) => commands::history::run(args, &client).await,
        Commands::Forget(args) => commands::forget::run(args, &client).await,
        Commands::Status => commands::status::run(&client).await,
    }
}

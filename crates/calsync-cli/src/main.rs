use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "calsync", version, about = "Mirror task due/threshold dates into a reminder calendar")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a calendar file with a todo.txt list
    Sync(commands::sync::SyncArgs),
    /// Show the events a sync would write, without writing them
    Preview(commands::preview::PreviewArgs),
    /// List the events stored in a calendar file
    Events(commands::events::EventsArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Sync(args) => commands::sync::run(args),
        Commands::Preview(args) => commands::preview::run(args),
        Commands::Events(args) => commands::events::run(args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

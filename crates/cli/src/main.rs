//! Clickmon CLI: the main entry point.
//!
//! Commands:
//! - `serve`   Start the HTTP control surface
//! - `watch`   Monitor one task in the foreground
//! - `status`  Show the effective configuration
//! - `config`  Print the default config file

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "clickmon",
    about = "Clickmon: answers @AI questions in ClickUp task comments",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Monitor a single task until Ctrl-C
    Watch {
        /// ClickUp task id
        task_id: String,

        /// Run one poll cycle and print its report
        #[arg(long)]
        once: bool,
    },

    /// Show the effective configuration
    Status,

    /// Print the default configuration
    Config {
        /// Print the config file path instead
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Watch { task_id, once } => commands::watch::run(task_id, once).await?,
        Commands::Status => commands::status::run()?,
        Commands::Config { path } => commands::config_cmd::run(path)?,
    }

    Ok(())
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(version, about = "Project/task tracking API with AI assist")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the board API server
    Serve {
        /// Port to serve on
        #[arg(short, long, default_value = "5001")]
        port: u16,

        /// Initialize database only (don't start server)
        #[arg(long)]
        init: bool,

        /// Path to the SQLite database file
        #[arg(long, default_value = ".taskboard/board.db")]
        db_path: String,

        /// Bind on all interfaces (for containerized development)
        #[arg(long)]
        dev: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load GEMINI_API_KEY and friends from a local .env when present.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    match &cli.command {
        Commands::Serve {
            port,
            init,
            db_path,
            dev,
        } => {
            let db_path = PathBuf::from(&db_path);
            cmd::cmd_serve(*port, *init, db_path, *dev).await?;
        }
    }

    Ok(())
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod wiring;

#[derive(Parser)]
#[command(name = "ciq")]
#[command(about = "CIQ Copilot - conversational blueprint parameter collection", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Blueprint template path, overriding the configured one
    #[arg(short, long)]
    blueprint: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive collection session
    Chat,
    /// Print the extracted parameter schema as JSON
    Schema,
    /// Merge a flat values file into the blueprint and print the YAML
    Render {
        /// YAML file mapping dotted parameter paths to values
        values: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = wiring::load_config(cli.config.as_deref(), cli.blueprint.as_deref())?;

    match cli.command {
        Commands::Chat => commands::chat::run(&config).await?,
        Commands::Schema => commands::schema::run(&config)?,
        Commands::Render { values } => commands::render::run(&config, &values).await?,
    }

    Ok(())
}

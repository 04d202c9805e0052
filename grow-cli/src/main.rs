use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod storage;

use commands::{
    BackupCommand, ConfigCommand, CycleCommand, FormulaCommand, InventoryCommand,
    MaintenanceCommand, SyncCommand,
};
use config::Config;
use storage::DataStore;

#[derive(Parser)]
#[command(name = "grow")]
#[command(version)]
#[command(about = "A cultivation tracking CLI application", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Track cultivation cycles, stages and irrigations
    Cycle(CycleCommand),

    /// Look up scheduled nutrient formulas
    Formula(FormulaCommand),

    /// Record purchases and inspect stock
    Inventory(InventoryCommand),

    /// Complete maintenance tasks
    Maintenance(MaintenanceCommand),

    /// Exchange new records with collaborators
    Sync(SyncCommand),

    /// Full backup and restore
    Backup(BackupCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grow=info,grow_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load(cli.config)?;
    let store = DataStore::new(config.data_dir.value.clone());

    match &cli.command {
        Some(Commands::Cycle(cmd)) => cmd.run(&store)?,
        Some(Commands::Formula(cmd)) => cmd.run(&store)?,
        Some(Commands::Inventory(cmd)) => cmd.run(&store)?,
        Some(Commands::Maintenance(cmd)) => cmd.run(&store, &config)?,
        Some(Commands::Sync(cmd)) => cmd.run(&store, &config)?,
        Some(Commands::Backup(cmd)) => cmd.run(&store)?,
        Some(Commands::Config(cmd)) => cmd.run(&config)?,
        None => println!("Use --help to see available commands"),
    }

    Ok(())
}

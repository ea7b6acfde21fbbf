use clap::{Parser, Subcommand};
use std::path::Path;

use hexforage::cli::commands;
use hexforage::config::EngineConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hexforage")]
#[command(about = "Exploration and foraging decisions for hex-grid ant colony bots")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "hexforage.toml")]
    config: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide one turn from a snapshot file and print the moves
    Decide {
        /// Turn snapshot as returned by the arena endpoint
        #[arg(short, long)]
        snapshot: String,
    },

    /// Run a fresh engine over a file of newline-delimited snapshots
    Replay {
        /// Input file, one snapshot per line
        #[arg(short, long)]
        input: String,

        /// Persist the final engine state
        #[arg(long)]
        save: bool,
    },

    /// Manage saved engine states
    State {
        #[command(subcommand)]
        action: StateAction,
    },
}

#[derive(Subcommand)]
enum StateAction {
    /// List saved engine states
    List {
        /// State directory (defaults to the configured one)
        #[arg(short, long)]
        dir: Option<String>,
    },

    /// Print a summary of a saved engine state
    Inspect {
        /// Path to the state file
        file: String,
    },
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn main() {
    let cli = Cli::parse();

    let config = match EngineConfig::from_file_or_default(Path::new(&cli.config)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };
    init_logging(&config.log_level, cli.json);

    let result = match cli.command {
        Commands::Decide { snapshot } => commands::decide(&config, Path::new(&snapshot)),
        Commands::Replay { input, save } => commands::replay(&config, Path::new(&input), save),
        Commands::State { action } => match action {
            StateAction::List { dir } => {
                let dir = dir.unwrap_or_else(|| config.state_directory.clone());
                commands::list_states(Path::new(&dir))
            }
            StateAction::Inspect { file } => commands::inspect_state(Path::new(&file)),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod cmd;
mod context;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use context::Context;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "board",
    about = "Ordered-list boards with optimistic sync for to-do lists, roadmaps, kanban",
    version,
    propagate_version = true
)]
struct Cli {
    /// Board config file
    #[arg(long, global = true, env = "BOARD_CONFIG", default_value = "board.yaml")]
    config: PathBuf,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a board config (and local store directory)
    Init {
        /// Column layout to start from: todo or roadmap
        #[arg(long, default_value = "todo")]
        preset: String,

        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Show every column and its items
    Show,

    /// Create an item
    Add {
        #[arg(required = true)]
        title: Vec<String>,

        /// Column to create in (default: the board's default column)
        #[arg(long)]
        column: Option<String>,
    },

    /// Move an item to a column and position
    Move {
        id: String,

        /// Destination column
        #[arg(long)]
        to: String,

        /// Destination index (clamped to the column length)
        #[arg(long, default_value = "0")]
        index: usize,
    },

    /// Toggle an item's completion
    Done { id: String },

    /// Delete an item
    Rm { id: String },

    /// Completion and streak statistics
    Stats,

    /// Serve the board over HTTP
    Serve {
        /// Port to listen on (0 = OS-assigned)
        #[arg(long, default_value = "3141")]
        port: u16,

        /// Open a browser once listening
        #[arg(long)]
        open: bool,
    },

    /// Inspect and validate the config
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = root::resolve_config(&cli.config);
    let json = cli.json;

    let result = match cli.command {
        Commands::Init { preset, force } => cmd::init::run(&config_path, &preset, force),
        Commands::Config { subcommand } => cmd::config::run(&config_path, subcommand, json),
        Commands::Show => Context::open(&config_path).and_then(|ctx| cmd::show::run(&ctx, json)),
        Commands::Add { title, column } => Context::open(&config_path)
            .and_then(|ctx| cmd::item::add(&ctx, &title.join(" "), column, json)),
        Commands::Move { id, to, index } => Context::open(&config_path)
            .and_then(|ctx| cmd::item::move_to(&ctx, &id, &to, index, json)),
        Commands::Done { id } => {
            Context::open(&config_path).and_then(|ctx| cmd::item::toggle(&ctx, &id, json))
        }
        Commands::Rm { id } => {
            Context::open(&config_path).and_then(|ctx| cmd::item::remove(&ctx, &id, json))
        }
        Commands::Stats => Context::open(&config_path).and_then(|ctx| cmd::stats::run(&ctx, json)),
        Commands::Serve { port, open } => {
            Context::open(&config_path).and_then(|ctx| cmd::serve::run(ctx, port, open))
        }
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use kindred_cli::cli::{execute, parse_field, render, CliCommand, CliConfig};
use kindred_core::{AppPhase, Clock, CoreConfig, ManualClock, NotificationCenter, SystemClock};

#[derive(Parser)]
#[command(name = "kindred-cli")]
#[command(about = "Inspect and drive the kindred notification engine")]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, short, global = true)]
    pretty: bool,

    /// Path to JSON config file (dataDir, userId, dailyCap, ttlSecs)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Directory holding persisted notification lists
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// User whose list to operate on
    #[arg(long, short = 'u', global = true)]
    user: Option<String>,

    /// Run in the private phase (hides proximity notifications)
    #[arg(long, global = true)]
    private: bool,

    /// Pretend the current time is this Unix timestamp (UTC days)
    #[arg(long, global = true)]
    at: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Feed an event through the intake pipeline
    Emit {
        /// Notification type (match, like, super_like, message, ...)
        #[arg(long = "type", short = 't')]
        kind: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        body: String,
        /// Payload field as key=value (can be specified multiple times)
        #[arg(long = "field", short = 'f', value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },

    /// List visible notifications
    List {
        /// Include read, expired and phase-hidden entries
        #[arg(long)]
        all: bool,
    },

    /// Print the unseen count
    Count,

    /// Mark one notification as read
    MarkRead { id: String },

    /// Mark every notification as read
    MarkAllRead,

    /// Mark the notification with this dedupe key as read
    MarkKey { key: String },

    /// Mark every notification in a conversation as read
    MarkGroup { group_id: String },

    /// Remove the notification of a type about a user
    RemoveCounterpart {
        counterpart_id: String,
        #[arg(long = "type", short = 't')]
        kind: String,
    },

    /// Remove relationship notifications whose user is not listed
    RemoveOrphaned {
        /// Counterpart IDs that are still valid
        valid: Vec<String>,
    },

    /// Delete expired notifications
    Sweep,
}

impl From<Commands> for CliCommand {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Emit {
                kind,
                title,
                body,
                fields,
            } => CliCommand::Emit {
                kind,
                title,
                body,
                payload: fields.into_iter().collect(),
            },
            Commands::List { all: false } => CliCommand::List,
            Commands::List { all: true } => CliCommand::Dump,
            Commands::Count => CliCommand::Count,
            Commands::MarkRead { id } => CliCommand::MarkRead { id },
            Commands::MarkAllRead => CliCommand::MarkAllRead,
            Commands::MarkKey { key } => CliCommand::MarkKey { key },
            Commands::MarkGroup { group_id } => CliCommand::MarkGroup { group_id },
            Commands::RemoveCounterpart { counterpart_id, kind } => {
                CliCommand::RemoveCounterpart { counterpart_id, kind }
            }
            Commands::RemoveOrphaned { valid } => CliCommand::RemoveOrphaned { valid },
            Commands::Sweep => CliCommand::Sweep,
        }
    }
}

#[tokio::main]
async fn main() {
    kindred_core::tracing_setup::init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let clock: Arc<dyn Clock> = match cli.at {
        Some(ts) => Arc::new(ManualClock::new(ts)),
        None => Arc::new(SystemClock),
    };

    let center = NotificationCenter::with_clock(&config, clock);
    center.load(None);
    center.ready().await;
    if let Some(e) = center.take_last_error() {
        eprintln!("Warning: {}", e);
    }
    if cli.private {
        center.set_phase(AppPhase::Private);
    }

    let output = execute(&center, cli.command.into())?;
    println!("{}", render(&output, cli.pretty)?);
    Ok(())
}

/// Load configuration from file (if given) and apply flag overrides
fn load_config(cli: &Cli) -> Result<CoreConfig> {
    let file = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };
    Ok(file.resolve(cli.data_dir.clone(), cli.user.clone()))
}

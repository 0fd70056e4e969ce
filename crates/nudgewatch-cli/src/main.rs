use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "nudgewatch", version, about = "nudgewatch CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Evaluate the gating policy without running a cycle
    Gate {
        #[command(subcommand)]
        action: commands::gate::GateAction,
    },
    /// Show recent check-ins
    History(commands::history::HistoryArgs),
    /// Snooze management
    Snooze {
        #[command(subcommand)]
        action: commands::snooze::SnoozeAction,
    },
    /// Email conversation tracking
    Tracking {
        #[command(subcommand)]
        action: commands::tracking::TrackingAction,
    },
    /// Apply a button action identifier (e.g. "snooze_email:abc")
    Action {
        /// Action identifier
        identifier: String,
    },
    /// Pause scheduled cycles
    Pause,
    /// Resume scheduled cycles
    Resume,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Config { action } => commands::config::run(action),
        Commands::Gate { action } => commands::gate::run(action),
        Commands::History(args) => commands::history::run(args),
        Commands::Snooze { action } => commands::snooze::run(action),
        Commands::Tracking { action } => commands::tracking::run(action),
        Commands::Action { identifier } => commands::action::run(&identifier),
        Commands::Pause => commands::action::set_paused(true),
        Commands::Resume => commands::action::set_paused(false),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

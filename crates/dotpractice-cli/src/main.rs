use clap::{Parser, Subcommand};
use dotpractice_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;
mod terminal;

#[derive(Parser)]
#[command(name = "dotpractice", version, about = "Attention training with a dot")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List levels with their progress
    Levels {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show a level's instructions and progress
    Show {
        /// Level number
        level: u32,
    },
    /// Run a practice session
    Practice(commands::practice::PracticeArgs),
    /// Dashboard totals
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Practice log, most recent first
    Log {
        /// Show at most this many entries
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Add or remove practice minutes without a session
    Adjust {
        level: u32,
        /// Minutes to add; negative to remove
        #[arg(allow_negative_numbers = true)]
        minutes: i64,
    },
    /// Claim mastery of a level
    Master { level: u32 },
    /// Goal settings
    Goal {
        #[command(subcommand)]
        action: commands::goal::GoalAction,
    },
    /// Focus image for the sigil level
    Sigil {
        #[command(subcommand)]
        action: commands::settings::SigilAction,
    },
    /// Set the color theme
    Theme { theme: String },
    /// Custom form of the top level
    Shape {
        #[command(subcommand)]
        action: commands::settings::ShapeAction,
    },
    /// Write all practice data to a JSON file
    Export {
        /// Target directory (defaults to the current directory)
        #[arg(long)]
        out: Option<std::path::PathBuf>,
    },
    /// Replace all practice data with an exported file
    Import { path: std::path::PathBuf },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Config::load_or_default().log.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Levels { json } => commands::levels::list(json),
        Commands::Show { level } => commands::levels::show(level),
        Commands::Practice(args) => commands::practice::run(args),
        Commands::Stats { json } => commands::stats::summary(json),
        Commands::Log { limit, json } => commands::stats::log(limit, json),
        Commands::Adjust { level, minutes } => commands::progress::adjust(level, minutes),
        Commands::Master { level } => commands::progress::master(level),
        Commands::Goal { action } => commands::goal::run(action),
        Commands::Sigil { action } => commands::settings::sigil(action),
        Commands::Theme { theme } => commands::settings::theme(&theme),
        Commands::Shape { action } => commands::settings::shape(action),
        Commands::Export { out } => commands::transfer::export(out),
        Commands::Import { path } => commands::transfer::import(&path),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

use clap::{Parser, Subcommand};
use habitizer_core::Config;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "habitizer-cli", version, about = "Habitizer CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Routine management
    Routine {
        #[command(subcommand)]
        action: commands::routine::RoutineAction,
    },
    /// Task management within a routine
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Run a routine: start, check off tasks, pause, end
    Run {
        #[command(subcommand)]
        action: commands::run::RunAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();

    let loaded = Config::load();
    let filter = loaded
        .as_ref()
        .map(|c| c.log_filter.clone())
        .unwrap_or_else(|_| Config::default().log_filter);
    logging::init_logging(&filter);
    let config = loaded.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "falling back to default config");
        Config::default()
    });

    let result = match cli.command {
        Commands::Routine { action } => commands::routine::run(action, &config),
        Commands::Task { action } => commands::task::run(action, &config),
        Commands::Run { action } => commands::run::run(action, &config),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

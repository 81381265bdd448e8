use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fxconv::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration (at --config-path when given)
    Setup,
    /// Convert an amount and print the result
    Convert {
        /// Amount to convert, digits optionally grouped with '.', e.g. 1.000
        amount: String,
        /// Source currency code (defaults to the configured source)
        #[arg(short, long)]
        from: Option<String>,
        /// Target currency code (defaults to the configured target)
        #[arg(short, long)]
        to: Option<String>,
    },
    /// Open the interactive conversion form
    Interactive,
}

impl From<Commands> for fxconv::AppCommand {
    fn from(cmd: Commands) -> fxconv::AppCommand {
        match cmd {
            Commands::Convert { amount, from, to } => {
                fxconv::AppCommand::Convert { amount, from, to }
            }
            Commands::Interactive => fxconv::AppCommand::Interactive,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => fxconv::cli::setup::setup_at_path(path),
            None => fxconv::cli::setup::setup(),
        },
        Some(cmd) => fxconv::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

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
    /// Create default configuration
    Setup,
    /// Run the HTTP conversion service
    Serve,
    /// Convert an amount using freshly fetched rates
    Convert {
        /// Source currency code, e.g. EUR
        source: String,
        /// Target currency code, e.g. USD
        target: String,
        /// Amount in the source currency
        amount: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config_path = cli.config_path.as_deref();
    let result = match cli.command {
        Some(Commands::Setup) => fxconv::cli::setup::setup(),
        Some(Commands::Serve) => fxconv::run_command(fxconv::AppCommand::Serve, config_path).await,
        Some(Commands::Convert {
            source,
            target,
            amount,
        }) => {
            let command = fxconv::AppCommand::Convert {
                source,
                target,
                amount,
            };
            fxconv::run_command(command, config_path).await
        }
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

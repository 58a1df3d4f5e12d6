pub mod cli;
pub mod core;
pub mod providers;
pub mod server;

use anyhow::Result;
use tracing::{debug, info};

pub enum AppCommand {
    Serve,
    Convert {
        source: String,
        target: String,
        amount: f64,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let config = crate::core::config::AppConfig::load(config_path)?;
    debug!(
        api_url = %config.exchange.api_url,
        currencies = %config.exchange.currencies,
        "Loaded config"
    );
    info!("API key loaded successfully");

    match command {
        AppCommand::Serve => server::serve(&config).await,
        AppCommand::Convert {
            source,
            target,
            amount,
        } => {
            let provider = server::build_provider(&config)?;
            let converted =
                cli::convert::convert_once(&config, provider, &source, &target, amount).await?;
            println!("{amount} {source} = {converted} {target}");
            Ok(())
        }
    }
}

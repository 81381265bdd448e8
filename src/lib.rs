pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::conversion::RateFetcher;
use crate::core::view::{Converter, ViewState};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub enum AppCommand {
    Convert {
        amount: String,
        from: Option<String>,
        to: Option<String>,
    },
    Interactive,
}

/// Builds the rate fetcher for the configured provider.
pub fn build_fetcher(config: &AppConfig) -> RateFetcher {
    let provider =
        providers::ExchangeRateApiProvider::new(&config.provider.base_url, config.api_key())
            .with_timeout(config.provider.timeout_secs.map(Duration::from_secs));
    RateFetcher::new(Arc::new(provider))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fxconv starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!(
        base_url = %config.provider.base_url,
        has_api_key = config.provider.api_key.is_some(),
        defaults = ?config.defaults,
        "Loaded config"
    );

    let fetcher = build_fetcher(&config);

    match command {
        AppCommand::Convert { amount, from, to } => {
            let initial = ViewState::new(
                from.as_deref().unwrap_or(&config.defaults.source),
                to.as_deref().unwrap_or(&config.defaults.target),
            );
            cli::convert::run(fetcher, initial, &amount).await?;
        }
        AppCommand::Interactive => {
            let initial = ViewState::new(&config.defaults.source, &config.defaults.target);
            let converter = Arc::new(Converter::new(fetcher, initial));
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            cli::interactive::run(converter, input).await?;
        }
    }
    Ok(())
}

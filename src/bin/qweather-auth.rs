use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use qweather_auth::cache::token_cache::TokenCache;
use qweather_auth::resilience::retry::RetrySettings;
use qweather_auth::server;
use qweather_auth::utils::config_loader;
use qweather_auth::utils::logging::{self, LogLevel};
use qweather_auth::weather::QWeatherClient;
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "qweather-auth.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Serve the weather API (default)
    Serve,
    /// Issue one token and print it
    Token,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config
    // -------------------------------

    let args = Args::parse();
    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config, args.log_level);

    // -------------------------------
    // 2. Resolve credentials once: identifiers + parsed key
    // -------------------------------

    let issuer = service_config.credentials.resolve().inspect_err(|e| {
        error!("cannot start without a usable credential: {}", e);
    })?;
    let tokens = Arc::new(TokenCache::from_config(&issuer));

    match args.command.unwrap_or(Command::Serve) {
        Command::Token => {
            let token = tokens.get().await?;
            info!("token issued, expires at {}", token.exp_unix_ts);
            println!("{}", token.value);
        }
        Command::Serve => {
            // -------------------------------
            // 3. Weather client sharing the token cache
            // -------------------------------

            let retry = RetrySettings::from(service_config.settings.retry.as_ref());
            let weather = Arc::new(QWeatherClient::new(&service_config.weather, tokens, retry)?);

            // -------------------------------
            // 4. Start http server
            // -------------------------------

            info!("Service starting...");
            server::server::start(&service_config.settings, weather).await?;
        }
    }

    Ok(())
}

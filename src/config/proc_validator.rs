//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Checks issuer identity, key source, retry, server and upstream settings
//!
//! Key material itself is parsed later, when credentials are resolved.

use tracing::{error, info};

use crate::config::credentials::{CredentialsConfig, PrivateKeyConfig};
use crate::config::settings::{RetryConfig, SettingsConfig};
use crate::config::types::{ServiceConfig, WeatherConfig};
use crate::observability::metrics::get_metrics;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_credentials(&cfg.credentials, &mut errors);
    validate_weather(&cfg.weather, &mut errors);

    if errors.is_empty() {
        info!("config is valid");
        Ok(())
    } else {
        let metrics = get_metrics().await;
        for e in &errors {
            error!("config: {}", e);
            metrics.config_validation_errors.inc();
        }
        Err(errors)
    }
}

fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if let Some(retry) = &settings.retry {
        validate_retry(retry, errors);
    }
    if settings.server.host.trim().is_empty() {
        errors.push("settings.server.host must not be empty".to_string());
    }
    if settings.server.port.parse::<u16>().is_err() {
        errors.push(format!(
            "settings.server.port '{}' is not a valid port",
            settings.server.port
        ));
    }
    if !settings.metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            settings.metrics.path
        ));
    }
    if let Some(logging) = &settings.logging {
        if !LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' must be one of {:?}",
                logging.level, LOG_LEVELS
            ));
        }
    }
}

fn validate_retry(retry: &RetryConfig, errors: &mut Vec<String>) {
    if retry.attempts == Some(0) {
        errors.push("settings.retry.attempts must be >= 1".to_string());
    }
    if let (Some(base), Some(max)) = (retry.base_delay_ms, retry.max_delay_ms) {
        if base > max {
            errors.push(format!(
                "settings.retry.base_delay_ms ({}) must be <= max_delay_ms ({})",
                base, max
            ));
        }
    }
}

fn validate_credentials(credentials: &CredentialsConfig, errors: &mut Vec<String>) {
    if credentials.key_id.trim().is_empty() {
        errors.push("credentials.key_id must not be empty".to_string());
    }
    if credentials.project_id.trim().is_empty() {
        errors.push("credentials.project_id must not be empty".to_string());
    }
    match &credentials.private_key {
        PrivateKeyConfig::FromFile { path } if path.trim().is_empty() => {
            errors.push("credentials.private_key.path must not be empty".to_string())
        }
        PrivateKeyConfig::FromEnv { from_env } if from_env.trim().is_empty() => {
            errors.push("credentials.private_key.from_env must not be empty".to_string())
        }
        PrivateKeyConfig::Literal { pem } if pem.trim().is_empty() => {
            errors.push("credentials.private_key.pem must not be empty".to_string())
        }
        _ => {}
    }
}

fn validate_weather(weather: &WeatherConfig, errors: &mut Vec<String>) {
    if !(weather.base_url.starts_with("http://") || weather.base_url.starts_with("https://")) {
        errors.push(format!(
            "weather.base_url '{}' must be an http(s) URL",
            weather.base_url
        ));
    }
    if weather.timeout_ms == 0 {
        errors.push("weather.timeout_ms must be > 0".to_string());
    }
}

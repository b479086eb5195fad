use serde::Deserialize;

use crate::config::credentials::CredentialsConfig;
use crate::config::settings::SettingsConfig;

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
}

/// ================================
/// Upstream weather provider
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_base_url() -> String {
    "https://devapi.qweather.com".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

use std::{fs, path::Path};

use anyhow::{anyhow, Result};
use regex::Regex;
use tracing::{debug, error};

use crate::config::proc_validator;
use crate::config::settings::LoggingConfig;
use crate::config::types::ServiceConfig;
use crate::observability::metrics::get_metrics;

/// Load and validate config from YAML file
pub async fn file_to_config(path: &Path) -> Result<ServiceConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| anyhow!("cannot read config '{}': {}", path.display(), e))?;

    let expanded = expand_env_vars(&content)?;
    parse_config(expanded).await
}

pub async fn parse_config(content: String) -> Result<ServiceConfig> {
    let metrics = get_metrics().await;
    let mut service_config: ServiceConfig = serde_yaml::from_str(&content)
        .inspect_err(|e| {
            error!("parse config error: {}", e);
            metrics.config_validation_errors.inc();
        })?;

    // Apply defaults
    if service_config.settings.logging.is_none() {
        service_config.settings.logging = Some(LoggingConfig::default());
    }

    debug!("validation config ...");
    proc_validator::validate_service_config(&service_config)
        .await
        .map_err(|errors| anyhow!("config is not valid: {}", errors.join("; ")))?;

    Ok(service_config)
}

/// Substitute `${VAR}` and `${VAR:default}` with environment values.
pub fn expand_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{(\w+)(?::([^\}]+))?\}")?;
    Ok(re
        .replace_all(input, |caps: &regex::Captures| {
            let var = &caps[1];
            let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            std::env::var(var).unwrap_or_else(|_| default.to_string())
        })
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::credentials::PrivateKeyConfig;
    use crate::config::settings::LogFormat;
    use serial_test::serial;
    use std::io::Write;

    const MINIMAL: &str = r#"
credentials:
  key_id: CE5AYF96K5
  project_id: 288AH4E373
  private_key:
    path: ./ed25519-private.pem
"#;

    #[tokio::test]
    async fn minimal_config_gets_defaults() {
        let cfg = parse_config(MINIMAL.to_owned()).await.unwrap();

        assert_eq!(cfg.credentials.key_id, "CE5AYF96K5");
        assert!(matches!(cfg.credentials.private_key, PrivateKeyConfig::FromFile { .. }));
        assert_eq!(cfg.settings.server.port, "8080");
        assert_eq!(cfg.settings.metrics.path, "/metrics");
        assert!(!cfg.settings.metrics.is_enabled);
        assert_eq!(cfg.weather.base_url, "https://devapi.qweather.com");
        let logging = cfg.settings.logging.unwrap();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, LogFormat::Compact);
    }

    #[tokio::test]
    async fn missing_credentials_block_fails() {
        let err = parse_config("settings: {}\n".to_owned()).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn invalid_values_are_aggregated() {
        let content = r#"
settings:
  retry: { attempts: 0, base_delay_ms: 500, max_delay_ms: 100 }
credentials:
  key_id: ""
  project_id: ""
  private_key: { pem: "" }
weather:
  base_url: ftp://example.com
"#;
        let err = parse_config(content.to_owned()).await.unwrap_err().to_string();
        assert!(err.contains("config is not valid"));
        assert!(err.contains("key_id"));
        assert!(err.contains("project_id"));
        assert!(err.contains("attempts"));
        assert!(err.contains("base_delay_ms"));
        assert!(err.contains("base_url"));
        assert!(err.contains("private_key"));
    }

    #[test]
    #[serial]
    fn env_vars_expand_with_defaults() {
        std::env::set_var("QWEATHER_AUTH_TEST_KID", "CE5AYF96K5");
        std::env::remove_var("QWEATHER_AUTH_TEST_UNSET");

        let out = expand_env_vars("a: ${QWEATHER_AUTH_TEST_KID}\nb: ${QWEATHER_AUTH_TEST_UNSET:fallback}\nc: ${QWEATHER_AUTH_TEST_UNSET}").unwrap();
        assert_eq!(out, "a: CE5AYF96K5\nb: fallback\nc: ");

        std::env::remove_var("QWEATHER_AUTH_TEST_KID");
    }

    #[tokio::test]
    #[serial]
    async fn file_config_expands_env() {
        std::env::set_var("QWEATHER_AUTH_TEST_PROJECT", "288AH4E373");
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "credentials:\n  key_id: CE5AYF96K5\n  project_id: ${{QWEATHER_AUTH_TEST_PROJECT}}\n  private_key:\n    from_env: QWEATHER_PRIVATE_KEY\n"
        )
        .unwrap();

        let cfg = file_to_config(file.path()).await.unwrap();
        assert_eq!(cfg.credentials.project_id, "288AH4E373");
        std::env::remove_var("QWEATHER_AUTH_TEST_PROJECT");
    }

    #[tokio::test]
    #[serial]
    async fn shipped_config_is_valid() {
        std::env::set_var("QWEATHER_KEY_ID", "CE5AYF96K5");
        std::env::set_var("QWEATHER_PROJECT_ID", "288AH4E373");

        let cfg = file_to_config(Path::new("qweather-auth.yaml"))
            .await
            .expect("qweather-auth.yaml must exist in repo root for tests");
        assert!(cfg.settings.metrics.is_enabled);
        assert!(matches!(cfg.credentials.private_key, PrivateKeyConfig::FromEnv { .. }));

        std::env::remove_var("QWEATHER_KEY_ID");
        std::env::remove_var("QWEATHER_PROJECT_ID");
    }

    #[tokio::test]
    #[serial]
    async fn shipped_config_without_identity_is_rejected() {
        std::env::remove_var("QWEATHER_KEY_ID");
        std::env::remove_var("QWEATHER_PROJECT_ID");

        let err = file_to_config(Path::new("qweather-auth.yaml")).await.unwrap_err();
        assert!(err.to_string().contains("credentials.key_id"));
    }
}

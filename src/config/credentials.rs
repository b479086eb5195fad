use std::path::PathBuf;
use std::sync::Arc;

use ed25519_dalek::SigningKey;
use serde::Deserialize;
use tracing::info;

use crate::error::{CredentialError, Result};
use crate::signer::key::KeySource;

/// ================================
/// Issuer identity and key material
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct CredentialsConfig {
    /// credential id (`kid` header)
    pub key_id: String,
    /// project id (`sub` claim)
    pub project_id: String,
    pub private_key: PrivateKeyConfig,
}

/// Private key value sources
#[derive(Deserialize, Clone)]
#[serde(untagged)]
pub enum PrivateKeyConfig {
    FromFile { path: String },
    FromEnv { from_env: String },
    Literal { pem: String },
}

impl std::fmt::Debug for PrivateKeyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrivateKeyConfig::FromFile { path } => write!(f, "FromFile({})", path),
            PrivateKeyConfig::FromEnv { from_env } => write!(f, "FromEnv({})", from_env),
            PrivateKeyConfig::Literal { .. } => f.write_str("Literal(<redacted>)"),
        }
    }
}

impl PrivateKeyConfig {
    /// Environment variables are read here, once.
    pub fn key_source(&self) -> Result<KeySource> {
        match self {
            PrivateKeyConfig::FromFile { path } => Ok(KeySource::File(PathBuf::from(path))),
            PrivateKeyConfig::FromEnv { from_env } => std::env::var(from_env)
                .map(KeySource::Pem)
                .map_err(|_| {
                    CredentialError::Configuration(format!(
                        "environment variable '{}' with the private key is not set",
                        from_env
                    ))
                }),
            PrivateKeyConfig::Literal { pem } => Ok(KeySource::Pem(pem.to_owned())),
        }
    }
}

/// Resolved, immutable issuer configuration.
#[derive(Debug, Clone)]
pub struct IssuerConfig {
    pub kid: String,
    pub sub: String,
    pub key: Arc<SigningKey>,
}

impl IssuerConfig {
    pub fn new(kid: &str, sub: &str, key: SigningKey) -> Result<Self> {
        let kid = kid.trim();
        let sub = sub.trim();
        if kid.is_empty() {
            return Err(CredentialError::Configuration(
                "credentials.key_id is empty".to_owned(),
            ));
        }
        if sub.is_empty() {
            return Err(CredentialError::Configuration(
                "credentials.project_id is empty".to_owned(),
            ));
        }
        Ok(Self {
            kid: kid.to_owned(),
            sub: sub.to_owned(),
            key: Arc::new(key),
        })
    }
}

impl CredentialsConfig {
    /// Load the key and validate identifiers.
    pub fn resolve(&self) -> Result<IssuerConfig> {
        let source = self.private_key.key_source()?;
        let key = source.load()?;
        let issuer = IssuerConfig::new(&self.key_id, &self.project_id, key)?;
        info!("credentials resolved for kid={} ({:?})", issuer.kid, self.private_key);
        Ok(issuer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::common::{TEST_KID, TEST_PRIVATE_KEY_BR, TEST_SUB};
    use serial_test::serial;

    fn literal(kid: &str, sub: &str, pem: &str) -> CredentialsConfig {
        CredentialsConfig {
            key_id: kid.to_owned(),
            project_id: sub.to_owned(),
            private_key: PrivateKeyConfig::Literal { pem: pem.to_owned() },
        }
    }

    #[test]
    fn literal_br_key_resolves() {
        let issuer = literal(TEST_KID, TEST_SUB, TEST_PRIVATE_KEY_BR).resolve().unwrap();
        assert_eq!(issuer.kid, TEST_KID);
        assert_eq!(issuer.sub, TEST_SUB);
    }

    #[test]
    fn empty_identifiers_fail() {
        let err = literal("", TEST_SUB, TEST_PRIVATE_KEY_BR).resolve().unwrap_err();
        assert!(matches!(err, CredentialError::Configuration(m) if m.contains("key_id")));

        let err = literal(TEST_KID, "", TEST_PRIVATE_KEY_BR).resolve().unwrap_err();
        assert!(matches!(err, CredentialError::Configuration(m) if m.contains("project_id")));
    }

    #[test]
    #[serial]
    fn env_key_is_read_once_at_resolve() {
        std::env::set_var("QWEATHER_AUTH_TEST_KEY", TEST_PRIVATE_KEY_BR);
        let cfg = CredentialsConfig {
            key_id: TEST_KID.to_owned(),
            project_id: TEST_SUB.to_owned(),
            private_key: PrivateKeyConfig::FromEnv {
                from_env: "QWEATHER_AUTH_TEST_KEY".to_owned(),
            },
        };
        let issuer = cfg.resolve().unwrap();
        std::env::remove_var("QWEATHER_AUTH_TEST_KEY");

        // the resolved key no longer depends on the environment
        let token = crate::signer::issue(&issuer.kid, &issuer.sub, &issuer.key).unwrap();
        assert_eq!(token.value.split('.').count(), 3);
    }

    #[test]
    #[serial]
    fn missing_env_var_fails() {
        std::env::remove_var("QWEATHER_AUTH_TEST_MISSING");
        let source = PrivateKeyConfig::FromEnv {
            from_env: "QWEATHER_AUTH_TEST_MISSING".to_owned(),
        }
        .key_source()
        .unwrap_err();
        assert!(matches!(source, CredentialError::Configuration(_)));
    }

    #[test]
    fn untagged_variants_deserialize() {
        let file: PrivateKeyConfig = serde_yaml::from_str("path: ./ed25519-private.pem").unwrap();
        assert!(matches!(file, PrivateKeyConfig::FromFile { .. }));

        let env: PrivateKeyConfig = serde_yaml::from_str("from_env: QWEATHER_PRIVATE_KEY").unwrap();
        assert!(matches!(env, PrivateKeyConfig::FromEnv { .. }));

        let pem: PrivateKeyConfig = serde_yaml::from_str("pem: abc").unwrap();
        assert!(matches!(pem, PrivateKeyConfig::Literal { .. }));
    }
}

use std::fs;
use std::path::PathBuf;

use ed25519_dalek::pkcs8::DecodePrivateKey;
use ed25519_dalek::SigningKey;
use tracing::debug;

use crate::error::{CredentialError, Result};

/// Where the PKCS#8 PEM private key comes from.
#[derive(Clone)]
pub enum KeySource {
    File(PathBuf),
    Pem(String),
}

impl std::fmt::Debug for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySource::File(path) => f.debug_tuple("File").field(path).finish(),
            KeySource::Pem(_) => f.write_str("Pem(<redacted>)"),
        }
    }
}

impl KeySource {
    /// Read (if needed) and parse the key.
    pub fn load(&self) -> Result<SigningKey> {
        match self {
            KeySource::File(path) => {
                debug!("reading private key from {}", path.display());
                let content = fs::read_to_string(path).map_err(|e| {
                    CredentialError::Configuration(format!(
                        "cannot read private key file '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                parse_private_key(&content)
            }
            KeySource::Pem(text) => parse_private_key(text),
        }
    }
}

/// Undo `<br>` / `<br/>` newline substitution and strip stray indentation.
///
/// Environment-variable editors of some hosting consoles reject multi-line
/// values, so PEM text often arrives with `<br>` in place of line breaks.
pub fn normalize_pem(raw: &str) -> String {
    let text = raw.replace("<br/>", "\n").replace("<br>", "\n");
    let mut normalized = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    normalized.push('\n');
    normalized
}

/// Parse an Ed25519 private key from PKCS#8 PEM text.
pub fn parse_private_key(raw: &str) -> Result<SigningKey> {
    if raw.trim().is_empty() {
        return Err(CredentialError::Configuration(
            "private key material is empty".to_owned(),
        ));
    }
    let pem = normalize_pem(raw);
    SigningKey::from_pkcs8_pem(&pem).map_err(|e| {
        CredentialError::Configuration(format!("invalid Ed25519 private key: {}", e))
    })
}

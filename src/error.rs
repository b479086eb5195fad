//! Credential error taxonomy.
//!
//! Both variants are terminal: retrying with the same configuration or key
//! cannot succeed, so callers surface them and skip the outbound call.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CredentialError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// Missing or unusable identifiers or key material.
    #[error("credential configuration error: {0}")]
    Configuration(String),

    /// The signature primitive rejected the input.
    #[error("token signing failed: {0}")]
    Signing(String),
}

impl CredentialError {
    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            CredentialError::Configuration(_) => "configuration",
            CredentialError::Signing(_) => "signing",
        }
    }
}

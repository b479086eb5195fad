//! Outbound credential signing.
//!
//! - `key`: PEM key sources and the `<br>` normalization shim
//! - `jwt`: compact EdDSA token construction

use std::sync::Arc;

use ed25519_dalek::SigningKey;

use crate::cache::token::Token;
use crate::config::credentials::IssuerConfig;
use crate::error::Result;

pub mod jwt;
pub mod key;

pub use jwt::{issue, issue_at, issue_from_source};
pub use key::{normalize_pem, parse_private_key, KeySource};

/// Anything that can mint a token for a given issue instant.
pub trait TokenIssuer: Send + Sync {
    fn issue_at(&self, iat: u64) -> Result<Token>;
}

/// Signer bound to the process issuer identity and its parsed key.
#[derive(Debug, Clone)]
pub struct Signer {
    kid: String,
    sub: String,
    key: Arc<SigningKey>,
}

impl Signer {
    pub fn new(config: &IssuerConfig) -> Self {
        Self {
            kid: config.kid.to_owned(),
            sub: config.sub.to_owned(),
            key: config.key.clone(),
        }
    }
}

impl TokenIssuer for Signer {
    fn issue_at(&self, iat: u64) -> Result<Token> {
        jwt::issue_at(&self.kid, &self.sub, &self.key, iat)
    }
}

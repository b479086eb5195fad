//! # QWeather credential service
//!
//! Issues Ed25519-signed JWTs that authenticate this server to the QWeather
//! API, caches the current token, and proxies weather queries with it.
//!
//! Modules:
//! - `signer`: key loading and compact EdDSA token construction
//! - `cache`: single-slot token cache with refresh margin
//! - `config`: YAML service configuration and credential resolution
//! - `weather`: upstream client sending `Authorization: Bearer <token>`
//! - `server`: HTTP routes, health and metrics

pub mod cache;
pub mod config;
pub mod error;
pub mod helpers;
pub mod observability;
pub mod resilience;
pub mod server;
pub mod signer;
pub mod utils;
pub mod weather;

#[cfg(test)]
pub mod tests;

pub use crate::cache::token::Token;
pub use crate::cache::token_cache::TokenCache;
pub use crate::config::types::ServiceConfig;
pub use crate::error::CredentialError;

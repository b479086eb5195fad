//! Upstream weather provider access.

pub mod client;
pub mod error;

pub use client::QWeatherClient;
pub use error::WeatherError;

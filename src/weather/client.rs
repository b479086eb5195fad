use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use http::header::AUTHORIZATION;
use http::StatusCode;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::cache::token_cache::TokenCache;
use crate::config::types::WeatherConfig;
use crate::helpers::time::get_instant;
use crate::observability::metrics::get_metrics;
use crate::resilience::retry::RetrySettings;
use crate::weather::error::WeatherError;

pub const VALID_DAYS: [u32; 5] = [3, 7, 10, 15, 30];
pub const VALID_HOURS: [u32; 3] = [24, 72, 168];
pub const DEFAULT_DAYS: u32 = 7;
pub const DEFAULT_HOURS: u32 = 24;
/// Life index type selecting every index.
pub const ALL_INDICES: &str = "0";

/// QWeather API client authenticating every call with a cached bearer token.
#[derive(Clone)]
pub struct QWeatherClient {
    http: Client,
    base_url: String,
    tokens: Arc<TokenCache>,
    retry: RetrySettings,
}

impl QWeatherClient {
    pub fn new(config: &WeatherConfig, tokens: Arc<TokenCache>, retry: RetrySettings) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            tokens,
            retry,
        })
    }

    /// `GET /v7/weather/now`
    pub async fn now(&self, location: &str) -> std::result::Result<Value, WeatherError> {
        self.fetch("now", "/v7/weather/now", location, &[]).await
    }

    /// `GET /v7/weather/{days}d`
    pub async fn daily(&self, location: &str, days: u32) -> std::result::Result<Value, WeatherError> {
        if !VALID_DAYS.contains(&days) {
            return Err(WeatherError::InvalidRequest(format!(
                "days must be one of {:?}",
                VALID_DAYS
            )));
        }
        let endpoint = format!("{}d", days);
        self.fetch(&endpoint, &format!("/v7/weather/{}", endpoint), location, &[])
            .await
    }

    /// `GET /v7/weather/{hours}h`
    pub async fn hourly(&self, location: &str, hours: u32) -> std::result::Result<Value, WeatherError> {
        if !VALID_HOURS.contains(&hours) {
            return Err(WeatherError::InvalidRequest(format!(
                "hours must be one of {:?}",
                VALID_HOURS
            )));
        }
        let endpoint = format!("{}h", hours);
        self.fetch(&endpoint, &format!("/v7/weather/{}", endpoint), location, &[])
            .await
    }

    /// `GET /v7/indices/1d`; `index_type` is `0` (all) or a comma list of ids.
    pub async fn indices(&self, location: &str, index_type: &str) -> std::result::Result<Value, WeatherError> {
        let index_type = index_type.trim();
        let well_formed = !index_type.is_empty()
            && index_type
                .split(',')
                .all(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()));
        if !well_formed {
            return Err(WeatherError::InvalidRequest(
                "type must be 0 or a comma separated list of index ids".to_owned(),
            ));
        }
        self.fetch("indices", "/v7/indices/1d", location, &[("type", index_type)])
            .await
    }

    /// `GET /v7/air/now`
    pub async fn air(&self, location: &str) -> std::result::Result<Value, WeatherError> {
        self.fetch("air", "/v7/air/now", location, &[]).await
    }

    /// `GET /geo/v2/city/lookup`; `keyword` is a city name, id or coordinate.
    pub async fn search_city(&self, keyword: &str) -> std::result::Result<Value, WeatherError> {
        self.fetch("city_lookup", "/geo/v2/city/lookup", keyword, &[]).await
    }

    /// `GET /v7/warning/now`
    pub async fn warning(&self, location: &str) -> std::result::Result<Value, WeatherError> {
        self.fetch("warning", "/v7/warning/now", location, &[]).await
    }

    /// Current conditions, 7 day and 24 hour forecasts, air quality and
    /// warnings fetched concurrently.
    ///
    /// Current conditions are required. Any other part that fails is logged
    /// and returned as `null`.
    pub async fn comprehensive(&self, location: &str) -> std::result::Result<Value, WeatherError> {
        let (now, daily, hourly, air, warning) = tokio::join!(
            self.now(location),
            self.daily(location, DEFAULT_DAYS),
            self.hourly(location, DEFAULT_HOURS),
            self.air(location),
            self.warning(location),
        );

        let now = now?;
        Ok(json!({
            "now": now["now"].clone(),
            "daily": optional_part("daily", daily, "daily"),
            "hourly": optional_part("hourly", hourly, "hourly"),
            "air": optional_part("air", air, "now"),
            "warning": optional_part("warning", warning, "warning"),
        }))
    }

    async fn fetch(
        &self,
        endpoint: &str,
        path: &str,
        location: &str,
        params: &[(&str, &str)],
    ) -> std::result::Result<Value, WeatherError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(WeatherError::InvalidRequest("location is required".to_owned()));
        }
        let metrics = get_metrics().await;
        let start = get_instant();
        metrics.upstream_requests.with_label_values(&[endpoint]).inc();

        let result = self
            .retry
            .run_with_retry(
                || self.fetch_once(endpoint, path, location, params),
                WeatherError::is_retryable,
            )
            .await;

        metrics
            .upstream_duration
            .with_label_values(&[endpoint])
            .observe(start.elapsed().as_secs_f64());
        result.inspect_err(|e| {
            metrics
                .upstream_failures
                .with_label_values(&[endpoint, e.reason()])
                .inc();
        })
    }

    async fn fetch_once(
        &self,
        endpoint: &str,
        path: &str,
        location: &str,
        params: &[(&str, &str)],
    ) -> std::result::Result<Value, WeatherError> {
        // no credential, no request
        let token = self.tokens.get().await?;

        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} location={}", url, location);
        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, token.bearer())
            .query(&[("location", location)])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!("weather API rejected the credential, clearing token cache");
            self.tokens.reset().await;
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WeatherError::Status { status, body });
        }

        let body: Value = response.json().await?;
        match body.get("code").and_then(Value::as_str) {
            Some("200") | None => {
                info!("weather API {} ok", endpoint);
                Ok(body)
            }
            Some(code) => Err(WeatherError::Api(code.to_owned())),
        }
    }
}

fn optional_part(
    name: &str,
    result: std::result::Result<Value, WeatherError>,
    field: &str,
) -> Value {
    match result {
        Ok(body) => body[field].clone(),
        Err(e) => {
            warn!("comprehensive weather: {} unavailable: {}", name, e);
            Value::Null
        }
    }
}

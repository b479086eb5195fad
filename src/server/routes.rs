use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::server::server::AppState;
use crate::weather::client::{ALL_INDICES, DEFAULT_DAYS, DEFAULT_HOURS};
use crate::weather::WeatherError;

/// Response envelope used by the mini-app: `code` 0 means success.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Query parameters shared by the weather routes. Counts stay raw text so a
/// malformed value never fails extraction.
#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub location: Option<String>,
    pub days: Option<String>,
    pub hours: Option<String>,
    #[serde(rename = "type")]
    pub index_type: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/weather/now", get(weather_now))
        .route("/api/weather/daily", get(weather_daily))
        .route("/api/weather/hourly", get(weather_hourly))
        .route("/api/weather/indices", get(weather_indices))
        .route("/api/weather/air", get(weather_air))
        .route("/api/weather/city/search", get(city_search))
        .route("/api/weather/warning", get(weather_warning))
        .route("/api/weather/comprehensive", get(weather_comprehensive))
}

async fn healthz() -> Response {
    success(Value::Null, "ok")
}

async fn weather_now(State(state): State<AppState>, Query(query): Query<WeatherQuery>) -> Response {
    let Some(location) = required_location(&query) else {
        return failure(StatusCode::BAD_REQUEST, "location is required");
    };
    into_response(state.weather.now(location).await, "current weather")
}

async fn weather_daily(State(state): State<AppState>, Query(query): Query<WeatherQuery>) -> Response {
    let Some(location) = required_location(&query) else {
        return failure(StatusCode::BAD_REQUEST, "location is required");
    };
    let days = count_or_default(query.days.as_deref(), DEFAULT_DAYS);
    into_response(state.weather.daily(location, days).await, "daily forecast")
}

async fn weather_hourly(State(state): State<AppState>, Query(query): Query<WeatherQuery>) -> Response {
    let Some(location) = required_location(&query) else {
        return failure(StatusCode::BAD_REQUEST, "location is required");
    };
    let hours = count_or_default(query.hours.as_deref(), DEFAULT_HOURS);
    into_response(state.weather.hourly(location, hours).await, "hourly forecast")
}

async fn weather_indices(State(state): State<AppState>, Query(query): Query<WeatherQuery>) -> Response {
    let Some(location) = required_location(&query) else {
        return failure(StatusCode::BAD_REQUEST, "location is required");
    };
    let index_type = query
        .index_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(ALL_INDICES);
    into_response(state.weather.indices(location, index_type).await, "weather indices")
}

async fn weather_air(State(state): State<AppState>, Query(query): Query<WeatherQuery>) -> Response {
    let Some(location) = required_location(&query) else {
        return failure(StatusCode::BAD_REQUEST, "location is required");
    };
    into_response(state.weather.air(location).await, "air quality")
}

async fn city_search(State(state): State<AppState>, Query(query): Query<WeatherQuery>) -> Response {
    let Some(keyword) = required_location(&query) else {
        return failure(StatusCode::BAD_REQUEST, "search keyword is required");
    };
    into_response(state.weather.search_city(keyword).await, "city search")
}

async fn weather_warning(State(state): State<AppState>, Query(query): Query<WeatherQuery>) -> Response {
    let Some(location) = required_location(&query) else {
        return failure(StatusCode::BAD_REQUEST, "location is required");
    };
    into_response(state.weather.warning(location).await, "weather warning")
}

async fn weather_comprehensive(State(state): State<AppState>, Query(query): Query<WeatherQuery>) -> Response {
    let Some(location) = required_location(&query) else {
        return failure(StatusCode::BAD_REQUEST, "location is required");
    };
    into_response(state.weather.comprehensive(location).await, "comprehensive weather")
}

/// Unparsable, negative or zero counts fall back to `default`; other values
/// are checked by the client.
fn count_or_default(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(default)
}

fn required_location(query: &WeatherQuery) -> Option<&str> {
    query
        .location
        .as_deref()
        .map(str::trim)
        .filter(|location| !location.is_empty())
}

fn into_response(result: Result<Value, WeatherError>, what: &str) -> Response {
    match result {
        Ok(data) => success(data, &format!("{} fetched", what)),
        Err(e) => {
            error!("{} failed: {}", what, e);
            let status = match &e {
                WeatherError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                WeatherError::Credential(_) => StatusCode::INTERNAL_SERVER_ERROR,
                WeatherError::Status { .. } | WeatherError::Api(_) | WeatherError::Transport(_) => {
                    StatusCode::BAD_GATEWAY
                }
            };
            failure(status, &e.to_string())
        }
    }
}

fn success(data: Value, message: &str) -> Response {
    let body = ApiResponse {
        code: 0,
        message: message.to_owned(),
        data: (!data.is_null()).then_some(data),
    };
    (StatusCode::OK, Json(body)).into_response()
}

fn failure(status: StatusCode, message: &str) -> Response {
    let body = ApiResponse {
        code: status.as_u16(),
        message: message.to_owned(),
        data: None,
    };
    (status, Json(body)).into_response()
}

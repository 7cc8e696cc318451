//! Meteostat JSON API (point daily data).
//!
//! The point endpoint interpolates nearby stations to the requested
//! coordinates and elevation. Long ranges are requested one calendar year at a
//! time and concatenated.

use chrono::{Datelike, NaiveDate};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::data::{WeatherRequest, WeatherSource};
use crate::domain::DailyWeather;
use crate::error::AppError;

const BASE_URL: &str = "https://meteostat.p.rapidapi.com/point/daily";
const API_HOST: &str = "meteostat.p.rapidapi.com";
const API_KEY_VAR: &str = "METEOSTAT_API_KEY";

pub struct MeteostatClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl MeteostatClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var(API_KEY_VAR)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AppError::authentication(format!("Missing {API_KEY_VAR} in environment (.env).")))?;
        Ok(Self::new(api_key))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn fetch_window(&self, request: &WeatherRequest, start: NaiveDate, end: NaiveDate) -> Result<Vec<DailyWeather>, AppError> {
        let resp = self
            .client
            .get(&self.base_url)
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", API_HOST)
            .query(&[
                ("lat", request.point.latitude.to_string()),
                ("lon", request.point.longitude.to_string()),
                ("alt", format!("{:.0}", request.point.elevation_m)),
                ("start", start.to_string()),
                ("end", end.to_string()),
            ])
            .send()
            .map_err(|e| AppError::data_unavailable(format!("Meteostat request failed: {e}")))?;

        let status = resp.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(AppError::authentication("Meteostat rejected the API key."));
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(AppError::data_unavailable("Meteostat rate limit exceeded."));
            }
            s if !s.is_success() => {
                return Err(AppError::data_unavailable(format!("Meteostat request failed with status {s}.")));
            }
            _ => {}
        }

        let body = resp
            .text()
            .map_err(|e| AppError::data_unavailable(format!("Failed to read Meteostat response: {e}")))?;
        parse_daily(&body)
    }
}

impl WeatherSource for MeteostatClient {
    fn name(&self) -> &str {
        "meteostat"
    }

    fn fetch_daily(&self, request: &WeatherRequest) -> Result<Vec<DailyWeather>, AppError> {
        info!(
            lat = request.point.latitude,
            lon = request.point.longitude,
            start = %request.start,
            end = %request.end,
            "fetching daily weather"
        );

        let mut out = Vec::new();
        for (start, end) in year_windows(request.start, request.end) {
            let rows = self.fetch_window(request, start, end)?;
            debug!(%start, %end, n = rows.len(), "fetched weather window");
            out.extend(rows);
        }

        if out.is_empty() {
            return Err(AppError::data_unavailable(format!(
                "No weather data near ({}, {}) for {}..{}.",
                request.point.latitude, request.point.longitude, request.start, request.end
            )));
        }
        Ok(out)
    }
}

#[derive(Debug, Deserialize)]
struct DailyResponse {
    #[serde(default)]
    data: Option<Vec<Row>>,
}

#[derive(Debug, Deserialize)]
struct Row {
    date: String,
    tavg: Option<f64>,
    tmin: Option<f64>,
    tmax: Option<f64>,
    prcp: Option<f64>,
}

/// Parse a `/point/daily` response body. A `null` data array means no nearby
/// station had data and yields an empty vector.
pub fn parse_daily(body: &str) -> Result<Vec<DailyWeather>, AppError> {
    let resp: DailyResponse = serde_json::from_str(body)
        .map_err(|e| AppError::data_unavailable(format!("Failed to parse Meteostat response: {e}")))?;

    resp.data
        .unwrap_or_default()
        .into_iter()
        .map(|row| {
            let raw = row.date.get(..10).unwrap_or(&row.date);
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|e| AppError::data_unavailable(format!("Invalid Meteostat date '{}': {e}", row.date)))?;
            Ok(DailyWeather {
                date,
                tavg: row.tavg,
                tmin: row.tmin,
                tmax: row.tmax,
                prcp: row.prcp,
            })
        })
        .collect()
}

/// Split `[start, end]` into calendar-year windows.
pub fn year_windows(start: NaiveDate, end: NaiveDate) -> Vec<(NaiveDate, NaiveDate)> {
    let mut out = Vec::new();
    let mut cursor = start;
    while cursor <= end {
        let year_end = NaiveDate::from_ymd_opt(cursor.year(), 12, 31).unwrap_or(end);
        let window_end = year_end.min(end);
        out.push((cursor, window_end));
        match window_end.succ_opt() {
            Some(next) => cursor = next,
            None => break,
        }
    }
    out
}

//! Tiingo end-of-day price API.

use chrono::NaiveDate;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::data::{QuoteRequest, QuoteSource};
use crate::domain::{PriceField, PricePoint};
use crate::error::AppError;

const BASE_URL: &str = "https://api.tiingo.com/tiingo/daily";
const API_KEY_VAR: &str = "TIINGO_API_KEY";

/// Exchange suffixes of Reuters instrument codes (`AAPL.O`, `IBM.N`).
const RIC_EXCHANGE_SUFFIXES: [&str; 7] = ["O", "OQ", "N", "K", "A", "P", "PK"];

pub struct TiingoClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TiingoClient {
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
}

impl QuoteSource for TiingoClient {
    fn name(&self) -> &str {
        "tiingo"
    }

    fn fetch_prices(&self, request: &QuoteRequest) -> Result<Vec<PricePoint>, AppError> {
        let ticker = ticker_from_symbol(&request.symbol);
        let url = format!("{}/{}/prices", self.base_url, ticker);
        info!(%ticker, start = %request.start, end = %request.end, "fetching prices");

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("startDate", request.start.to_string().as_str()),
                ("endDate", request.end.to_string().as_str()),
                ("resampleFreq", request.interval.as_str()),
                ("token", self.api_key.as_str()),
            ])
            .send()
            .map_err(|e| AppError::data_unavailable(format!("Tiingo request failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| AppError::data_unavailable(format!("Failed to read Tiingo response: {e}")))?;

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(AppError::authentication(format!(
                    "Tiingo rejected the API key: {}",
                    error_detail(&body)
                )));
            }
            StatusCode::NOT_FOUND => {
                return Err(AppError::data_unavailable(format!(
                    "Unknown symbol '{}': {}",
                    request.symbol,
                    error_detail(&body)
                )));
            }
            s if !s.is_success() => {
                return Err(AppError::data_unavailable(format!("Tiingo request failed with status {s}.")));
            }
            _ => {}
        }

        let points = parse_prices(&body, request.field)?;
        debug!(n = points.len(), "parsed price bars");
        Ok(points)
    }
}

#[derive(Debug, Deserialize)]
struct Bar {
    date: String,
    close: Option<f64>,
    #[serde(rename = "adjClose")]
    adj_close: Option<f64>,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Parse a successful price response body into points for `field`.
///
/// Bars without a value for the requested field are skipped. A JSON object with
/// a `detail` message instead of an array is treated as a provider error.
pub fn parse_prices(body: &str, field: PriceField) -> Result<Vec<PricePoint>, AppError> {
    let bars: Vec<Bar> = match serde_json::from_str(body) {
        Ok(bars) => bars,
        Err(e) => {
            if let Ok(err) = serde_json::from_str::<ErrorBody>(body) {
                let lower = err.detail.to_lowercase();
                return Err(if lower.contains("token") || lower.contains("auth") {
                    AppError::authentication(format!("Tiingo: {}", err.detail))
                } else {
                    AppError::data_unavailable(format!("Tiingo: {}", err.detail))
                });
            }
            return Err(AppError::data_unavailable(format!("Failed to parse Tiingo response: {e}")));
        }
    };

    let mut out = Vec::with_capacity(bars.len());
    for bar in bars {
        let value = match field {
            PriceField::Close => bar.close,
            PriceField::AdjClose => bar.adj_close,
            PriceField::Open => bar.open,
            PriceField::High => bar.high,
            PriceField::Low => bar.low,
        };
        let Some(value) = value.filter(|v| v.is_finite()) else {
            continue;
        };
        // Dates come back as `2023-01-03T00:00:00.000Z`.
        let raw = bar.date.get(..10).unwrap_or(&bar.date);
        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|e| AppError::data_unavailable(format!("Invalid Tiingo date '{}': {e}", bar.date)))?;
        out.push(PricePoint { date, close: value });
    }
    Ok(out)
}

/// Map an instrument symbol to a Tiingo ticker.
///
/// Reuters-style exchange suffixes are dropped (`AAPL.O` -> `AAPL`) and share
/// class separators become dashes (`BRK.B` -> `BRK-B`).
pub fn ticker_from_symbol(symbol: &str) -> String {
    let symbol = symbol.trim();
    let base = match symbol.rsplit_once('.') {
        Some((head, suffix)) if RIC_EXCHANGE_SUFFIXES.contains(&suffix) => head,
        _ => symbol,
    };
    base.replace('.', "-").to_uppercase()
}

fn error_detail(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.detail)
        .unwrap_or_else(|_| body.chars().take(200).collect())
}

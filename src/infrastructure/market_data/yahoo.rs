use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{SeriesFetcher, SeriesRequest};
use crate::shared::errors::FetchError;
use crate::shared::types::{Observation, PriceSeries};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

// the chart endpoint rejects requests without a browser-like agent
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) fairfx/0.2";

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Yahoo Finance v8 chart client
pub struct YahooChartClient {
    http_client: Client,
    base_url: String,
}

impl YahooChartClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn chart_url(&self, request: &SeriesRequest) -> Result<Url, FetchError> {
        let decode_err = |message: String| FetchError::Decode {
            symbol: request.symbol.clone(),
            message,
        };
        let mut url = Url::parse(&self.base_url).map_err(|e| decode_err(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| decode_err(format!("base url cannot carry a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", request.symbol.as_str()]);
        url.query_pairs_mut()
            .append_pair("period1", &request.start.timestamp().to_string())
            .append_pair("period2", &request.end.timestamp().to_string())
            .append_pair("interval", request.interval.as_str());
        Ok(url)
    }
}

#[async_trait]
impl SeriesFetcher for YahooChartClient {
    async fn fetch(&self, request: &SeriesRequest) -> Result<PriceSeries, FetchError> {
        let url = self.chart_url(request)?;
        info!("Fetching {} ({}) from {} to {}", request.symbol, request.interval.as_str(), request.start, request.end);
        debug!("GET {}", url);

        let request_err = |source| FetchError::Request {
            symbol: request.symbol.clone(),
            source,
        };
        let response = self.http_client.get(url).send().await.map_err(request_err)?;
        let status = response.status();
        let body = response.text().await.map_err(request_err)?;

        if !status.is_success() {
            // error responses still carry a chart.error payload when the symbol is unknown
            if let Ok(envelope) = serde_json::from_str::<ChartEnvelope>(&body) {
                if let Some(err) = envelope.chart.error {
                    return Err(provider_error(&request.symbol, err));
                }
            }
            warn!("Chart request for {} returned status {}", request.symbol, status);
            return Err(FetchError::Status {
                symbol: request.symbol.clone(),
                status: status.as_u16(),
            });
        }

        let series = decode_chart(&request.symbol, &body)?;
        info!("Fetched {} observations for {}", series.len(), request.symbol);
        Ok(series)
    }
}

fn provider_error(symbol: &str, err: ChartError) -> FetchError {
    FetchError::Provider {
        symbol: symbol.to_string(),
        message: match err.description {
            Some(description) => format!("{}: {}", err.code, description),
            None => err.code,
        },
    }
}

/// Decode a chart payload into a series, dropping null closes.
fn decode_chart(symbol: &str, body: &str) -> Result<PriceSeries, FetchError> {
    let envelope: ChartEnvelope = serde_json::from_str(body).map_err(|e| FetchError::Decode {
        symbol: symbol.to_string(),
        message: e.to_string(),
    })?;

    if let Some(err) = envelope.chart.error {
        return Err(provider_error(symbol, err));
    }

    let result = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| FetchError::Empty { symbol: symbol.to_string() })?;

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    if closes.len() != result.timestamp.len() {
        return Err(FetchError::Decode {
            symbol: symbol.to_string(),
            message: format!(
                "{} timestamps but {} closes",
                result.timestamp.len(),
                closes.len()
            ),
        });
    }

    let mut observations = Vec::with_capacity(closes.len());
    for (ts, close) in result.timestamp.iter().zip(closes) {
        let Some(close) = close else { continue };
        let timestamp = DateTime::<Utc>::from_timestamp(*ts, 0).ok_or_else(|| FetchError::Decode {
            symbol: symbol.to_string(),
            message: format!("timestamp out of range: {}", ts),
        })?;
        observations.push(Observation::new(timestamp, close));
    }

    if observations.is_empty() {
        return Err(FetchError::Empty { symbol: symbol.to_string() });
    }
    PriceSeries::new(symbol, observations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::Interval;
    use chrono::TimeZone;

    #[test]
    fn test_decode_chart_drops_null_closes() {
        let body = r#"{"chart":{"result":[{"meta":{"symbol":"USDKRW=X"},
            "timestamp":[1714521600,1714525200,1714528800],
            "indicators":{"quote":[{"close":[1375.5,null,1378.25]}]}}],"error":null}}"#;
        let series = decode_chart("USDKRW=X", body).unwrap();
        assert_eq!(series.closes(), vec![1375.5, 1378.25]);
        assert_eq!(
            series.last().unwrap().timestamp,
            Utc.timestamp_opt(1714528800, 0).unwrap()
        );
    }

    #[test]
    fn test_decode_chart_provider_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        match decode_chart("NOPE", body) {
            Err(FetchError::Provider { symbol, message }) => {
                assert_eq!(symbol, "NOPE");
                assert!(message.starts_with("Not Found"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_decode_chart_empty_result() {
        let body = r#"{"chart":{"result":[{"indicators":{"quote":[{}]}}],"error":null}}"#;
        assert!(matches!(decode_chart("^N225", body), Err(FetchError::Empty { .. })));

        let nulls = r#"{"chart":{"result":[{"timestamp":[1714521600],"indicators":{"quote":[{"close":[null]}]}}],"error":null}}"#;
        assert!(matches!(decode_chart("^N225", nulls), Err(FetchError::Empty { .. })));
    }

    #[test]
    fn test_decode_chart_garbage() {
        assert!(matches!(decode_chart("X", "<html>"), Err(FetchError::Decode { .. })));
    }

    #[test]
    fn test_chart_url_encodes_symbol() {
        let client = YahooChartClient::new("https://query1.finance.yahoo.com/", Duration::from_secs(5)).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 4, 3, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let url = client
            .chart_url(&SeriesRequest::new("^N225", start, end, Interval::Daily))
            .unwrap();
        assert!(url.path().starts_with("/v8/finance/chart/"));
        assert!(url.path().ends_with("N225"));
        assert_eq!(
            url.query(),
            Some("period1=1712102400&period2=1714521600&interval=1d")
        );
    }
}

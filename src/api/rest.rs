use crate::config::QuoteSourceConfig;
use crate::error::{OptionsError, Result};
use crate::models::OptionChainResponse;
use crate::utils::{chain_csv_path, write_chain_csv};
use chrono::NaiveDate;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use url::Url;

const HISTORICAL_OPTIONS: &str = "HISTORICAL_OPTIONS";

/// Keys Alpha Vantage uses to report a refused or throttled request
const API_NOTICE_KEYS: [&str; 3] = ["Error Message", "Information", "Note"];

pub struct QuoteClient {
    client: reqwest::Client,
    config: QuoteSourceConfig,
}

impl QuoteClient {
    pub fn new(config: QuoteSourceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Build the request URL for a ticker, optionally pinned to a historical date
    pub fn chain_url(&self, ticker: &str, date: Option<NaiveDate>) -> Result<Url> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            OptionsError::ConfigError("ALPHAVANTAGE_API_KEY environment variable not set".to_string())
        })?;

        let mut params = vec![
            ("function", HISTORICAL_OPTIONS.to_string()),
            ("symbol", ticker.to_string()),
        ];
        if let Some(d) = date {
            params.push(("date", d.format("%Y-%m-%d").to_string()));
        }
        params.push(("apikey", api_key.to_string()));

        Url::parse_with_params(&self.config.base_url, &params).map_err(|e| {
            OptionsError::ConfigError(format!("Invalid quote source URL '{}': {}", self.config.base_url, e))
        })
    }

    /// Get the options chain for a ticker (latest session when `date` is None)
    pub async fn fetch_chain(
        &self,
        ticker: &str,
        date: Option<NaiveDate>,
    ) -> Result<OptionChainResponse> {
        info!("Getting options chain for {} (date: {:?})", ticker, date);
        let url = self.chain_url(ticker, date)?;

        let resp = self
            .client
            .get(url)
            .timeout(self.config.timeout())
            .send()
            .await
            .map_err(|e| OptionsError::RequestError(format!("Failed to get options chain: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(OptionsError::RequestError(format!(
                "Options chain request failed with status {}: {}",
                status, error_text
            )));
        }

        let resp_text = resp
            .text()
            .await
            .map_err(|e| OptionsError::RequestError(format!("Failed to get response text: {}", e)))?;

        debug!(
            "Options chain response (first 200 chars): {}",
            resp_text.chars().take(200).collect::<String>()
        );

        let chain = parse_chain_response(&resp_text)?;
        info!("Response parsed successfully. Got {} contracts", chain.data.len());
        Ok(chain)
    }

    /// Fetch a chain and write it as CSV under `data_dir`.
    ///
    /// Returns `None` when the quote source has no contracts for the request.
    pub async fn fetch_chain_to_csv(
        &self,
        ticker: &str,
        date: Option<NaiveDate>,
        data_dir: &Path,
    ) -> Result<Option<PathBuf>> {
        let chain = self.fetch_chain(ticker, date).await?;
        if chain.data.is_empty() {
            warn!("No option data returned for {}", ticker);
            return Ok(None);
        }

        let path = chain_csv_path(data_dir, ticker, date);
        write_chain_csv(&path, &chain.data)?;
        info!("{} CSV file {} written ({} rows)", ticker, path.display(), chain.data.len());
        Ok(Some(path))
    }
}

/// Decode a chain payload, surfacing API notices as request errors
pub fn parse_chain_response(text: &str) -> Result<OptionChainResponse> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| OptionsError::ParseError(format!("Failed to parse options chain: {}", e)))?;

    if value.get("data").is_none() {
        for key in API_NOTICE_KEYS {
            if let Some(msg) = value.get(key).and_then(|m| m.as_str()) {
                return Err(OptionsError::RequestError(format!("{}: {}", key, msg)));
            }
        }
    }

    let chain = serde_json::from_value::<OptionChainResponse>(value)?;
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: Option<&str>) -> QuoteSourceConfig {
        QuoteSourceConfig {
            api_key: api_key.map(str::to_string),
            base_url: "https://www.alphavantage.co/query".to_string(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn url_for_latest_chain() {
        let client = QuoteClient::new(config(Some("demo")));
        let url = client.chain_url("SPY", None).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.alphavantage.co/query?function=HISTORICAL_OPTIONS&symbol=SPY&apikey=demo"
        );
    }

    #[test]
    fn url_for_historical_chain() {
        let client = QuoteClient::new(config(Some("demo")));
        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let url = client.chain_url("IBM", Some(date)).unwrap();
        assert_eq!(url.query_pairs().find(|(k, _)| k == "date").unwrap().1, "2025-01-02");
        assert_eq!(url.query_pairs().find(|(k, _)| k == "symbol").unwrap().1, "IBM");
    }

    #[test]
    fn missing_api_key_is_config_error() {
        let client = QuoteClient::new(config(None));
        assert!(matches!(
            client.chain_url("SPY", None),
            Err(OptionsError::ConfigError(_))
        ));
    }

    #[test]
    fn parses_chain_payload() {
        let text = r#"{
            "endpoint": "Historical Options",
            "message": "success",
            "data": [
                {"contractID": "SPY250620C00100000", "symbol": "SPY", "type": "call",
                 "strike": "100.00", "expiration": "2025-06-20", "date": "2025-01-01",
                 "implied_volatility": "0.2"}
            ]
        }"#;
        let chain = parse_chain_response(text).unwrap();
        assert_eq!(chain.message, "success");
        assert_eq!(chain.data.len(), 1);
        assert_eq!(chain.data[0].strike, "100.00");
    }

    #[test]
    fn api_notice_is_request_error() {
        let text = r#"{"Information": "rate limit reached"}"#;
        let err = parse_chain_response(text).unwrap_err();
        assert!(matches!(err, OptionsError::RequestError(ref m) if m.contains("rate limit")));
    }

    #[test]
    fn garbage_is_parse_error() {
        assert!(matches!(
            parse_chain_response("<html>"),
            Err(OptionsError::ParseError(_))
        ));
    }
}

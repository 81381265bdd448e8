use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::currency::{CurrencyRateProvider, RateQuote};

/// Rate provider for the ExchangeRate-API pair endpoint,
/// `GET {base_url}/{api_key}/pair/{from}/{to}`.
pub struct ExchangeRateApiProvider {
    base_url: String,
    api_key: String,
    timeout: Option<Duration>,
}

impl ExchangeRateApiProvider {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        ExchangeRateApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn pair_url(&self, key: &str, from: &str, to: &str) -> String {
        format!("{}/{}/pair/{}/{}", self.base_url, key, from, to)
    }
}

#[derive(Debug, Deserialize)]
struct PairResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(rename = "error-type", default)]
    error_type: Option<String>,
    conversion_rate: Option<f64>,
    #[serde(default)]
    time_last_update_unix: Option<i64>,
}

#[async_trait]
impl CurrencyRateProvider for ExchangeRateApiProvider {
    #[instrument(name = "ExchangeRateApiFetch", skip(self))]
    async fn get_rate(&self, from: &str, to: &str) -> Result<RateQuote> {
        let pair = format!("{from}/{to}");
        let url = self.pair_url(&self.api_key, from, to);
        debug!("Requesting conversion rate from {}", self.pair_url("***", from, to));

        let mut builder = reqwest::Client::builder().user_agent("fxconv/1.0");
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        // reqwest errors carry the URL, which contains the API key
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for currency pair: {}", e.without_url(), pair))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for currency pair: {}",
                response.status(),
                pair
            ));
        }

        let text = response.text().await?;

        let data: PairResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", pair, e))?;

        if data.result.as_deref() == Some("error") {
            return Err(anyhow!(
                "API error: {} for currency pair: {}",
                data.error_type.as_deref().unwrap_or("unknown"),
                pair
            ));
        }

        let rate = data
            .conversion_rate
            .ok_or_else(|| anyhow!("No conversion rate found for currency pair: {}", pair))?;
        let updated_at = data
            .time_last_update_unix
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single());

        Ok(RateQuote { rate, updated_at })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const API_KEY: &str = "test-key";

    async fn create_mock_server(pair: &str, response: ResponseTemplate) -> MockServer {
        let mock_server = MockServer::start().await;
        let request_path = format!("/{API_KEY}/pair/{pair}");

        Mock::given(method("GET"))
            .and(path(request_path))
            .respond_with(response)
            .mount(&mock_server)
            .await;

        mock_server
    }

    #[tokio::test]
    async fn test_successful_rate_fetch() {
        let mock_response = r#"{
            "result": "success",
            "documentation": "https://www.exchangerate-api.com/docs",
            "time_last_update_unix": 1585267200,
            "time_last_update_utc": "Fri, 27 Mar 2020 00:00:00 +0000",
            "base_code": "USD",
            "target_code": "IDR",
            "conversion_rate": 15000.0
        }"#;
        let mock_server = create_mock_server(
            "USD/IDR",
            ResponseTemplate::new(200).set_body_string(mock_response),
        )
        .await;

        let provider = ExchangeRateApiProvider::new(&mock_server.uri(), API_KEY);
        let quote = provider
            .get_rate("USD", "IDR")
            .await
            .expect("Failed to get rate");
        assert_eq!(quote.rate, 15000.0);
        assert_eq!(
            quote.updated_at,
            Utc.timestamp_opt(1585267200, 0).single()
        );
    }

    #[tokio::test]
    async fn test_minimal_response() {
        let mock_server = create_mock_server(
            "EUR/GBP",
            ResponseTemplate::new(200).set_body_string(r#"{"conversion_rate": 0.8412}"#),
        )
        .await;

        // Trailing slash on the base URL is tolerated
        let provider = ExchangeRateApiProvider::new(&format!("{}/", mock_server.uri()), API_KEY);
        let quote = provider.get_rate("EUR", "GBP").await.unwrap();
        assert_eq!(quote.rate, 0.8412);
        assert!(quote.updated_at.is_none());
    }

    #[tokio::test]
    async fn test_api_error_response() {
        let mock_server = create_mock_server(
            "USD/IDR",
            ResponseTemplate::new(404)
                .set_body_string(r#"{"result": "error", "error-type": "invalid-key"}"#),
        )
        .await;

        let provider = ExchangeRateApiProvider::new(&mock_server.uri(), API_KEY);
        let result = provider.get_rate("USD", "IDR").await;
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 404 Not Found for currency pair: USD/IDR"
        );
    }

    #[tokio::test]
    async fn test_error_result_with_success_status() {
        let mock_server = create_mock_server(
            "USD/XYZ",
            ResponseTemplate::new(200)
                .set_body_string(r#"{"result": "error", "error-type": "unsupported-code"}"#),
        )
        .await;

        let provider = ExchangeRateApiProvider::new(&mock_server.uri(), API_KEY);
        let result = provider.get_rate("USD", "XYZ").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "API error: unsupported-code for currency pair: USD/XYZ"
        );
    }

    #[tokio::test]
    async fn test_server_error_response() {
        let mock_server = create_mock_server("USD/IDR", ResponseTemplate::new(500)).await;

        let provider = ExchangeRateApiProvider::new(&mock_server.uri(), API_KEY);
        let result = provider.get_rate("USD", "IDR").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 500 Internal Server Error for currency pair: USD/IDR"
        );
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let mock_server = create_mock_server(
            "USD/IDR",
            ResponseTemplate::new(200).set_body_string("<html>not json</html>"),
        )
        .await;

        let provider = ExchangeRateApiProvider::new(&mock_server.uri(), API_KEY);
        let result = provider.get_rate("USD", "IDR").await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse JSON response for USD/IDR")
        );
    }

    #[tokio::test]
    async fn test_missing_conversion_rate() {
        let mock_server = create_mock_server(
            "USD/IDR",
            ResponseTemplate::new(200).set_body_string(r#"{"result": "success"}"#),
        )
        .await;

        let provider = ExchangeRateApiProvider::new(&mock_server.uri(), API_KEY);
        let result = provider.get_rate("USD", "IDR").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "No conversion rate found for currency pair: USD/IDR"
        );
    }

    #[tokio::test]
    async fn test_wrong_api_key_is_not_matched() {
        let mock_server = create_mock_server(
            "USD/IDR",
            ResponseTemplate::new(200).set_body_string(r#"{"conversion_rate": 1.0}"#),
        )
        .await;

        let provider = ExchangeRateApiProvider::new(&mock_server.uri(), "");
        let result = provider.get_rate("USD", "IDR").await;
        assert!(result.unwrap_err().to_string().starts_with("HTTP error: 404"));
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let mock_server = create_mock_server(
            "USD/IDR",
            ResponseTemplate::new(200)
                .set_body_string(r#"{"conversion_rate": 1.0}"#)
                .set_delay(Duration::from_millis(500)),
        )
        .await;

        let provider = ExchangeRateApiProvider::new(&mock_server.uri(), API_KEY)
            .with_timeout(Some(Duration::from_millis(50)));
        let result = provider.get_rate("USD", "IDR").await;
        let message = result.unwrap_err().to_string();
        assert!(message.starts_with("Request error:"));
        assert!(!message.contains(API_KEY));
    }
}

//! Currency conversion abstractions

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct RateQuote {
    /// Units of the target currency for one unit of the source currency.
    pub rate: f64,
    pub updated_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    async fn get_rate(&self, from: &str, to: &str) -> Result<RateQuote>;
}

/// Trims and upper-cases a currency code. Codes are otherwise opaque and left
/// for the rate provider to validate.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

use super::amount::parse_amount;
use super::currency::{CurrencyRateProvider, normalize_code};
use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// Fraction digits kept in a converted amount.
pub const CONVERTED_SCALE: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub source: String,
    pub target: String,
    /// Canonical amount digits, see [`crate::core::amount`].
    pub amount: String,
}

impl ConversionRequest {
    pub fn new(source: &str, target: &str, amount: &str) -> Self {
        Self {
            source: normalize_code(source),
            target: normalize_code(target),
            amount: amount.to_string(),
        }
    }

    pub fn amount_value(&self) -> Option<Decimal> {
        parse_amount(&self.amount)
    }

    /// A rate is only requested for a positive amount.
    ///
    /// Amounts too large for a `Decimal` (more than 28 significant digits)
    /// are treated like an empty amount, so no rate is requested for them.
    pub fn is_convertible(&self) -> bool {
        self.amount_value().is_some_and(|amount| amount > Decimal::ZERO)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    pub request: ConversionRequest,
    pub rate: f64,
    pub converted: Decimal,
    pub rate_updated_at: Option<DateTime<Utc>>,
}

impl ConversionResult {
    pub fn converted_display(&self) -> String {
        format!("{:.2}", self.converted)
    }
}

/// Multiplies `amount` by `rate` and rounds half away from zero to two places.
pub fn convert_amount(rate: f64, amount: Decimal) -> Result<Decimal> {
    let rate_dec = Decimal::try_from(rate)
        .map_err(|e| anyhow!("Unrepresentable conversion rate {}: {}", rate, e))?;
    let product = rate_dec
        .checked_mul(amount)
        .ok_or_else(|| anyhow!("Converted amount overflows for rate {} and amount {}", rate, amount))?;
    Ok(product.round_dp_with_strategy(CONVERTED_SCALE, RoundingStrategy::MidpointAwayFromZero))
}

/// Turns a [`ConversionRequest`] into a [`ConversionResult`] using a rate provider.
///
/// Failures never escape: they are logged and reported as `None`, which the
/// view renders as an unavailable rate.
#[derive(Clone)]
pub struct RateFetcher {
    provider: Arc<dyn CurrencyRateProvider>,
}

impl RateFetcher {
    pub fn new(provider: Arc<dyn CurrencyRateProvider>) -> Self {
        Self { provider }
    }

    #[instrument(
        name = "RateFetch",
        skip(self, request),
        fields(source = %request.source, target = %request.target, amount = %request.amount)
    )]
    pub async fn fetch(&self, request: &ConversionRequest) -> Option<ConversionResult> {
        let Some(amount) = request
            .amount_value()
            .filter(|amount| *amount > Decimal::ZERO)
        else {
            debug!("Amount is not positive, skipping rate fetch");
            return None;
        };

        match self.try_fetch(request, amount).await {
            Ok(result) => {
                debug!(converted = %result.converted, "Conversion complete");
                Some(result)
            }
            Err(e) => {
                error!(error = %e, "Error fetching exchange rate");
                None
            }
        }
    }

    async fn try_fetch(
        &self,
        request: &ConversionRequest,
        amount: Decimal,
    ) -> Result<ConversionResult> {
        let quote = self
            .provider
            .get_rate(&request.source, &request.target)
            .await?;
        let converted = convert_amount(quote.rate, amount)?;
        Ok(ConversionResult {
            request: request.clone(),
            rate: quote.rate,
            converted,
            rate_updated_at: quote.updated_at,
        })
    }
}

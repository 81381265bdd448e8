//! Core conversion logic: amount normalization, rate fetching and form state

pub mod amount;
pub mod config;
pub mod conversion;
pub mod currency;
pub mod log;
pub mod view;

// Re-export main types for cleaner imports
pub use conversion::{ConversionRequest, ConversionResult, RateFetcher};
pub use currency::{CurrencyRateProvider, RateQuote};
pub use view::{Converter, FetchTicket, ViewState};

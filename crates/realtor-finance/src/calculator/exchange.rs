//! USD→ARS quote used to show mortgage figures in pesos.
//!
//! The provider never fails: a slow or broken upstream degrades to the last good quote, or to
//! the configured default on a cold start. Quotes only decorate responses; they are never an
//! input to the amortization math.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::mortgage::MortgageResult;
use crate::config::ExchangeConfig;

#[derive(Debug, thiserror::Error)]
pub enum ExchangeRateError {
    #[error("exchange rate request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("exchange rate upstream did not answer within {0:?}")]
    Timeout(Duration),
    #[error("exchange rate upstream returned an unusable quote: {0}")]
    InvalidQuote(f64),
    #[error("exchange rate upstream unavailable: {0}")]
    Unavailable(String),
}

/// Anything able to produce a spot ARS-per-USD rate.
#[async_trait]
pub trait ExchangeRateSource: Send + Sync {
    async fn fetch(&self) -> Result<f64, ExchangeRateError>;
}

/// Reads the `venta` field of a dolarapi-style JSON quote.
pub struct LiveExchangeRateSource {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct UpstreamQuote {
    venta: f64,
}

impl LiveExchangeRateSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ExchangeRateError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ExchangeRateSource for LiveExchangeRateSource {
    async fn fetch(&self) -> Result<f64, ExchangeRateError> {
        let quote = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json::<UpstreamQuote>()
            .await?;
        Ok(quote.venta)
    }
}

/// Fixed rate, for offline deployments and tests.
#[derive(Debug, Clone, Copy)]
pub struct StaticExchangeRateSource {
    rate: f64,
}

impl StaticExchangeRateSource {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }
}

#[async_trait]
impl ExchangeRateSource for StaticExchangeRateSource {
    async fn fetch(&self) -> Result<f64, ExchangeRateError> {
        Ok(self.rate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteOrigin {
    Live,
    Cached,
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeQuote {
    pub rate: f64,
    pub origin: QuoteOrigin,
    pub fetched_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy)]
struct CachedQuote {
    rate: f64,
    fetched_at: DateTime<Utc>,
}

/// Timeout-bounded, caching front for an [`ExchangeRateSource`].
pub struct ExchangeRateProvider {
    source: Arc<dyn ExchangeRateSource>,
    timeout: Duration,
    fallback_rate: f64,
    last_known: RwLock<Option<CachedQuote>>,
}

impl ExchangeRateProvider {
    pub fn new(source: Arc<dyn ExchangeRateSource>, timeout: Duration, fallback_rate: f64) -> Self {
        Self {
            source,
            timeout,
            fallback_rate,
            last_known: RwLock::new(None),
        }
    }

    /// Live source per config; a disabled adapter or an HTTP client that cannot be built
    /// serves the fallback rate instead.
    pub fn from_config(config: &ExchangeConfig) -> Self {
        let fallback = || -> Arc<dyn ExchangeRateSource> {
            Arc::new(StaticExchangeRateSource::new(config.fallback_rate))
        };
        let source: Arc<dyn ExchangeRateSource> = if config.disabled {
            fallback()
        } else {
            match LiveExchangeRateSource::new(config.url.clone(), config.timeout) {
                Ok(live) => Arc::new(live),
                Err(err) => {
                    warn!(
                        error = %err,
                        fallback_rate = config.fallback_rate,
                        "exchange rate client could not be built; serving fallback rate"
                    );
                    fallback()
                }
            }
        };
        Self::new(source, config.timeout, config.fallback_rate)
    }

    /// Current quote, falling back to the cached or default rate on any upstream failure.
    pub async fn current_rate(&self) -> ExchangeQuote {
        match self.fetch_bounded().await {
            Ok(rate) => {
                let fetched_at = Utc::now();
                *self.last_known.write().await = Some(CachedQuote { rate, fetched_at });
                debug!(rate, "exchange rate refreshed");
                ExchangeQuote {
                    rate,
                    origin: QuoteOrigin::Live,
                    fetched_at: Some(fetched_at),
                }
            }
            Err(err) => {
                let cached = *self.last_known.read().await;
                match cached {
                    Some(CachedQuote { rate, fetched_at }) => {
                        warn!(error = %err, rate, "serving cached exchange rate");
                        ExchangeQuote {
                            rate,
                            origin: QuoteOrigin::Cached,
                            fetched_at: Some(fetched_at),
                        }
                    }
                    None => {
                        warn!(error = %err, rate = self.fallback_rate, "serving default exchange rate");
                        ExchangeQuote {
                            rate: self.fallback_rate,
                            origin: QuoteOrigin::Default,
                            fetched_at: None,
                        }
                    }
                }
            }
        }
    }

    async fn fetch_bounded(&self) -> Result<f64, ExchangeRateError> {
        let rate = tokio::time::timeout(self.timeout, self.source.fetch())
            .await
            .map_err(|_| ExchangeRateError::Timeout(self.timeout))??;
        if rate.is_finite() && rate > 0.0 {
            Ok(rate)
        } else {
            Err(ExchangeRateError::InvalidQuote(rate))
        }
    }
}

/// Mortgage aggregates restated in pesos for bilingual display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyDisplay {
    pub currency: String,
    pub exchange_rate: f64,
    pub origin: QuoteOrigin,
    pub fetched_at: Option<DateTime<Utc>>,
    pub monthly_payment: f64,
    pub total_payment: f64,
    pub total_interest: f64,
}

impl CurrencyDisplay {
    pub fn for_mortgage(result: &MortgageResult, quote: &ExchangeQuote) -> Self {
        Self {
            currency: "ARS".to_string(),
            exchange_rate: quote.rate,
            origin: quote.origin,
            fetched_at: quote.fetched_at,
            monthly_payment: result.monthly_payment * quote.rate,
            total_payment: result.total_payment * quote.rate,
            total_interest: result.total_interest * quote.rate,
        }
    }
}

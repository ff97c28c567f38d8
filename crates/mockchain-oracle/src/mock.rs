//! Fixed-rate quote source for tests and local development.
//! **Never use in production.**

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use mockchain_types::OracleFailure;
use rust_decimal::Decimal;
use serde_json::json;

use crate::source::{Quote, QuoteSource};

/// Quotes `fiat * rate` crypto units. The rate, an injected failure and a
/// delay can be changed between calls.
#[derive(Debug)]
pub struct StaticQuoteSource {
    rate: Mutex<Decimal>,
    failure: Mutex<Option<OracleFailure>>,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl StaticQuoteSource {
    /// `rate` is crypto units per whole fiat unit.
    pub fn new(rate: Decimal) -> Self {
        Self {
            rate: Mutex::new(rate),
            failure: Mutex::new(None),
            delay: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_rate(&self, rate: Decimal) {
        *self.rate.lock().unwrap_or_else(PoisonError::into_inner) = rate;
    }

    /// Make every following call fail with `failure` (`None` to recover).
    pub fn fail_with(&self, failure: Option<OracleFailure>) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = failure;
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap_or_else(PoisonError::into_inner) = delay;
    }

    /// How many quotes were requested so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteSource for StaticQuoteSource {
    async fn quote_fiat(&self, fiat: Decimal) -> Result<Quote, OracleFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(failure) = failure {
            return Err(failure);
        }

        let rate = *self.rate.lock().unwrap_or_else(PoisonError::into_inner);
        let crypto = (fiat * rate).round_dp(18);
        Ok(Quote {
            crypto,
            fiat,
            raw: json!({ "source": "static", "rate": rate.to_string() }),
        })
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn applies_current_rate() {
        let source = StaticQuoteSource::new(Decimal::new(25, 5)); // 0.00025 per USD
        let quote = source.quote_fiat(Decimal::new(100, 0)).await.unwrap();
        assert_eq!(quote.crypto, Decimal::new(25, 3));

        source.set_rate(Decimal::new(5, 4));
        let quote = source.quote_fiat(Decimal::new(100, 0)).await.unwrap();
        assert_eq!(quote.crypto, Decimal::new(5, 2));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn injected_failure() {
        let source = StaticQuoteSource::new(Decimal::ONE);
        source.fail_with(Some(OracleFailure::Status(500)));
        assert_eq!(
            source.quote_fiat(Decimal::ONE).await.unwrap_err(),
            OracleFailure::Status(500)
        );
        source.fail_with(None);
        assert!(source.quote_fiat(Decimal::ONE).await.is_ok());
    }
}

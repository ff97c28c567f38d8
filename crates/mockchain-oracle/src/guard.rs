//! Price oracle guard.
//!
//! Quotes are taken twice for a fiat-denominated transfer: once when the
//! approval is minted and again right before settlement. The second quote
//! must stay within `tolerance` of the first.

use std::sync::Arc;
use std::time::Duration;

use mockchain_types::{OracleConfig, OracleFailure, Result, WalletError};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::source::{Quote, QuoteSource};

/// `|current - original| / original <= tolerance`.
///
/// A non-positive `original` never passes.
pub fn check_tolerance(original: Decimal, current: Decimal, tolerance: Decimal) -> bool {
    if original <= Decimal::ZERO {
        return false;
    }
    match (current - original).abs().checked_div(original) {
        Some(drift) => drift <= tolerance,
        None => false,
    }
}

/// Bounds a [`QuoteSource`] with a timeout and applies the tolerance check.
pub struct PriceOracleGuard {
    source: Arc<dyn QuoteSource>,
    timeout: Duration,
    tolerance: Decimal,
}

impl PriceOracleGuard {
    pub fn new(source: Arc<dyn QuoteSource>, timeout: Duration, tolerance: Decimal) -> Self {
        Self {
            source,
            timeout,
            tolerance,
        }
    }

    pub fn from_config(source: Arc<dyn QuoteSource>, config: &OracleConfig) -> Self {
        Self::new(
            source,
            Duration::from_secs(config.timeout_secs),
            config.price_tolerance,
        )
    }

    /// Quote `fiat` with one call to the source.
    pub async fn quote(&self, fiat: Decimal) -> Result<Quote> {
        if fiat <= Decimal::ZERO {
            return Err(WalletError::InvalidAmount(fiat));
        }

        let outcome = tokio::time::timeout(self.timeout, self.source.quote_fiat(fiat))
            .await
            .unwrap_or(Err(OracleFailure::Timeout));

        match outcome {
            Ok(quote) if quote.crypto > Decimal::ZERO => {
                info!(
                    source = self.source.name(),
                    fiat = %fiat,
                    crypto = %quote.crypto,
                    "Quote fetched"
                );
                Ok(quote)
            }
            Ok(quote) => {
                warn!(source = self.source.name(), fiat = %fiat, crypto = %quote.crypto, "Quote is not positive");
                Err(WalletError::Oracle(OracleFailure::Malformed(format!(
                    "non-positive quote {}",
                    quote.crypto
                ))))
            }
            Err(failure) => {
                warn!(source = self.source.name(), fiat = %fiat, error = %failure, "Quote failed");
                Err(WalletError::Oracle(failure))
            }
        }
    }

    /// `PriceToleranceExceeded` when `current` drifted too far from `original`.
    pub fn ensure_within_tolerance(&self, original: Decimal, current: Decimal) -> Result<()> {
        if check_tolerance(original, current, self.tolerance) {
            return Ok(());
        }
        warn!(
            original = %original,
            current = %current,
            tolerance = %self.tolerance,
            "Price tolerance exceeded"
        );
        Err(WalletError::PriceToleranceExceeded {
            original,
            current,
            tolerance: self.tolerance,
        })
    }
}

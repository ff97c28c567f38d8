//! The quote source seam.

use async_trait::async_trait;
use mockchain_types::OracleFailure;
use rust_decimal::Decimal;
use serde::Serialize;

/// One fiat to crypto conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    /// Crypto units the fiat amount buys.
    pub crypto: Decimal,
    /// The fiat amount that was quoted.
    pub fiat: Decimal,
    /// Source payload, kept for audit.
    pub raw: serde_json::Value,
}

/// Anything that can price a fiat amount in crypto.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Quote `fiat` (in whole currency units). Exactly one external lookup.
    async fn quote_fiat(&self, fiat: Decimal) -> Result<Quote, OracleFailure>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

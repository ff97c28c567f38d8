//! # mockchain-oracle
//!
//! Prices fiat-denominated transfers in crypto.
//!
//! A [`QuoteSource`] performs one external lookup. The [`PriceOracleGuard`]
//! wraps any source with the configured timeout and owns the tolerance check
//! that settlement re-runs against a fresh quote. There is never a fallback
//! rate: a failed lookup is an error.

pub mod guard;
pub mod http;
#[cfg(any(test, feature = "test-helpers"))]
pub mod mock;
pub mod source;

pub use guard::{PriceOracleGuard, check_tolerance};
pub use http::HttpQuoteSource;
#[cfg(any(test, feature = "test-helpers"))]
pub use mock::StaticQuoteSource;
pub use source::{Quote, QuoteSource};

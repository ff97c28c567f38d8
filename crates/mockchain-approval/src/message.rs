//! The canonical approval message.
//!
//! ```text
//! Transfer 1.500000 ETH to 0xTo… from 0xFrom…|nonce:0123456789abcdef|expires:300
//! Transfer 0.025000 ETH ($100.00 USD) to 0xTo… from 0xFrom…|nonce:…|expires:…
//! ```
//!
//! Crypto amounts carry six decimal places and fiat amounts two, rounded
//! half away from zero. Addresses are rendered in EIP-55 form.

use std::str::FromStr;

use mockchain_types::{Address, Amount, Nonce, Result, WalletError};
use rust_decimal::Decimal;

const PREFIX: &str = "Transfer ";
const NONCE_FIELD: &str = "|nonce:";
const EXPIRES_FIELD: &str = "|expires:";

/// The fields carried by an approval message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalMessage {
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
    pub nonce: Nonce,
    pub expires_at: i64,
}

impl ApprovalMessage {
    /// Render back into canonical text.
    #[must_use]
    pub fn render(&self) -> String {
        build_approval_message(&self.from, &self.to, &self.amount, &self.nonce, self.expires_at)
    }
}

pub fn build_approval_message(
    from: &Address,
    to: &Address,
    amount: &Amount,
    nonce: &Nonce,
    expires_at: i64,
) -> String {
    format!(
        "{PREFIX}{} to {to} from {from}{NONCE_FIELD}{nonce}{EXPIRES_FIELD}{expires_at}",
        amount.describe()
    )
}

/// Parse text produced by [`build_approval_message`].
pub fn parse_approval_message(text: &str) -> Result<ApprovalMessage> {
    let body = text
        .strip_prefix(PREFIX)
        .ok_or_else(|| malformed("missing 'Transfer' prefix"))?;

    let (body, expires) = body
        .rsplit_once(EXPIRES_FIELD)
        .ok_or_else(|| malformed("missing expires field"))?;
    let expires_at = expires
        .parse::<i64>()
        .map_err(|_| malformed("expires is not an integer"))?;

    let (body, nonce) = body
        .rsplit_once(NONCE_FIELD)
        .ok_or_else(|| malformed("missing nonce field"))?;
    if nonce.is_empty() || nonce.contains('|') {
        return Err(malformed("empty nonce"));
    }

    let (crypto_text, rest) = body
        .split_once(" ETH")
        .ok_or_else(|| malformed("missing ETH amount"))?;
    let crypto = parse_decimal(crypto_text, "crypto amount")?;

    let (amount, parties) = if let Some(rest) = rest.strip_prefix(" ($") {
        let (fiat_text, parties) = rest
            .split_once(" USD)")
            .ok_or_else(|| malformed("unterminated fiat amount"))?;
        let fiat = parse_decimal(fiat_text, "fiat amount")?;
        (Amount::CryptoWithFiatQuote { crypto, fiat }, parties)
    } else {
        (Amount::Crypto(crypto), rest)
    };

    let parties = parties
        .strip_prefix(" to ")
        .ok_or_else(|| malformed("missing recipient"))?;
    let (to, from) = parties
        .split_once(" from ")
        .ok_or_else(|| malformed("missing sender"))?;

    Ok(ApprovalMessage {
        from: Address::parse(from).map_err(|_| malformed("invalid sender address"))?,
        to: Address::parse(to).map_err(|_| malformed("invalid recipient address"))?,
        amount,
        nonce: Nonce::new(nonce),
        expires_at,
    })
}

fn parse_decimal(text: &str, what: &str) -> Result<Decimal> {
    Decimal::from_str(text).map_err(|_| malformed(&format!("{what} is not a decimal")))
}

fn malformed(reason: &str) -> WalletError {
    WalletError::MalformedApprovalMessage {
        reason: reason.to_string(),
    }
}

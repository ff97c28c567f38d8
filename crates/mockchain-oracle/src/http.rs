//! Skip Go `msgs_direct` quote source.
//!
//! The fiat amount is sent in USDC minor units (6 decimals) and the answer's
//! `route.amount_out` is read as wei (18 decimals).

use std::time::Duration;

use async_trait::async_trait;
use mockchain_types::{
    OracleConfig, OracleFailure, Result, WalletError,
    constants::{CRYPTO_MINOR_UNIT_DECIMALS, FIAT_MINOR_UNIT_DECIMALS},
};
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Value, json};
use tracing::debug;

use crate::source::{Quote, QuoteSource};

/// Quotes through the Skip Go HTTP API.
pub struct HttpQuoteSource {
    client: Client,
    config: OracleConfig,
}

impl HttpQuoteSource {
    pub fn new(config: OracleConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WalletError::Configuration(format!("HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// JSON body for quoting `fiat`.
    pub fn request_body(&self, fiat: Decimal) -> std::result::Result<Value, OracleFailure> {
        let amount_in = fiat_to_minor_units(fiat)?;
        let mut recipients = serde_json::Map::new();
        recipients.insert(
            self.config.source_asset_chain_id.clone(),
            Value::String(self.config.recipient_placeholder.clone()),
        );
        if self.config.dest_asset_chain_id != self.config.source_asset_chain_id {
            recipients.insert(
                self.config.dest_asset_chain_id.clone(),
                Value::String(self.config.recipient_placeholder.clone()),
            );
        }

        Ok(json!({
            "source_asset_denom": self.config.source_asset_denom,
            "source_asset_chain_id": self.config.source_asset_chain_id,
            "dest_asset_denom": self.config.dest_asset_denom,
            "dest_asset_chain_id": self.config.dest_asset_chain_id,
            "amount_in": amount_in.to_string(),
            "chain_ids_to_addresses": recipients,
            "slippage_tolerance_percent": self.config.slippage_tolerance_percent,
            "smart_swap_options": { "evm_swaps": true },
            "allow_unsafe": false,
        }))
    }
}

#[async_trait]
impl QuoteSource for HttpQuoteSource {
    async fn quote_fiat(&self, fiat: Decimal) -> std::result::Result<Quote, OracleFailure> {
        let body = self.request_body(fiat)?;
        debug!(endpoint = %self.config.endpoint, fiat = %fiat, "Requesting quote");

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleFailure::Timeout
                } else {
                    OracleFailure::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleFailure::Status(status.as_u16()));
        }

        let raw: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                OracleFailure::Timeout
            } else {
                OracleFailure::Malformed(e.to_string())
            }
        })?;
        let crypto = parse_amount_out(&raw)?;
        Ok(Quote { crypto, fiat, raw })
    }

    fn name(&self) -> &'static str {
        "skip"
    }
}

/// Whole fiat units to integer minor units, truncating sub-minor digits.
pub fn fiat_to_minor_units(fiat: Decimal) -> std::result::Result<u128, OracleFailure> {
    if fiat <= Decimal::ZERO {
        return Err(OracleFailure::Malformed(format!(
            "fiat amount must be positive, got {fiat}"
        )));
    }
    fiat.checked_mul(Decimal::from(10u64.pow(FIAT_MINOR_UNIT_DECIMALS)))
        .and_then(|minor| minor.trunc().to_u128())
        .ok_or_else(|| OracleFailure::Malformed(format!("fiat amount {fiat} out of range")))
}

/// Extract `route.amount_out` (wei, as string or integer) in whole crypto units.
pub fn parse_amount_out(payload: &Value) -> std::result::Result<Decimal, OracleFailure> {
    let amount_out = payload
        .get("route")
        .and_then(|route| route.get("amount_out"))
        .ok_or_else(|| OracleFailure::Malformed("missing route.amount_out".into()))?;

    let wei: i128 = match amount_out {
        Value::String(text) => text
            .trim()
            .parse()
            .map_err(|_| OracleFailure::Malformed(format!("amount_out {text:?} is not an integer")))?,
        Value::Number(number) => number
            .as_u64()
            .map(i128::from)
            .ok_or_else(|| OracleFailure::Malformed(format!("amount_out {number} is not an integer")))?,
        other => {
            return Err(OracleFailure::Malformed(format!(
                "amount_out has unexpected type: {other}"
            )));
        }
    };
    if wei < 0 {
        return Err(OracleFailure::Malformed(format!("amount_out {wei} is negative")));
    }

    Decimal::try_from_i128_with_scale(wei, CRYPTO_MINOR_UNIT_DECIMALS)
        .map(|d| d.normalize())
        .map_err(|_| OracleFailure::Malformed(format!("amount_out {wei} out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn source_for(endpoint: String) -> HttpQuoteSource {
        HttpQuoteSource::new(OracleConfig {
            endpoint,
            timeout_secs: 5,
            ..OracleConfig::default()
        })
        .unwrap()
    }

    /// Serve exactly one canned HTTP response and hand back the request body.
    async fn serve_once(status: &'static str, body: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/v2/fungible/msgs_direct", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&received);
                if let Some(split) = text.find("\r\n\r\n") {
                    let length = text[..split]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if received.len() >= split + 4 + length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            let text = String::from_utf8_lossy(&received).into_owned();
            text.split_once("\r\n\r\n").map(|(_, b)| b.to_string()).unwrap_or_default()
        });
        (endpoint, handle)
    }

    #[test]
    fn fiat_minor_units_truncate() {
        assert_eq!(fiat_to_minor_units(Decimal::new(100, 0)).unwrap(), 100_000_000);
        assert_eq!(fiat_to_minor_units(Decimal::new(12_345_679, 7)).unwrap(), 1_234_567);
        assert!(fiat_to_minor_units(Decimal::ZERO).is_err());
        assert!(fiat_to_minor_units(Decimal::new(-5, 0)).is_err());
    }

    #[test]
    fn amount_out_in_wei() {
        let payload = json!({ "route": { "amount_out": "25000000000000000" } });
        assert_eq!(parse_amount_out(&payload).unwrap(), Decimal::new(25, 3));

        let numeric = json!({ "route": { "amount_out": 1_000_000_000_000_000_000u64 } });
        assert_eq!(parse_amount_out(&numeric).unwrap(), Decimal::ONE);
    }

    #[test]
    fn unusable_payloads_are_malformed() {
        for payload in [
            json!({}),
            json!({ "route": {} }),
            json!({ "route": { "amount_out": "abc" } }),
            json!({ "route": { "amount_out": "-1" } }),
            json!({ "route": { "amount_out": 1.5 } }),
            json!({ "route": { "amount_out": null } }),
            json!({ "route": { "amount_out": "1000000000000000000000000000000000000" } }),
        ] {
            assert!(
                matches!(parse_amount_out(&payload), Err(OracleFailure::Malformed(_))),
                "{payload}"
            );
        }
    }

    #[test]
    fn request_body_shape() {
        let source = source_for("http://unused".into());
        let body = source.request_body(Decimal::new(100, 0)).unwrap();
        assert_eq!(body["amount_in"], "100000000");
        assert_eq!(body["source_asset_denom"], "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
        assert_eq!(body["dest_asset_denom"], "ethereum-native");
        assert_eq!(body["source_asset_chain_id"], "1");
        assert_eq!(body["dest_asset_chain_id"], "1");
        assert_eq!(
            body["chain_ids_to_addresses"]["1"],
            "0x742d35Cc6634C0532925a3b8D4C9db96c728b0B4"
        );
        assert_eq!(body["slippage_tolerance_percent"], "1");
        assert_eq!(body["smart_swap_options"]["evm_swaps"], true);
        assert_eq!(body["allow_unsafe"], false);
    }

    #[tokio::test]
    async fn quotes_over_http() {
        let (endpoint, server) = serve_once(
            "200 OK",
            r#"{"route":{"amount_out":"25000000000000000"},"msgs":[]}"#.to_string(),
        )
        .await;
        let quote = source_for(endpoint).quote_fiat(Decimal::new(100, 0)).await.unwrap();
        assert_eq!(quote.crypto, Decimal::new(25, 3));
        assert_eq!(quote.fiat, Decimal::new(100, 0));
        assert!(quote.raw.get("msgs").is_some());

        let sent: Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(sent["amount_in"], "100000000");
    }

    #[tokio::test]
    async fn non_success_status_reported() {
        let (endpoint, _server) = serve_once("503 Service Unavailable", "{}".to_string()).await;
        let err = source_for(endpoint).quote_fiat(Decimal::new(100, 0)).await.unwrap_err();
        assert_eq!(err, OracleFailure::Status(503));
    }

    #[tokio::test]
    async fn unparseable_body_is_malformed() {
        let (endpoint, _server) = serve_once("200 OK", "not json".to_string()).await;
        let err = source_for(endpoint).quote_fiat(Decimal::new(100, 0)).await.unwrap_err();
        assert!(matches!(err, OracleFailure::Malformed(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);
        let err = source_for(endpoint).quote_fiat(Decimal::new(100, 0)).await.unwrap_err();
        assert!(matches!(err, OracleFailure::Network(_)));
    }
}

//! Settlement notifications.
//!
//! A notifier only ever hears about transfers that already committed. Its
//! failures are logged and never undo a settlement.

use mockchain_types::{
    Address, Amount, EntryId, Result, constants::WALLET_NAME, format_crypto,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

/// Everything a participant is told about a settled transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferNotice {
    pub entry: EntryId,
    pub from: Address,
    pub to: Address,
    pub sender_email: Option<String>,
    pub recipient_email: Option<String>,
    pub amount: Amount,
    pub sender_balance: Decimal,
    pub recipient_balance: Decimal,
}

impl TransferNotice {
    /// Text for the sender.
    #[must_use]
    pub fn sender_message(&self) -> String {
        format!(
            "{WALLET_NAME}: sent {} to {}. Your new balance: {} ETH",
            self.amount.describe(),
            self.to,
            format_crypto(self.sender_balance)
        )
    }

    /// Text for the recipient.
    #[must_use]
    pub fn recipient_message(&self) -> String {
        format!(
            "{WALLET_NAME}: received {} from {}. Your new balance: {} ETH",
            self.amount.describe(),
            self.from,
            format_crypto(self.recipient_balance)
        )
    }
}

/// Consumer of settlement results.
pub trait Notifier: Send + Sync {
    fn transfer_settled(&self, notice: &TransferNotice) -> Result<()>;
}

/// Writes each notice as a structured log event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn transfer_settled(&self, notice: &TransferNotice) -> Result<()> {
        if let Some(email) = &notice.sender_email {
            info!(entry = %notice.entry, to = %email, body = %notice.sender_message(), "Notification");
        }
        if let Some(email) = &notice.recipient_email {
            info!(entry = %notice.entry, to = %email, body = %notice.recipient_message(), "Notification");
        }
        Ok(())
    }
}

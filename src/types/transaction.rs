//! Transaction records submitted for classification

use serde::{Deserialize, Serialize};

/// A raw transaction as received from the ledger.
///
/// Payloads are schema-validated upstream; only `description` and `amount`
/// are required. A negative amount is a refund and classifies like the
/// purchase of the same magnitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Free-text description from the statement line
    #[serde(default)]
    pub description: String,

    /// Merchant name, when the ledger knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,

    /// Signed amount (negative for refunds)
    pub amount: f64,
}

impl TransactionRecord {
    /// Create a record without a merchant
    pub fn new(description: impl Into<String>, amount: f64) -> Self {
        Self {
            description: description.into(),
            merchant: None,
            amount,
        }
    }

    /// Attach a merchant name
    pub fn with_merchant(mut self, merchant: impl Into<String>) -> Self {
        self.merchant = Some(merchant.into());
        self
    }

    /// Merchant name or the empty string
    pub fn merchant_or_empty(&self) -> &str {
        self.merchant.as_deref().unwrap_or("")
    }
}

//! Refunds
//!
//! Wire models for the backend's refund endpoints and the reason codes the desk offers.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use jiff::civil::DateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    ids::TypedId,
    money::major,
    orders::{CashierId, CustomerSummary, OrderId, PaymentMethod},
};

/// Refund Id
pub type RefundId = TypedId<Refund>;

/// A blank return reason.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Please select a return reason")]
pub struct BlankReason;

/// Why goods are coming back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ReturnReason {
    /// Damaged product
    Damaged,

    /// Defective product
    Defective,

    /// Wrong size
    WrongSize,

    /// Wrong item delivered
    WrongItem,

    /// Color does not match
    ColorMismatch,

    /// Quality not as expected
    Quality,

    /// Customer changed their mind
    ChangedMind,

    /// Free text
    Other(String),
}

impl ReturnReason {
    /// Preset reasons offered at the desk.
    pub const PRESETS: [Self; 7] = [
        Self::Damaged,
        Self::Defective,
        Self::WrongSize,
        Self::WrongItem,
        Self::ColorMismatch,
        Self::Quality,
        Self::ChangedMind,
    ];

    /// Wire code; free text is sent as written.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Damaged => "damaged",
            Self::Defective => "defective",
            Self::WrongSize => "wrong-size",
            Self::WrongItem => "wrong-item",
            Self::ColorMismatch => "color-mismatch",
            Self::Quality => "quality",
            Self::ChangedMind => "changed-mind",
            Self::Other(text) => text,
        }
    }

    /// Label shown to the cashier.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Damaged => "Damaged product",
            Self::Defective => "Defective product",
            Self::WrongSize => "Wrong size",
            Self::WrongItem => "Wrong item",
            Self::ColorMismatch => "Color mismatch",
            Self::Quality => "Quality not as expected",
            Self::ChangedMind => "Changed mind",
            Self::Other(text) => text,
        }
    }
}

impl TryFrom<String> for ReturnReason {
    type Error = BlankReason;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let text = value.trim();

        if text.is_empty() {
            return Err(BlankReason);
        }

        Ok(Self::PRESETS
            .into_iter()
            .find(|preset| preset.code().eq_ignore_ascii_case(text))
            .unwrap_or_else(|| Self::Other(text.to_string())))
    }
}

impl FromStr for ReturnReason {
    type Err = BlankReason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl From<ReturnReason> for String {
    fn from(reason: ReturnReason) -> Self {
        match reason {
            ReturnReason::Other(text) => text,
            preset => preset.code().to_string(),
        }
    }
}

impl Display for ReturnReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.code())
    }
}

/// Refund creation payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    /// Order being refunded
    pub order_id: OrderId,

    /// Why the goods came back
    pub reason: ReturnReason,

    /// Amount to refund in minor units
    #[serde(with = "major")]
    pub amount: i64,

    /// How the refund is paid out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_type: Option<PaymentMethod>,
}

/// Order details nested in refund listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundOrder {
    /// Order id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<OrderId>,

    /// Order number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,

    /// Customer on the order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerSummary>,
}

/// Cashier details nested in refund listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundCashier {
    /// Cashier id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CashierId>,

    /// Cashier name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// A refund recorded by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Refund {
    /// Refund id
    pub id: RefundId,

    /// Refunded order id, on flat listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,

    /// Refunded order, on nested listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<RefundOrder>,

    /// Reason as recorded
    #[serde(default)]
    pub reason: String,

    /// Amount refunded in minor units
    #[serde(with = "major")]
    pub amount: i64,

    /// Cashier who processed the refund
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cashier: Option<RefundCashier>,

    /// Payout method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_type: Option<PaymentMethod>,

    /// When the refund was recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

impl Refund {
    /// Refunded order id from whichever shape the backend used.
    #[must_use]
    pub fn refunded_order(&self) -> Option<&OrderId> {
        self.order_id
            .as_ref()
            .or_else(|| self.order.as_ref().and_then(|order| order.id.as_ref()))
    }

    /// Order number when the listing nests the order.
    #[must_use]
    pub fn order_number(&self) -> Option<&str> {
        self.order
            .as_ref()
            .and_then(|order| order.order_number.as_deref())
    }

    /// Customer name when the listing nests the order.
    #[must_use]
    pub fn customer_name(&self) -> Option<&str> {
        self.order
            .as_ref()
            .and_then(|order| order.customer.as_ref())
            .and_then(|customer| customer.full_name.as_deref())
    }
}

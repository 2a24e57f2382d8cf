//! Orders
//!
//! Wire models for the backend's order endpoints. Orders are authoritative on the backend; the
//! terminal only builds [`OrderRequest`]s and renders what comes back.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use jiff::civil::DateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    customers::{Customer, CustomerId},
    ids::TypedId,
    money::{self, major, major_opt},
    products::ProductId,
};

/// Store marker.
#[derive(Debug)]
pub enum Store {}

/// Branch marker.
#[derive(Debug)]
pub enum Branch {}

/// Cashier marker.
#[derive(Debug)]
pub enum Cashier {}

/// Store Id
pub type StoreId = TypedId<Store>;

/// Branch Id
pub type BranchId = TypedId<Branch>;

/// Cashier Id
pub type CashierId = TypedId<Cashier>;

/// Order Id
pub type OrderId = TypedId<Order>;

/// Order Line Id
pub type OrderLineId = TypedId<OrderLine>;

/// How a sale (or refund) is settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Cash
    #[default]
    Cash,

    /// Card
    Card,

    /// UPI transfer
    Upi,
}

/// Unknown payment method name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown payment method `{0}` (expected cash, card or upi)")]
pub struct UnknownPaymentMethod(pub String);

impl FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CASH" => Ok(Self::Cash),
            "CARD" => Ok(Self::Card),
            "UPI" => Ok(Self::Upi),
            _ => Err(UnknownPaymentMethod(s.to_string())),
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::Cash => "CASH",
            Self::Card => "CARD",
            Self::Upi => "UPI",
        })
    }
}

/// Where a sale is being rung up.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderContext {
    /// Store the order belongs to
    pub store_id: StoreId,

    /// Branch, if the cashier is attached to one
    pub branch_id: Option<BranchId>,
}

/// Customer details embedded in orders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    /// Customer id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CustomerId>,

    /// Full name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    /// Email address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Phone number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Postal address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl From<&Customer> for CustomerSummary {
    fn from(customer: &Customer) -> Self {
        Self {
            id: Some(customer.id.clone()),
            full_name: Some(customer.full_name.clone()),
            email: Some(customer.email.clone()),
            phone: Some(customer.phone.clone()),
            address: customer.address.clone(),
        }
    }
}

/// One line of an order creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    /// Product being sold
    pub product_id: ProductId,

    /// Quantity sold
    pub quantity: u32,
}

/// Order creation payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    /// Store the order belongs to
    pub store_id: StoreId,

    /// Branch the order was rung up at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<BranchId>,

    /// Selected customer id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,

    /// Selected customer details, when known locally
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerSummary>,

    /// Items sold
    pub items: Vec<OrderItemRequest>,

    /// Pre-adjustment subtotal, sent when a discount or tax applies
    #[serde(default, with = "major_opt", skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<i64>,

    /// Tax charged
    #[serde(default, with = "major_opt", skip_serializing_if = "Option::is_none")]
    pub tax: Option<i64>,

    /// Discount given
    #[serde(default, with = "major_opt", skip_serializing_if = "Option::is_none")]
    pub discount: Option<i64>,

    /// Amount to charge
    #[serde(default, with = "major_opt", skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,

    /// Payment method
    pub payment_type: PaymentMethod,
}

/// Product details some endpoints nest inside order lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineProduct {
    /// Product name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A line on a placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    /// Line id, when the backend exposes one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<OrderLineId>,

    /// Product sold
    pub product_id: ProductId,

    /// Product name captured at sale time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,

    /// Nested product details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<LineProduct>,

    /// Quantity sold
    pub quantity: u32,

    /// Unit price in minor units
    #[serde(with = "major")]
    pub price: i64,

    /// Line subtotal in minor units
    #[serde(default, with = "major_opt", skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<i64>,
}

impl OrderLine {
    /// Name to show for the line.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.product_name
            .as_deref()
            .or_else(|| self.product.as_ref().and_then(|p| p.name.as_deref()))
            .unwrap_or("Item")
    }

    /// `price × quantity` in minor units.
    #[must_use]
    pub fn extended_price(&self) -> i64 {
        money::extend(self.price, self.quantity)
    }
}

/// Order lifecycle status as reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Awaiting payment
    Pending,

    /// Paid and closed
    #[default]
    Completed,

    /// Fully or partially refunded
    Refunded,

    /// Voided
    Cancelled,

    /// A status this client does not know about
    #[serde(other)]
    Unknown,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Order id
    pub id: OrderId,

    /// Human-facing order number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,

    /// Customer details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerSummary>,

    /// Lines sold; creation responses may omit them
    #[serde(default)]
    pub items: Vec<OrderLine>,

    /// Subtotal in minor units
    #[serde(default, with = "major")]
    pub subtotal: i64,

    /// Tax in minor units
    #[serde(default, with = "major_opt", skip_serializing_if = "Option::is_none")]
    pub tax: Option<i64>,

    /// Discount in minor units
    #[serde(default, with = "major_opt", skip_serializing_if = "Option::is_none")]
    pub discount: Option<i64>,

    /// Amount charged in minor units
    #[serde(with = "major")]
    pub total_amount: i64,

    /// Payment method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_type: Option<PaymentMethod>,

    /// Order status
    #[serde(default)]
    pub status: OrderStatus,

    /// When the order was placed (store local time)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

impl Order {
    /// Short label for messages: the order number, or the last eight characters of the id.
    #[must_use]
    pub fn label(&self) -> String {
        if let Some(number) = &self.order_number {
            return number.clone();
        }

        let id = self.id.as_str();
        let skip = id.chars().count().saturating_sub(8);

        id.chars().skip(skip).collect()
    }
}

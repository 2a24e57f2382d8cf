//! Receipt

use std::io;

use jiff::civil::DateTime;
use rusty_money::iso::Currency;
use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    cart::{Cart, CartError, CartLine, Totals},
    money,
    orders::{Order, OrderId, OrderLine, PaymentMethod},
    products::ProductId,
};

/// Errors that can occur writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// IO error
    #[error("IO error")]
    IO(#[from] io::Error),
}

/// One printed receipt line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptLine {
    /// Product sold
    pub product_id: ProductId,

    /// Name as shown to the customer
    pub name: String,

    /// Quantity sold
    pub quantity: u32,

    /// Unit price in minor units
    pub unit_price: i64,

    /// Line subtotal in minor units
    pub subtotal: i64,
}

impl From<&CartLine> for ReceiptLine {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id().clone(),
            name: line.product().name.clone(),
            quantity: line.quantity(),
            unit_price: line.unit_price(),
            subtotal: line.subtotal(),
        }
    }
}

impl From<&OrderLine> for ReceiptLine {
    fn from(line: &OrderLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            name: line.display_name().to_string(),
            quantity: line.quantity,
            unit_price: line.price,
            subtotal: line.subtotal.unwrap_or_else(|| line.extended_price()),
        }
    }
}

/// Receipt for a placed order.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    /// Server-assigned order id
    pub order_id: OrderId,

    /// Order number, or the tail of the id when the backend did not assign one
    pub label: String,

    /// Lines sold
    pub lines: SmallVec<[ReceiptLine; 8]>,

    /// Locally computed totals
    pub totals: Totals,

    /// Amount the backend charged, in minor units
    pub amount_charged: i64,

    /// Payment method
    pub payment_method: PaymentMethod,

    /// Customer name, for registered customers
    pub customer_name: Option<String>,

    /// Order note
    pub note: Option<String>,

    /// When the order was placed
    pub placed_at: Option<DateTime>,
}

impl Receipt {
    /// Builds the receipt for a sale just accepted by the backend.
    ///
    /// Order creation responses do not echo line details, so names and prices come from the cart
    /// while the id, number and charged total come from the server.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the cart's totals cannot be computed.
    pub fn for_sale(
        order: &Order,
        cart: &Cart,
        customer_name: Option<String>,
    ) -> Result<Self, CartError> {
        let totals = cart.totals()?;
        let note = Some(cart.note().trim())
            .filter(|note| !note.is_empty())
            .map(str::to_string);

        Ok(Self {
            order_id: order.id.clone(),
            label: order.label(),
            lines: cart.lines().iter().map(ReceiptLine::from).collect(),
            totals,
            amount_charged: order.total_amount,
            payment_method: order.payment_type.unwrap_or(cart.payment_method()),
            customer_name,
            note,
            placed_at: order.created_at,
        })
    }

    /// Builds a receipt for an order fetched from the backend.
    #[must_use]
    pub fn for_order(order: &Order) -> Self {
        let lines: SmallVec<[ReceiptLine; 8]> = order.items.iter().map(ReceiptLine::from).collect();

        let subtotal = if order.subtotal == 0 {
            lines
                .iter()
                .map(|line| line.subtotal)
                .fold(0_i64, i64::saturating_add)
        } else {
            order.subtotal
        };

        Self {
            order_id: order.id.clone(),
            label: order.label(),
            lines,
            totals: Totals {
                subtotal,
                tax: order.tax.unwrap_or_default(),
                discount: order.discount.unwrap_or_default(),
                total: order.total_amount,
            },
            amount_charged: order.total_amount,
            payment_method: order.payment_type.unwrap_or_default(),
            customer_name: order
                .customer
                .as_ref()
                .and_then(|customer| customer.full_name.clone()),
            note: None,
            placed_at: order.created_at,
        }
    }

    /// Renders the receipt as a table followed by the totals.
    ///
    /// # Errors
    ///
    /// Returns a [`ReceiptError`] if writing to `out` fails.
    pub fn write_to(
        &self,
        mut out: impl io::Write,
        currency: &'static Currency,
    ) -> Result<(), ReceiptError> {
        writeln!(out, "Order {}", self.label)?;

        if let Some(name) = &self.customer_name {
            writeln!(out, "Customer: {name}")?;
        }

        if let Some(placed_at) = &self.placed_at {
            writeln!(out, "Placed: {}", placed_at.strftime("%Y-%m-%d %H:%M"))?;
        }

        let mut builder = Builder::default();

        builder.push_record(["Item", "Qty", "Price", "Subtotal"]);

        for line in &self.lines {
            builder.push_record([
                line.name.clone(),
                line.quantity.to_string(),
                money::display(line.unit_price, currency).to_string(),
                money::display(line.subtotal, currency).to_string(),
            ]);
        }

        let mut table = builder.build();

        table.with(Style::modern_rounded());
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::new(1..), Alignment::right());

        writeln!(out, "{table}")?;

        let mut summary: SmallVec<[(&str, i64); 5]> = SmallVec::new();

        summary.push(("Subtotal", self.totals.subtotal));

        if self.totals.discount != 0 {
            summary.push(("Discount", -self.totals.discount));
        }

        if self.totals.tax != 0 {
            summary.push(("Tax", self.totals.tax));
        }

        summary.push(("Total", self.totals.total));

        if self.amount_charged != self.totals.total {
            summary.push(("Charged", self.amount_charged));
        }

        let rendered: SmallVec<[(&str, String); 5]> = summary
            .into_iter()
            .map(|(label, minor)| (label, money::display(minor, currency).to_string()))
            .collect();

        let value_width = rendered
            .iter()
            .map(|(_, value)| value.chars().count())
            .max()
            .unwrap_or_default();

        for (label, value) in &rendered {
            writeln!(out, " {label:<10}{value:>value_width$}")?;
        }

        writeln!(out, " Paid by {}", self.payment_method)?;

        if let Some(note) = &self.note {
            writeln!(out, " Note: {note}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso;
    use testresult::TestResult;

    use crate::{cart::Discount, products::Product};

    use super::*;

    fn placed_order() -> TestResult<Order> {
        Ok(serde_json::from_str(
            r#"{
                "id": 1042,
                "orderNumber": "ORD-1042",
                "customer": { "fullName": "Asha" },
                "items": [
                    { "productId": 7, "productName": "Linen Shirt", "quantity": 1, "price": 599 },
                    { "productId": 8, "productName": "Denim Jeans", "quantity": 2, "price": 399 }
                ],
                "totalAmount": 1397,
                "paymentType": "UPI"
            }"#,
        )?)
    }

    #[test]
    fn for_order_derives_subtotal_from_lines() -> TestResult {
        let receipt = Receipt::for_order(&placed_order()?);

        assert_eq!(receipt.label, "ORD-1042");
        assert_eq!(receipt.totals.subtotal, 139_700);
        assert_eq!(receipt.amount_charged, 139_700);
        assert_eq!(receipt.payment_method, PaymentMethod::Upi);
        assert_eq!(receipt.customer_name.as_deref(), Some("Asha"));

        Ok(())
    }

    #[test]
    fn for_sale_uses_local_lines_and_server_total() -> TestResult {
        let mut cart = Cart::new();

        cart.add_product(&Product::new("1", "Linen Shirt", 59_900));
        cart.set_note("  gift wrap ");

        let order: Order = serde_json::from_str(r#"{ "id": "abcdef0123456789", "totalAmount": 599 }"#)?;
        let receipt = Receipt::for_sale(&order, &cart, Some("Ravi".to_string()))?;

        assert_eq!(receipt.label, "23456789");
        assert_eq!(receipt.lines.len(), 1);
        assert_eq!(receipt.totals.total, 59_900);
        assert_eq!(receipt.note.as_deref(), Some("gift wrap"));
        assert_eq!(receipt.payment_method, PaymentMethod::Cash);

        Ok(())
    }

    #[test]
    fn write_to_renders_lines_and_totals() -> TestResult {
        let receipt = Receipt::for_order(&placed_order()?);

        let mut out = Vec::new();
        receipt.write_to(&mut out, iso::INR)?;

        let output = String::from_utf8(out)?;

        assert!(output.contains("Order ORD-1042"));
        assert!(output.contains("Customer: Asha"));
        assert!(output.contains("Linen Shirt"));
        assert!(output.contains("Denim Jeans"));
        assert!(output.contains("Total"));
        assert!(output.contains("Paid by UPI"));
        assert!(!output.contains("Discount"));
        assert!(!output.contains("Charged"));

        Ok(())
    }

    #[test]
    fn discounted_sale_totals_agree_with_amount_charged() -> TestResult {
        let mut cart = Cart::new();

        cart.add_product(&Product::new("1", "Linen Shirt", 59_900));
        cart.add_product(&Product::new("2", "Denim Jeans", 39_900));
        cart.set_discount(Discount::Amount(10_000));

        let order: Order = serde_json::from_str(r#"{ "id": 1043, "totalAmount": 898 }"#)?;
        let receipt = Receipt::for_sale(&order, &cart, None)?;

        assert_eq!(
            receipt.totals.subtotal + receipt.totals.tax - receipt.totals.discount,
            receipt.totals.total
        );
        assert_eq!(receipt.totals.total, receipt.amount_charged);

        let mut out = Vec::new();
        receipt.write_to(&mut out, iso::INR)?;

        let output = String::from_utf8(out)?;

        assert!(output.contains("Discount"));
        assert!(output.contains("₹898.00"));
        assert!(!output.contains("Charged"));

        Ok(())
    }

    #[test]
    fn charged_row_appears_when_backend_total_differs() -> TestResult {
        let mut cart = Cart::new();

        cart.add_product(&Product::new("1", "Linen Shirt", 59_900));
        cart.set_discount(Discount::Amount(9_900));

        let order: Order = serde_json::from_str(r#"{ "id": 1044, "totalAmount": 599 }"#)?;

        let mut out = Vec::new();
        Receipt::for_sale(&order, &cart, None)?.write_to(&mut out, iso::INR)?;

        let output = String::from_utf8(out)?;

        assert!(output.contains("₹500.00"));
        assert!(output.contains("Charged"));
        assert!(output.contains("₹599.00"));

        Ok(())
    }
}

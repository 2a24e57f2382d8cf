//! Cart
//!
//! The in-progress sale. Every mutation keeps the line invariants intact: product ids are unique,
//! quantities are at least one and subtotals are always derived from the current quantity.

use std::num::NonZeroU32;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    customers::{Customer, CustomerSelection},
    money::{self, AmountError},
    orders::{CustomerSummary, Order, OrderContext, OrderItemRequest, OrderRequest, PaymentMethod},
    products::{Product, ProductId},
    receipt::Receipt,
};

pub mod adjustments;
pub mod held;

pub use adjustments::{Adjustments, Discount, InvalidDiscount, TaxRate};
pub use held::{HeldOrder, HeldOrders};

/// Errors related to cart validation.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// Checkout or hold was attempted with no lines.
    #[error("Cart is empty; add at least one item")]
    Empty,

    /// A persisted cart listed the same product twice.
    #[error("Product {0} appears on more than one cart line")]
    DuplicateLine(ProductId),

    /// A held order cannot be restored over a cart that still has lines.
    #[error("Finish or clear the current cart before restoring a held order")]
    NotEmpty,

    /// No held order with the given id.
    #[error("Held order {0} not found")]
    HeldOrderNotFound(Uuid),

    /// Money arithmetic failed.
    #[error(transparent)]
    Amount(#[from] AmountError),
}

/// Product details captured on a cart line when it is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartProduct {
    /// Product id
    pub id: ProductId,

    /// Product name
    pub name: String,

    /// Unit price in minor units
    pub unit_price: i64,
}

impl From<&Product> for CartProduct {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.price,
        }
    }
}

/// One product and its quantity in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    product: CartProduct,
    quantity: NonZeroU32,
}

impl CartLine {
    /// Creates a line.
    #[must_use]
    pub fn new(product: CartProduct, quantity: NonZeroU32) -> Self {
        Self { product, quantity }
    }

    /// Product on this line.
    #[must_use]
    pub fn product(&self) -> &CartProduct {
        &self.product
    }

    /// Product id.
    #[must_use]
    pub fn product_id(&self) -> &ProductId {
        &self.product.id
    }

    /// Quantity; always at least one.
    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity.get()
    }

    /// Unit price in minor units.
    #[must_use]
    pub fn unit_price(&self) -> i64 {
        self.product.unit_price
    }

    /// `quantity × unit_price` in minor units.
    #[must_use]
    pub fn subtotal(&self) -> i64 {
        money::extend(self.product.unit_price, self.quantity.get())
    }
}

/// Cart totals in minor units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    /// Sum of line subtotals
    pub subtotal: i64,

    /// Tax on the discounted subtotal
    pub tax: i64,

    /// Discount taken off the subtotal
    pub discount: i64,

    /// `subtotal + tax - discount`
    pub total: i64,
}

/// Totals a set of lines.
///
/// # Errors
///
/// Returns an [`AmountError`] if a percentage calculation overflows.
pub fn compute_totals(lines: &[CartLine], adjustments: &Adjustments) -> Result<Totals, AmountError> {
    let subtotal = lines
        .iter()
        .map(CartLine::subtotal)
        .fold(0_i64, i64::saturating_add);

    let discount = adjustments.discount.amount_off(subtotal)?;
    let tax = adjustments.tax_rate.on(subtotal - discount)?;

    Ok(Totals {
        subtotal,
        tax,
        discount,
        total: subtotal.saturating_add(tax) - discount,
    })
}

/// The in-progress sale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "CartRepr")]
pub struct Cart {
    lines: Vec<CartLine>,
    customer: CustomerSelection,
    payment_method: PaymentMethod,
    note: String,
    discount: Discount,
    tax_rate: TaxRate,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartRepr {
    #[serde(default)]
    lines: Vec<CartLine>,

    #[serde(default)]
    customer: CustomerSelection,

    #[serde(default)]
    payment_method: PaymentMethod,

    #[serde(default)]
    note: String,

    #[serde(default)]
    discount: Discount,

    #[serde(default)]
    tax_rate: TaxRate,
}

impl TryFrom<CartRepr> for Cart {
    type Error = CartError;

    fn try_from(repr: CartRepr) -> Result<Self, Self::Error> {
        let mut seen = FxHashSet::default();

        for line in &repr.lines {
            if !seen.insert(line.product_id()) {
                return Err(CartError::DuplicateLine(line.product_id().clone()));
            }
        }

        Ok(Self {
            lines: repr.lines,
            customer: repr.customer,
            payment_method: repr.payment_method,
            note: repr.note,
            discount: repr.discount,
            tax_rate: repr.tax_rate,
        })
    }
}

impl Cart {
    /// Create an empty cart with no tax.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cart that charges the given tax rate.
    #[must_use]
    pub fn with_tax_rate(tax_rate: TaxRate) -> Self {
        Self {
            tax_rate,
            ..Self::default()
        }
    }

    /// Adds one unit of `product`, appending a line if it is not already in the cart.
    pub fn add_product(&mut self, product: &Product) {
        self.add(CartProduct::from(product), NonZeroU32::MIN);
    }

    /// Adds `quantity` units of a product.
    pub fn add(&mut self, product: CartProduct, quantity: NonZeroU32) {
        match self.position(&product.id) {
            Some(idx) => {
                if let Some(line) = self.lines.get_mut(idx) {
                    line.quantity = line.quantity.saturating_add(quantity.get());
                }
            }
            None => self.lines.push(CartLine::new(product, quantity)),
        }
    }

    /// Changes a line's quantity by `delta`. A result of zero or less removes the line; an
    /// unknown product is ignored.
    pub fn update_quantity(&mut self, product_id: &ProductId, delta: i64) {
        let Some(idx) = self.position(product_id) else {
            return;
        };

        let Some(line) = self.lines.get_mut(idx) else {
            return;
        };

        let next = i64::from(line.quantity.get()).saturating_add(delta);
        let next = u32::try_from(next.min(i64::from(u32::MAX))).ok().and_then(NonZeroU32::new);

        match next {
            Some(quantity) => line.quantity = quantity,
            None => {
                self.lines.remove(idx);
            }
        }
    }

    /// Drops the line for `product_id`, returning it if it was present.
    pub fn remove_line(&mut self, product_id: &ProductId) -> Option<CartLine> {
        self.position(product_id).map(|idx| self.lines.remove(idx))
    }

    /// Empties the cart and resets the customer, payment method, note and discount.
    pub fn clear(&mut self) {
        let tax_rate = self.tax_rate;

        *self = Self::with_tax_rate(tax_rate);
    }

    /// Selects the customer.
    pub fn set_customer(&mut self, customer: CustomerSelection) {
        self.customer = customer;
    }

    /// Selects the payment method.
    pub fn set_payment_method(&mut self, payment_method: PaymentMethod) {
        self.payment_method = payment_method;
    }

    /// Sets the order note.
    pub fn set_note(&mut self, note: impl Into<String>) {
        self.note = note.into();
    }

    /// Sets the order-level discount.
    pub fn set_discount(&mut self, discount: Discount) {
        self.discount = discount;
    }

    /// Sets the tax rate.
    pub fn set_tax_rate(&mut self, tax_rate: TaxRate) {
        self.tax_rate = tax_rate;
    }

    /// Lines in the order they were added.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for `product_id`, if any.
    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id() == product_id)
    }

    /// Selected customer.
    #[must_use]
    pub fn customer(&self) -> &CustomerSelection {
        &self.customer
    }

    /// Selected payment method.
    #[must_use]
    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    /// Order note.
    #[must_use]
    pub fn note(&self) -> &str {
        &self.note
    }

    /// Order-level discount.
    #[must_use]
    pub fn discount(&self) -> Discount {
        self.discount
    }

    /// Tax rate.
    #[must_use]
    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity())).sum()
    }

    /// Discount and tax currently applied.
    #[must_use]
    pub fn adjustments(&self) -> Adjustments {
        Adjustments {
            tax_rate: self.tax_rate,
            discount: self.discount,
        }
    }

    /// Current totals.
    ///
    /// # Errors
    ///
    /// Returns an [`AmountError`] if a percentage calculation overflows.
    pub fn totals(&self) -> Result<Totals, AmountError> {
        compute_totals(&self.lines, &self.adjustments())
    }

    /// Builds the order creation payload for this cart.
    ///
    /// `customer` supplies the selected customer's details when the caller has them loaded; it is
    /// ignored if it does not match the selection.
    ///
    /// When a discount or tax applies the locally computed amounts are sent with the items, so
    /// the backend charges the adjusted total. The note stays local; the order payload has no
    /// field for it.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Empty`] if there are no lines, or an amount error if totalling fails.
    pub fn order_request(
        &self,
        context: &OrderContext,
        customer: Option<&Customer>,
    ) -> Result<OrderRequest, CartError> {
        if self.is_empty() {
            return Err(CartError::Empty);
        }

        let totals = self.totals()?;
        let adjusted = (totals.discount != 0 || totals.tax != 0).then_some(totals);

        let customer_id = self.customer.customer_id().cloned();
        let customer = customer
            .filter(|customer| Some(&customer.id) == customer_id.as_ref())
            .map(CustomerSummary::from);

        Ok(OrderRequest {
            store_id: context.store_id.clone(),
            branch_id: context.branch_id.clone(),
            customer_id,
            customer,
            items: self
                .lines
                .iter()
                .map(|line| OrderItemRequest {
                    product_id: line.product_id().clone(),
                    quantity: line.quantity(),
                })
                .collect(),
            subtotal: adjusted.map(|totals| totals.subtotal),
            tax: adjusted.map(|totals| totals.tax),
            discount: adjusted.map(|totals| totals.discount),
            total: adjusted.map(|totals| totals.total),
            payment_type: self.payment_method,
        })
    }

    /// Finishes a sale the backend has accepted: builds the receipt from the local lines and the
    /// server's order, then clears the cart.
    ///
    /// # Errors
    ///
    /// Returns an [`AmountError`] if totalling fails, in which case the cart is left untouched.
    pub fn complete(
        &mut self,
        order: &Order,
        customer_name: Option<String>,
    ) -> Result<Receipt, CartError> {
        let receipt = Receipt::for_sale(order, self, customer_name)?;

        self.clear();

        Ok(receipt)
    }

    fn position(&self, product_id: &ProductId) -> Option<usize> {
        self.lines.iter().position(|line| line.product_id() == product_id)
    }
}

#[cfg(test)]
mod tests {
    use decimal_percentage::Percentage;
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::{
        customers::CustomerId,
        orders::{OrderId, StoreId},
    };

    use super::*;

    fn shirt() -> Product {
        Product::new("1", "Linen Shirt", 59_900)
    }

    fn jeans() -> Product {
        Product::new("2", "Denim Jeans", 39_900)
    }

    fn assert_lines_consistent(cart: &Cart) {
        for line in cart.lines() {
            assert!(line.quantity() >= 1);
            assert_eq!(
                line.subtotal(),
                line.unit_price() * i64::from(line.quantity())
            );
        }
    }

    #[test]
    fn adding_same_product_increments_quantity() {
        let mut cart = Cart::new();

        cart.add_product(&shirt());
        cart.add_product(&shirt());
        cart.add_product(&jeans());

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.line(&shirt().id).map(CartLine::quantity), Some(2));
        assert_eq!(cart.line(&shirt().id).map(CartLine::subtotal), Some(119_800));
        assert_eq!(cart.item_count(), 3);
        assert_lines_consistent(&cart);
    }

    #[test]
    fn two_lines_total_to_their_sum() -> TestResult {
        let mut cart = Cart::new();

        cart.add_product(&shirt());
        cart.add_product(&jeans());

        let totals = cart.totals()?;

        assert_eq!(totals.subtotal, 99_800);
        assert_eq!(totals.tax, 0);
        assert_eq!(totals.discount, 0);
        assert_eq!(totals.total, 99_800);

        Ok(())
    }

    #[test]
    fn update_quantity_to_zero_removes_line() {
        let mut cart = Cart::new();

        cart.add_product(&shirt());
        cart.add_product(&jeans());
        cart.update_quantity(&shirt().id, 2);

        assert_eq!(cart.line(&shirt().id).map(CartLine::quantity), Some(3));

        cart.update_quantity(&shirt().id, -3);

        assert!(cart.line(&shirt().id).is_none());
        assert_eq!(cart.len(), 1);

        cart.update_quantity(&jeans().id, -10);

        assert!(cart.is_empty());
    }

    #[test]
    fn update_quantity_on_unknown_product_is_noop() {
        let mut cart = Cart::new();

        cart.add_product(&shirt());

        let before = cart.clone();

        cart.update_quantity(&ProductId::new("missing"), 5);

        assert_eq!(cart, before);
    }

    #[test]
    fn mixed_mutations_keep_lines_consistent() {
        let mut cart = Cart::new();
        let deltas = [3, -1, -5, 2, 7, -2, -9, 1];

        for (step, delta) in deltas.into_iter().enumerate() {
            let product = if step % 2 == 0 { shirt() } else { jeans() };

            cart.add_product(&product);
            cart.update_quantity(&product.id, delta);

            assert_lines_consistent(&cart);
        }
    }

    #[test]
    fn remove_and_clear() {
        let mut cart = Cart::with_tax_rate(TaxRate::from(Decimal::new(5, 2)));

        cart.add_product(&shirt());
        cart.add_product(&jeans());
        cart.set_customer(CustomerSelection::Customer(CustomerId::new("c-1")));
        cart.set_payment_method(PaymentMethod::Upi);
        cart.set_note("gift wrap");
        cart.set_discount(Discount::Amount(1_000));

        assert!(cart.remove_line(&shirt().id).is_some());
        assert!(cart.remove_line(&shirt().id).is_none());

        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart.customer(), &CustomerSelection::WalkIn);
        assert_eq!(cart.payment_method(), PaymentMethod::Cash);
        assert_eq!(cart.note(), "");
        assert_eq!(cart.discount(), Discount::None);
        assert_eq!(cart.tax_rate(), TaxRate::from(Decimal::new(5, 2)));
    }

    #[test]
    fn totals_apply_discount_then_tax() -> TestResult {
        let mut cart = Cart::with_tax_rate(TaxRate::from(Decimal::new(10, 2)));

        cart.add_product(&shirt());
        cart.add_product(&jeans());
        cart.set_discount(Discount::Percentage(Percentage::from(Decimal::new(50, 2))));

        let totals = cart.totals()?;

        assert_eq!(totals.subtotal, 99_800);
        assert_eq!(totals.discount, 49_900);
        assert_eq!(totals.tax, 4_990);
        assert_eq!(totals.total, 54_890);

        Ok(())
    }

    #[test]
    fn discount_never_drives_total_negative() -> TestResult {
        let mut cart = Cart::new();

        cart.add_product(&jeans());
        cart.set_discount(Discount::Amount(1_000_000));

        assert_eq!(cart.totals()?.total, 0);

        Ok(())
    }

    #[test]
    fn empty_cart_cannot_build_order_request() {
        let context = OrderContext {
            store_id: StoreId::new("5"),
            branch_id: None,
        };

        assert_eq!(
            Cart::new().order_request(&context, None),
            Err(CartError::Empty)
        );
    }

    #[test]
    fn order_request_carries_lines_customer_and_payment() -> TestResult {
        let context = OrderContext {
            store_id: StoreId::new("5"),
            branch_id: None,
        };
        let customer = Customer {
            id: CustomerId::new("c-1"),
            full_name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            phone: "555-0100".to_string(),
            address: None,
        };

        let mut cart = Cart::new();

        cart.add_product(&shirt());
        cart.add_product(&shirt());
        cart.set_customer(CustomerSelection::Customer(customer.id.clone()));
        cart.set_payment_method(PaymentMethod::Card);

        let request = cart.order_request(&context, Some(&customer))?;

        assert_eq!(request.customer_id, Some(customer.id.clone()));
        assert_eq!(
            request.customer.and_then(|c| c.full_name),
            Some("Asha".to_string())
        );
        assert_eq!(
            request.items,
            vec![OrderItemRequest {
                product_id: ProductId::new("1"),
                quantity: 2,
            }]
        );
        assert_eq!(request.payment_type, PaymentMethod::Card);
        assert_eq!(request.total, None);

        Ok(())
    }

    #[test]
    fn discounted_order_request_sends_adjusted_amounts() -> TestResult {
        let context = OrderContext {
            store_id: StoreId::new("5"),
            branch_id: None,
        };

        let mut cart = Cart::new();

        cart.add_product(&shirt());
        cart.add_product(&jeans());
        cart.set_discount(Discount::Percentage(Percentage::from(Decimal::new(10, 2))));

        let request = cart.order_request(&context, None)?;

        assert_eq!(request.subtotal, Some(99_800));
        assert_eq!(request.discount, Some(9_980));
        assert_eq!(request.tax, Some(0));
        assert_eq!(request.total, Some(89_820));
        assert_eq!(request.total, Some(cart.totals()?.total));

        Ok(())
    }

    #[test]
    fn complete_clears_cart_and_keeps_local_lines_on_receipt() -> TestResult {
        let mut cart = Cart::new();

        cart.add_product(&shirt());
        cart.add_product(&jeans());

        let order: Order =
            serde_json::from_str(r#"{ "id": 1042, "orderNumber": "ORD-1042", "totalAmount": 998 }"#)?;

        let receipt = cart.complete(&order, None)?;

        assert!(cart.is_empty());
        assert_eq!(receipt.order_id, OrderId::new("1042"));
        assert_eq!(receipt.lines.len(), 2);
        assert_eq!(
            receipt.lines.first().map(|line| line.name.as_str()),
            Some("Linen Shirt")
        );
        assert_eq!(receipt.amount_charged, 99_800);

        Ok(())
    }

    #[test]
    fn persisted_cart_round_trips_and_rejects_duplicates() -> TestResult {
        let mut cart = Cart::new();

        cart.add_product(&shirt());
        cart.set_note("fragile");

        let json = serde_json::to_string(&cart)?;
        let restored: Cart = serde_json::from_str(&json)?;

        assert_eq!(restored, cart);

        let duplicate = r#"{
            "lines": [
                { "product": { "id": "1", "name": "A", "unitPrice": 100 }, "quantity": 1 },
                { "product": { "id": "1", "name": "A", "unitPrice": 100 }, "quantity": 2 }
            ]
        }"#;

        assert!(serde_json::from_str::<Cart>(duplicate).is_err());

        let zero_quantity = r#"{
            "lines": [{ "product": { "id": "1", "name": "A", "unitPrice": 100 }, "quantity": 0 }]
        }"#;

        assert!(serde_json::from_str::<Cart>(zero_quantity).is_err());

        Ok(())
    }
}

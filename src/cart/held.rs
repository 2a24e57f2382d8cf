//! Held orders
//!
//! Carts parked by the cashier so another customer can be served.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::customers::CustomerSelection;

use super::{Cart, CartError, CartLine, Discount};

/// A parked cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeldOrder {
    /// Held order id
    pub id: Uuid,

    /// Lines at the time the cart was held
    pub lines: Vec<CartLine>,

    /// Selected customer
    #[serde(default)]
    pub customer: CustomerSelection,

    /// Order note
    #[serde(default)]
    pub note: String,

    /// Order-level discount
    #[serde(default)]
    pub discount: Discount,

    /// When the cart was held
    pub held_at: Timestamp,
}

impl HeldOrder {
    /// Total units held.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity())).sum()
    }
}

/// Held orders, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeldOrders(Vec<HeldOrder>);

impl HeldOrders {
    /// Parks `cart` and clears it, returning the held order's id.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Empty`] if the cart has no lines.
    pub fn hold(&mut self, cart: &mut Cart, at: Timestamp) -> Result<Uuid, CartError> {
        if cart.is_empty() {
            return Err(CartError::Empty);
        }

        let id = Uuid::now_v7();

        self.0.push(HeldOrder {
            id,
            lines: std::mem::take(&mut cart.lines),
            customer: std::mem::take(&mut cart.customer),
            note: std::mem::take(&mut cart.note),
            discount: cart.discount,
            held_at: at,
        });

        cart.clear();

        Ok(id)
    }

    /// Moves a held order back into `cart`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotEmpty`] if `cart` still has lines, or
    /// [`CartError::HeldOrderNotFound`] if `id` is unknown.
    pub fn restore(&mut self, id: Uuid, cart: &mut Cart) -> Result<(), CartError> {
        if !cart.is_empty() {
            return Err(CartError::NotEmpty);
        }

        let idx = self
            .0
            .iter()
            .position(|held| held.id == id)
            .ok_or(CartError::HeldOrderNotFound(id))?;

        let held = self.0.remove(idx);

        cart.lines = held.lines;
        cart.customer = held.customer;
        cart.note = held.note;
        cart.discount = held.discount;

        Ok(())
    }

    /// Looks up a held order.
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&HeldOrder> {
        self.0.iter().find(|held| held.id == id)
    }

    /// Iterate over held orders, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &HeldOrder> {
        self.0.iter()
    }

    /// Number of held orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if nothing is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

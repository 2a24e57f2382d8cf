//! Returns
//!
//! Turns a placed order plus partial-return selections into a refund request. Quantities are
//! clamped into range rather than rejected; validation only happens when the request is built.

use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    money,
    orders::{Order, OrderLine, OrderLineId, PaymentMethod},
    refunds::{RefundRequest, ReturnReason},
};

/// Errors raised building a refund request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReturnError {
    /// No line has a return quantity.
    #[error("Please select at least one item to return")]
    NothingToReturn,

    /// No reason was chosen.
    #[error("Please select a return reason")]
    MissingReason,

    /// A manually entered amount was zero or negative.
    #[error("Refund amount must be greater than zero")]
    InvalidAmount(i64),
}

/// How the refund amount is decided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefundPolicy {
    /// Let the operator enter the amount instead of using the computed total. Entered amounts are
    /// capped at the order total.
    pub allow_manual_amount: bool,
}

impl RefundPolicy {
    /// Refunds exactly what the selected lines are worth.
    #[must_use]
    pub fn computed() -> Self {
        Self {
            allow_manual_amount: false,
        }
    }

    /// Accepts operator-entered amounts.
    #[must_use]
    pub fn manual() -> Self {
        Self {
            allow_manual_amount: true,
        }
    }

    /// Decides the amount to refund.
    ///
    /// # Errors
    ///
    /// Returns [`ReturnError::InvalidAmount`] if a manual amount is not positive.
    pub fn amount(
        self,
        computed: i64,
        manual: Option<i64>,
        order_total: i64,
    ) -> Result<i64, ReturnError> {
        match manual {
            Some(amount) if self.allow_manual_amount => {
                if amount <= 0 {
                    return Err(ReturnError::InvalidAmount(amount));
                }

                Ok(amount.min(order_total.max(0)))
            }
            _ => Ok(computed),
        }
    }
}

/// An order line with the quantity being returned.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnItem {
    id: OrderLineId,
    line: OrderLine,
    return_qty: u32,
}

impl ReturnItem {
    /// Item id: the order line id, or the line's position when the backend sent none.
    #[must_use]
    pub fn id(&self) -> &OrderLineId {
        &self.id
    }

    /// Original order line.
    #[must_use]
    pub fn line(&self) -> &OrderLine {
        &self.line
    }

    /// Quantity originally sold.
    #[must_use]
    pub fn ordered(&self) -> u32 {
        self.line.quantity
    }

    /// Quantity being returned, in `0..=ordered`.
    #[must_use]
    pub fn return_qty(&self) -> u32 {
        self.return_qty
    }

    /// `price × return_qty` in minor units.
    #[must_use]
    pub fn refund_amount(&self) -> i64 {
        money::extend(self.line.price, self.return_qty)
    }

    fn set(&mut self, qty: i64) {
        let clamped = qty.clamp(0, i64::from(self.ordered()));

        self.return_qty = u32::try_from(clamped).unwrap_or_default();
    }
}

/// Return selections against one order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSheet {
    order: Order,
    items: Vec<ReturnItem>,
}

impl ReturnSheet {
    /// Seeds one item per order line, none selected.
    #[must_use]
    pub fn load_order(order: Order) -> Self {
        let items = order
            .items
            .iter()
            .enumerate()
            .map(|(idx, line)| ReturnItem {
                id: line
                    .id
                    .clone()
                    .unwrap_or_else(|| OrderLineId::new(idx.to_string())),
                line: line.clone(),
                return_qty: 0,
            })
            .collect();

        Self { order, items }
    }

    /// Order being returned against.
    #[must_use]
    pub fn order(&self) -> &Order {
        &self.order
    }

    /// All items in order line order.
    #[must_use]
    pub fn items(&self) -> &[ReturnItem] {
        &self.items
    }

    /// Looks up an item.
    #[must_use]
    pub fn item(&self, id: &OrderLineId) -> Option<&ReturnItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Sets the return quantity, clamped into `[0, ordered]`. Unknown ids are ignored.
    pub fn set_return_qty(&mut self, id: &OrderLineId, qty: i64) {
        if let Some(item) = self.item_mut(id) {
            item.set(qty);
        }
    }

    /// Sets the return quantity from operator text; anything unparsable counts as zero.
    pub fn set_return_qty_input(&mut self, id: &OrderLineId, input: &str) {
        self.set_return_qty(id, input.trim().parse().unwrap_or(0));
    }

    /// Returns the full ordered quantity if nothing is selected, otherwise clears the selection.
    pub fn toggle_return(&mut self, id: &OrderLineId) {
        if let Some(item) = self.item_mut(id) {
            item.return_qty = if item.return_qty == 0 { item.ordered() } else { 0 };
        }
    }

    /// Clears every selection.
    pub fn reset(&mut self) {
        for item in &mut self.items {
            item.return_qty = 0;
        }
    }

    /// Items with a return quantity.
    #[must_use]
    pub fn returned_items(&self) -> SmallVec<[&ReturnItem; 8]> {
        self.items.iter().filter(|item| item.return_qty > 0).collect()
    }

    /// Sum of `price × return_qty` over returned items.
    #[must_use]
    pub fn refund_total(&self) -> i64 {
        self.items
            .iter()
            .filter(|item| item.return_qty > 0)
            .map(ReturnItem::refund_amount)
            .fold(0_i64, i64::saturating_add)
    }

    /// Builds the refund request. Desk refunds are always paid out in cash.
    ///
    /// # Errors
    ///
    /// Returns a [`ReturnError`] if nothing is selected, no reason is given or a manual amount is
    /// not positive.
    pub fn build_request(
        &self,
        reason: Option<&ReturnReason>,
        policy: RefundPolicy,
        manual_amount: Option<i64>,
    ) -> Result<RefundRequest, ReturnError> {
        if self.returned_items().is_empty() {
            return Err(ReturnError::NothingToReturn);
        }

        let reason = reason.ok_or(ReturnError::MissingReason)?;
        let amount = policy.amount(self.refund_total(), manual_amount, self.order.total_amount)?;

        Ok(RefundRequest {
            order_id: self.order.id.clone(),
            reason: reason.clone(),
            amount,
            payment_type: Some(PaymentMethod::Cash),
        })
    }

    fn item_mut(&mut self, id: &OrderLineId) -> Option<&mut ReturnItem> {
        self.items.iter_mut().find(|item| &item.id == id)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::orders::OrderId;

    use super::*;

    fn order() -> TestResult<Order> {
        Ok(serde_json::from_str(
            r#"{
                "id": 1042,
                "items": [
                    { "id": "a", "productId": 7, "productName": "Linen Shirt", "quantity": 1, "price": 599 },
                    { "id": "b", "productId": 8, "productName": "Socks", "quantity": 3, "price": 99 }
                ],
                "totalAmount": 896
            }"#,
        )?)
    }

    fn line(id: &str) -> OrderLineId {
        OrderLineId::new(id)
    }

    #[test]
    fn load_order_starts_with_nothing_selected() -> TestResult {
        let sheet = ReturnSheet::load_order(order()?);

        assert_eq!(sheet.items().len(), 2);
        assert!(sheet.items().iter().all(|item| item.return_qty() == 0));
        assert_eq!(sheet.refund_total(), 0);

        Ok(())
    }

    #[test]
    fn return_qty_is_clamped_to_ordered_quantity() -> TestResult {
        let mut sheet = ReturnSheet::load_order(order()?);

        sheet.set_return_qty(&line("a"), 5);

        assert_eq!(sheet.item(&line("a")).map(ReturnItem::return_qty), Some(1));
        assert_eq!(sheet.refund_total(), 59_900);

        for qty in [-7, 0, 2, 3, 4, i64::MAX, i64::MIN] {
            sheet.set_return_qty(&line("b"), qty);

            let stored = sheet.item(&line("b")).map(ReturnItem::return_qty);

            assert!(stored.is_some_and(|stored| stored <= 3), "{qty} stored {stored:?}");
        }

        Ok(())
    }

    #[test]
    fn unparsable_input_counts_as_zero() -> TestResult {
        let mut sheet = ReturnSheet::load_order(order()?);

        sheet.set_return_qty_input(&line("b"), " 2 ");
        assert_eq!(sheet.item(&line("b")).map(ReturnItem::return_qty), Some(2));

        sheet.set_return_qty_input(&line("b"), "two");
        assert_eq!(sheet.item(&line("b")).map(ReturnItem::return_qty), Some(0));

        Ok(())
    }

    #[test]
    fn toggle_switches_between_full_and_none() -> TestResult {
        let mut sheet = ReturnSheet::load_order(order()?);

        sheet.toggle_return(&line("b"));
        assert_eq!(sheet.item(&line("b")).map(ReturnItem::return_qty), Some(3));

        sheet.toggle_return(&line("b"));
        assert_eq!(sheet.item(&line("b")).map(ReturnItem::return_qty), Some(0));

        Ok(())
    }

    #[test]
    fn refund_total_counts_only_returned_items() -> TestResult {
        let mut sheet = ReturnSheet::load_order(order()?);

        sheet.set_return_qty(&line("b"), 2);

        assert_eq!(sheet.returned_items().len(), 1);
        assert_eq!(sheet.refund_total(), 19_800);

        Ok(())
    }

    #[test]
    fn unknown_item_is_ignored() -> TestResult {
        let mut sheet = ReturnSheet::load_order(order()?);
        let before = sheet.clone();

        sheet.set_return_qty(&line("zzz"), 1);
        sheet.toggle_return(&line("zzz"));

        assert_eq!(sheet, before);

        Ok(())
    }

    #[test]
    fn lines_without_ids_are_keyed_by_position() -> TestResult {
        let order: Order = serde_json::from_str(
            r#"{ "id": 1, "items": [{ "productId": 7, "quantity": 2, "price": 10 }], "totalAmount": 20 }"#,
        )?;
        let mut sheet = ReturnSheet::load_order(order);

        sheet.toggle_return(&line("0"));

        assert_eq!(sheet.refund_total(), 2_000);

        Ok(())
    }

    #[test]
    fn build_request_validates_selection_then_reason() -> TestResult {
        let mut sheet = ReturnSheet::load_order(order()?);
        let policy = RefundPolicy::default();

        assert_eq!(
            sheet.build_request(Some(&ReturnReason::Damaged), policy, None),
            Err(ReturnError::NothingToReturn)
        );

        sheet.toggle_return(&line("a"));

        assert_eq!(
            sheet.build_request(None, policy, None),
            Err(ReturnError::MissingReason)
        );

        let request = sheet.build_request(Some(&ReturnReason::Damaged), policy, None)?;

        assert_eq!(request.order_id, OrderId::new("1042"));
        assert_eq!(request.amount, 59_900);
        assert_eq!(request.payment_type, Some(PaymentMethod::Cash));

        Ok(())
    }

    #[test]
    fn default_policy_ignores_manual_amount() -> TestResult {
        let mut sheet = ReturnSheet::load_order(order()?);

        sheet.toggle_return(&line("a"));

        let request = sheet.build_request(
            Some(&ReturnReason::Quality),
            RefundPolicy::computed(),
            Some(10_000),
        )?;

        assert_eq!(request.amount, 59_900);

        Ok(())
    }

    #[test]
    fn manual_policy_caps_at_order_total() -> TestResult {
        let mut sheet = ReturnSheet::load_order(order()?);
        let policy = RefundPolicy::manual();

        sheet.toggle_return(&line("a"));

        let capped = sheet.build_request(Some(&ReturnReason::Quality), policy, Some(1_000_000))?;
        let entered = sheet.build_request(Some(&ReturnReason::Quality), policy, Some(25_000))?;
        let fallback = sheet.build_request(Some(&ReturnReason::Quality), policy, None)?;

        assert_eq!(capped.amount, 89_600);
        assert_eq!(entered.amount, 25_000);
        assert_eq!(fallback.amount, 59_900);
        assert_eq!(
            sheet.build_request(Some(&ReturnReason::Quality), policy, Some(0)),
            Err(ReturnError::InvalidAmount(0))
        );

        Ok(())
    }
}

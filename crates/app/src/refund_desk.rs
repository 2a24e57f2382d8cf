//! Refund desk
//!
//! Select an order, choose what is coming back and why, then submit. A failed submission keeps
//! every selection so the cashier can retry; a successful one clears the desk.

use thiserror::Error;
use till::{
    orders::{CashierId, Order, OrderId, OrderLineId},
    refunds::{Refund, ReturnReason},
    resource::Resource,
    returns::{RefundPolicy, ReturnError, ReturnSheet},
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    api::{ApiError, OrderRange, cancellable, settle},
    context::AppContext,
};

/// Errors raised by refund desk operations.
#[derive(Debug, Error)]
pub enum RefundDeskError {
    /// The selections do not make a valid refund.
    #[error(transparent)]
    Return(#[from] ReturnError),

    /// The backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The order is not among the loaded orders.
    #[error("Order {0} not found")]
    UnknownOrder(OrderId),

    /// Nothing has been selected to refund against.
    #[error("No order selected")]
    NoOrderSelected,
}

/// Refund entry for one cashier.
#[derive(Debug)]
pub struct RefundDesk {
    services: AppContext,
    policy: RefundPolicy,
    orders: Resource<Vec<Order>>,
    history: Resource<Vec<Refund>>,
    sheet: Option<ReturnSheet>,
    reason: Option<ReturnReason>,
    manual_amount: Option<i64>,
}

impl RefundDesk {
    /// Creates an idle desk.
    #[must_use]
    pub fn new(services: AppContext, policy: RefundPolicy) -> Self {
        Self {
            services,
            policy,
            orders: Resource::Idle,
            history: Resource::Idle,
            sheet: None,
            reason: None,
            manual_amount: None,
        }
    }

    /// Refund policy in force.
    #[must_use]
    pub fn policy(&self) -> RefundPolicy {
        self.policy
    }

    /// Orders available to refund against.
    #[must_use]
    pub fn orders(&self) -> &Resource<Vec<Order>> {
        &self.orders
    }

    /// Refunds the cashier has processed.
    #[must_use]
    pub fn history(&self) -> &Resource<Vec<Refund>> {
        &self.history
    }

    /// Return selections for the chosen order.
    #[must_use]
    pub fn sheet(&self) -> Option<&ReturnSheet> {
        self.sheet.as_ref()
    }

    /// Chosen reason.
    #[must_use]
    pub fn reason(&self) -> Option<&ReturnReason> {
        self.reason.as_ref()
    }

    /// Fetches the orders a cashier has rung up.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] from the backend.
    pub async fn load_orders(
        &mut self,
        cashier_id: CashierId,
        cancel: &CancellationToken,
    ) -> Result<&[Order], RefundDeskError> {
        let previous = std::mem::replace(&mut self.orders, Resource::Loading);
        let result = cancellable(cancel, self.services.orders.orders_by_cashier(cashier_id)).await;

        settle(&mut self.orders, previous, result)?;

        Ok(self.orders.loaded().map(Vec::as_slice).unwrap_or_default())
    }

    /// Fetches a cashier's orders placed within `range`.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] from the backend.
    pub async fn load_orders_in_range(
        &mut self,
        cashier_id: CashierId,
        range: OrderRange,
        cancel: &CancellationToken,
    ) -> Result<&[Order], RefundDeskError> {
        let previous = std::mem::replace(&mut self.orders, Resource::Loading);
        let result = cancellable(
            cancel,
            self.services
                .orders
                .orders_by_cashier_in_range(cashier_id, range),
        )
        .await;

        settle(&mut self.orders, previous, result)?;

        Ok(self.orders.loaded().map(Vec::as_slice).unwrap_or_default())
    }

    /// Starts a return against one of the loaded orders. Any previous selections and reason are
    /// discarded.
    ///
    /// # Errors
    ///
    /// Returns [`RefundDeskError::UnknownOrder`] if the order is not loaded.
    pub fn select_order(&mut self, order_id: &OrderId) -> Result<&ReturnSheet, RefundDeskError> {
        let order = self
            .orders
            .loaded()
            .and_then(|orders| orders.iter().find(|order| &order.id == order_id))
            .cloned()
            .ok_or_else(|| RefundDeskError::UnknownOrder(order_id.clone()))?;

        Ok(self.open(order))
    }

    /// Fetches a single order from the backend and starts a return against it.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] from the backend; the current selection is kept.
    pub async fn open_order(
        &mut self,
        order_id: OrderId,
        cancel: &CancellationToken,
    ) -> Result<&ReturnSheet, RefundDeskError> {
        let order = cancellable(cancel, self.services.orders.get_order(order_id)).await?;

        Ok(self.open(order))
    }

    /// Chooses the reason.
    pub fn set_reason(&mut self, reason: Option<ReturnReason>) {
        self.reason = reason;
    }

    /// Sets an operator-entered amount in minor units; only honoured by a manual-amount policy.
    pub fn set_manual_amount(&mut self, amount: Option<i64>) {
        self.manual_amount = amount;
    }

    /// Sets how many units of a line are coming back, clamped into range.
    ///
    /// # Errors
    ///
    /// Returns [`RefundDeskError::NoOrderSelected`] if no order is selected.
    pub fn set_return_qty(&mut self, line: &OrderLineId, qty: i64) -> Result<(), RefundDeskError> {
        self.sheet_mut()?.set_return_qty(line, qty);

        Ok(())
    }

    /// Sets a return quantity from operator text; unparsable text counts as zero.
    ///
    /// # Errors
    ///
    /// Returns [`RefundDeskError::NoOrderSelected`] if no order is selected.
    pub fn set_return_qty_input(
        &mut self,
        line: &OrderLineId,
        input: &str,
    ) -> Result<(), RefundDeskError> {
        self.sheet_mut()?.set_return_qty_input(line, input);

        Ok(())
    }

    /// Returns all or none of a line.
    ///
    /// # Errors
    ///
    /// Returns [`RefundDeskError::NoOrderSelected`] if no order is selected.
    pub fn toggle_return(&mut self, line: &OrderLineId) -> Result<(), RefundDeskError> {
        self.sheet_mut()?.toggle_return(line);

        Ok(())
    }

    /// Amount the current selections are worth, in minor units.
    #[must_use]
    pub fn refund_total(&self) -> Option<i64> {
        self.sheet.as_ref().map(ReturnSheet::refund_total)
    }

    /// Validates and submits the refund.
    ///
    /// # Errors
    ///
    /// Returns a [`RefundDeskError`] if validation fails (nothing is sent) or the backend rejects
    /// the refund. Selections are kept in both cases.
    pub async fn submit(&mut self, cancel: &CancellationToken) -> Result<Refund, RefundDeskError> {
        let sheet = self
            .sheet
            .as_ref()
            .ok_or(RefundDeskError::NoOrderSelected)?;

        let request = sheet.build_request(self.reason.as_ref(), self.policy, self.manual_amount)?;
        let order_id = request.order_id.clone();
        let amount = request.amount;

        let refund = cancellable(cancel, self.services.refunds.create_refund(request))
            .await
            .inspect_err(|error| warn!(%error, %order_id, "refund failed; selections kept"))?;

        info!(refund_id = %refund.id, %order_id, amount, "refund processed");

        self.sheet = None;
        self.reason = None;
        self.manual_amount = None;

        if let Some(history) = self.history.loaded_mut() {
            history.insert(0, refund.clone());
        }

        Ok(refund)
    }

    /// Fetches the refunds a cashier has processed.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] from the backend.
    pub async fn refund_history(
        &mut self,
        cashier_id: CashierId,
        cancel: &CancellationToken,
    ) -> Result<&[Refund], RefundDeskError> {
        let previous = std::mem::replace(&mut self.history, Resource::Loading);
        let result = cancellable(cancel, self.services.refunds.refunds_by_cashier(cashier_id)).await;

        settle(&mut self.history, previous, result)?;

        Ok(self.history.loaded().map(Vec::as_slice).unwrap_or_default())
    }

    fn open(&mut self, order: Order) -> &ReturnSheet {
        self.reason = None;
        self.manual_amount = None;

        self.sheet.insert(ReturnSheet::load_order(order))
    }

    fn sheet_mut(&mut self) -> Result<&mut ReturnSheet, RefundDeskError> {
        self.sheet.as_mut().ok_or(RefundDeskError::NoOrderSelected)
    }
}

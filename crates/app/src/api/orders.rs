//! Orders service.

use async_trait::async_trait;
use jiff::civil::{Date, DateTime};
use mockall::automock;
use serde::Serialize;
use till::orders::{CashierId, Order, OrderId, OrderRequest};

use super::{ApiClient, ApiError};

/// Inclusive window of store-local time used to filter order listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderRange {
    /// Start of the window
    #[serde(rename = "startDate")]
    pub start: DateTime,

    /// End of the window
    #[serde(rename = "endDate")]
    pub end: DateTime,
}

impl OrderRange {
    /// Covers whole days from the start of `from` to the end of `to`.
    #[must_use]
    pub fn days(from: Date, to: Date) -> Self {
        Self {
            start: from.at(0, 0, 0, 0),
            end: to.at(23, 59, 59, 999_999_999),
        }
    }
}

/// Orders service backed by the REST API.
#[derive(Debug, Clone)]
pub struct HttpOrdersService {
    client: ApiClient,
}

impl HttpOrdersService {
    /// Creates the service over a shared client.
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OrdersService for HttpOrdersService {
    async fn create_order(&self, request: OrderRequest) -> Result<Order, ApiError> {
        self.client.post("/api/orders", &request).await
    }

    async fn get_order(&self, id: OrderId) -> Result<Order, ApiError> {
        self.client.get(&format!("/api/orders/{id}")).await
    }

    async fn orders_by_cashier(&self, cashier_id: CashierId) -> Result<Vec<Order>, ApiError> {
        self.client
            .get(&format!("/api/orders/cashier/{cashier_id}"))
            .await
    }

    async fn orders_by_cashier_in_range(
        &self,
        cashier_id: CashierId,
        range: OrderRange,
    ) -> Result<Vec<Order>, ApiError> {
        self.client
            .get_with_query(&format!("/api/orders/cashier/{cashier_id}/range"), &range)
            .await
    }
}

/// Order placement and lookup.
#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Places an order.
    async fn create_order(&self, request: OrderRequest) -> Result<Order, ApiError>;

    /// Retrieve a single order.
    async fn get_order(&self, id: OrderId) -> Result<Order, ApiError>;

    /// Retrieves the orders a cashier has rung up.
    async fn orders_by_cashier(&self, cashier_id: CashierId) -> Result<Vec<Order>, ApiError>;

    /// Retrieves a cashier's orders placed within `range`.
    async fn orders_by_cashier_in_range(
        &self,
        cashier_id: CashierId,
        range: OrderRange,
    ) -> Result<Vec<Order>, ApiError>;
}

//! Refunds service.

use async_trait::async_trait;
use mockall::automock;
use till::{
    orders::CashierId,
    refunds::{Refund, RefundId, RefundRequest},
};

use super::{ApiClient, ApiError};

/// Refunds service backed by the REST API.
#[derive(Debug, Clone)]
pub struct HttpRefundsService {
    client: ApiClient,
}

impl HttpRefundsService {
    /// Creates the service over a shared client.
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RefundsService for HttpRefundsService {
    async fn create_refund(&self, request: RefundRequest) -> Result<Refund, ApiError> {
        self.client.post("/api/refunds", &request).await
    }

    async fn get_refund(&self, id: RefundId) -> Result<Refund, ApiError> {
        self.client.get(&format!("/api/refunds/{id}")).await
    }

    async fn refunds_by_cashier(&self, cashier_id: CashierId) -> Result<Vec<Refund>, ApiError> {
        self.client
            .get(&format!("/api/refunds/cashier/{cashier_id}"))
            .await
    }
}

/// Refund submission and history.
#[automock]
#[async_trait]
pub trait RefundsService: Send + Sync {
    /// Records a refund against an order.
    async fn create_refund(&self, request: RefundRequest) -> Result<Refund, ApiError>;

    /// Retrieve a single refund.
    async fn get_refund(&self, id: RefundId) -> Result<Refund, ApiError>;

    /// Retrieves the refunds a cashier has processed.
    async fn refunds_by_cashier(&self, cashier_id: CashierId) -> Result<Vec<Refund>, ApiError>;
}

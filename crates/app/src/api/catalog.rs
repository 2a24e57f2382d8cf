//! Catalog service: products and customers.

use async_trait::async_trait;
use mockall::automock;
use till::{
    customers::{Customer, NewCustomer},
    orders::StoreId,
    products::Product,
};

use super::{ApiClient, ApiError};

/// Catalog service backed by the REST API.
#[derive(Debug, Clone)]
pub struct HttpCatalogService {
    client: ApiClient,
}

impl HttpCatalogService {
    /// Creates the service over a shared client.
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CatalogService for HttpCatalogService {
    async fn list_products(&self, store_id: StoreId) -> Result<Vec<Product>, ApiError> {
        self.client
            .get(&format!("/api/products/store/{store_id}"))
            .await
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, ApiError> {
        self.client.get("/api/customers").await
    }

    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer, ApiError> {
        self.client.post("/api/customers", &customer).await
    }
}

/// Products and customers for the terminal.
#[automock]
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Retrieves the products listed for a store.
    async fn list_products(&self, store_id: StoreId) -> Result<Vec<Product>, ApiError>;

    /// Retrieves the customer directory.
    async fn list_customers(&self) -> Result<Vec<Customer>, ApiError>;

    /// Registers a new customer.
    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer, ApiError>;
}

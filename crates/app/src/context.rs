//! App Context

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
};

use crate::api::{
    ApiClient, CatalogService, HttpCatalogService, HttpOrdersService, HttpRefundsService,
    OrdersService, RefundsService,
};

/// Backend services shared by the terminal and the refund desk.
#[derive(Clone)]
pub struct AppContext {
    /// Products and customers
    pub catalog: Arc<dyn CatalogService>,

    /// Orders
    pub orders: Arc<dyn OrdersService>,

    /// Refunds
    pub refunds: Arc<dyn RefundsService>,
}

impl AppContext {
    /// Build the context from explicit service implementations.
    pub fn new(
        catalog: impl CatalogService + 'static,
        orders: impl OrdersService + 'static,
        refunds: impl RefundsService + 'static,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            orders: Arc::new(orders),
            refunds: Arc::new(refunds),
        }
    }

    /// Build the context with every service talking to the REST API through `client`.
    #[must_use]
    pub fn from_client(client: &ApiClient) -> Self {
        Self::new(
            HttpCatalogService::new(client.clone()),
            HttpOrdersService::new(client.clone()),
            HttpRefundsService::new(client.clone()),
        )
    }
}

impl Debug for AppContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("AppContext").finish_non_exhaustive()
    }
}

//! Sales terminal
//!
//! Owns the cart for one register along with the product catalog and customer directory it sells
//! from. Backend calls take a [`CancellationToken`]; a cancelled call leaves the terminal exactly as
//! it was.

use std::num::NonZeroU32;

use jiff::Timestamp;
use thiserror::Error;
use till::{
    cart::{Cart, CartError, CartLine, HeldOrders, TaxRate},
    customers::{Customer, CustomerSelection, NewCustomer},
    orders::{BranchId, CashierId, OrderContext, StoreId},
    products::{Catalog, Product, ProductId},
    receipt::Receipt,
    resource::Resource,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    api::{ApiError, cancellable, settle},
    context::AppContext,
    session::CartSnapshot,
};

/// Errors raised by terminal operations.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// Cart validation failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// The backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Products have not been loaded yet.
    #[error("Products have not been loaded")]
    CatalogNotLoaded,

    /// No product matches the SKU or id.
    #[error("Product `{0}` not found")]
    UnknownProduct(String),

    /// The selected customer is not in the directory.
    #[error("Customer `{0}` not found")]
    UnknownCustomer(String),
}

/// Where this terminal is ringing up sales.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalContext {
    /// Store
    pub store_id: StoreId,

    /// Branch, if the register belongs to one
    pub branch_id: Option<BranchId>,

    /// Cashier signed in at the register
    pub cashier_id: Option<CashierId>,
}

impl TerminalContext {
    fn order_context(&self) -> OrderContext {
        OrderContext {
            store_id: self.store_id.clone(),
            branch_id: self.branch_id.clone(),
        }
    }
}

/// A sales register.
#[derive(Debug)]
pub struct Terminal {
    context: TerminalContext,
    services: AppContext,
    products: Resource<Catalog>,
    customers: Resource<Vec<Customer>>,
    cart: Cart,
    held: HeldOrders,
}

impl Terminal {
    /// Creates a terminal with an empty cart and nothing loaded.
    #[must_use]
    pub fn new(context: TerminalContext, services: AppContext, tax_rate: TaxRate) -> Self {
        Self {
            context,
            services,
            products: Resource::Idle,
            customers: Resource::Idle,
            cart: Cart::with_tax_rate(tax_rate),
            held: HeldOrders::default(),
        }
    }

    /// Terminal context.
    #[must_use]
    pub fn context(&self) -> &TerminalContext {
        &self.context
    }

    /// Product catalog load state.
    #[must_use]
    pub fn products(&self) -> &Resource<Catalog> {
        &self.products
    }

    /// Customer directory load state.
    #[must_use]
    pub fn customers(&self) -> &Resource<Vec<Customer>> {
        &self.customers
    }

    /// The cart.
    #[must_use]
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Mutable access to the cart.
    pub fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    /// Held orders.
    #[must_use]
    pub fn held(&self) -> &HeldOrders {
        &self.held
    }

    /// Fetches the store's products and the customer directory.
    ///
    /// # Errors
    ///
    /// Returns the first [`ApiError`] encountered; each resource records its own outcome. On
    /// cancellation both resources keep their previous state.
    pub async fn load(&mut self, cancel: &CancellationToken) -> Result<(), TerminalError> {
        let previous_products = std::mem::replace(&mut self.products, Resource::Loading);
        let previous_customers = std::mem::replace(&mut self.customers, Resource::Loading);

        let (products, customers) = tokio::join!(
            cancellable(
                cancel,
                self.services
                    .catalog
                    .list_products(self.context.store_id.clone())
            ),
            cancellable(cancel, self.services.catalog.list_customers()),
        );

        let products = settle(
            &mut self.products,
            previous_products,
            products.map(Catalog::new),
        );
        let customers = settle(&mut self.customers, previous_customers, customers);

        products?;
        customers?;

        info!(
            store_id = %self.context.store_id,
            products = self.products.loaded().map_or(0, Catalog::len),
            customers = self.customers.loaded().map_or(0, Vec::len),
            "catalog loaded"
        );

        Ok(())
    }

    /// Filters loaded products by name, SKU or brand.
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<&Product> {
        self.products
            .loaded()
            .map(|catalog| catalog.search(term))
            .unwrap_or_default()
    }

    /// Adds `quantity` units of the product with the given SKU (or id).
    ///
    /// # Errors
    ///
    /// Returns [`TerminalError::CatalogNotLoaded`] or [`TerminalError::UnknownProduct`].
    pub fn add_product_by_sku(
        &mut self,
        code: &str,
        quantity: NonZeroU32,
    ) -> Result<&CartLine, TerminalError> {
        let catalog = self
            .products
            .loaded()
            .ok_or(TerminalError::CatalogNotLoaded)?;

        let product = catalog
            .resolve(code)
            .ok_or_else(|| TerminalError::UnknownProduct(code.trim().to_string()))?;

        let id = product.id.clone();

        self.cart.add(product.into(), quantity);

        self.cart
            .line(&id)
            .ok_or_else(|| TerminalError::UnknownProduct(id.to_string()))
    }

    /// Adds one unit of a loaded product.
    ///
    /// # Errors
    ///
    /// Returns [`TerminalError::CatalogNotLoaded`] or [`TerminalError::UnknownProduct`].
    pub fn add_product(&mut self, id: &ProductId) -> Result<(), TerminalError> {
        let catalog = self
            .products
            .loaded()
            .ok_or(TerminalError::CatalogNotLoaded)?;

        let product = catalog
            .get(id)
            .ok_or_else(|| TerminalError::UnknownProduct(id.to_string()))?;

        self.cart.add_product(product);

        Ok(())
    }

    /// Selects the customer for the sale. Registered customers must be in the loaded directory.
    ///
    /// # Errors
    ///
    /// Returns [`TerminalError::UnknownCustomer`] if the directory is loaded and does not contain
    /// the customer.
    pub fn select_customer(&mut self, selection: CustomerSelection) -> Result<(), TerminalError> {
        if let (Some(directory), Some(id)) = (self.customers.loaded(), selection.customer_id())
            && !directory.iter().any(|customer| &customer.id == id)
        {
            return Err(TerminalError::UnknownCustomer(id.to_string()));
        }

        self.cart.set_customer(selection);

        Ok(())
    }

    /// The selected customer, when registered and loaded.
    #[must_use]
    pub fn selected_customer(&self) -> Option<&Customer> {
        self.customers
            .loaded()
            .and_then(|directory| self.cart.customer().resolve(directory))
    }

    /// Parks the current cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Empty`] if there is nothing to hold.
    pub fn hold(&mut self) -> Result<Uuid, TerminalError> {
        let id = self.held.hold(&mut self.cart, Timestamp::now())?;

        info!(held_order = %id, "cart held");

        Ok(id)
    }

    /// Brings a held cart back.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotEmpty`] if the current cart has lines, or
    /// [`CartError::HeldOrderNotFound`].
    pub fn restore_held(&mut self, id: Uuid) -> Result<(), TerminalError> {
        self.held.restore(id, &mut self.cart)?;

        info!(held_order = %id, "held cart restored");

        Ok(())
    }

    /// Places the order for the current cart.
    ///
    /// The cart is validated before anything is sent. On success the cart is cleared and the
    /// receipt returned; on any failure the cart is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Empty`] for an empty cart, or the [`ApiError`] from the backend.
    pub async fn checkout(&mut self, cancel: &CancellationToken) -> Result<Receipt, TerminalError> {
        let customer = self.selected_customer();
        let customer_name = customer.map(|customer| customer.full_name.clone());
        let request = self
            .cart
            .order_request(&self.context.order_context(), customer)?;

        let order = cancellable(cancel, self.services.orders.create_order(request))
            .await
            .inspect_err(|error| warn!(%error, "checkout failed; cart kept"))?;

        let receipt = self.cart.complete(&order, customer_name)?;

        if receipt.amount_charged != receipt.totals.total {
            warn!(
                order_id = %order.id,
                expected = receipt.totals.total,
                charged = receipt.amount_charged,
                "backend charged a different total"
            );
        }

        info!(
            order_id = %order.id,
            order = %receipt.label,
            lines = receipt.lines.len(),
            total = receipt.amount_charged,
            payment = %receipt.payment_method,
            "order placed"
        );

        Ok(receipt)
    }

    /// Registers a customer, adds them to the directory and selects them for the sale.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] from the backend; the directory and selection are unchanged.
    pub async fn create_customer(
        &mut self,
        customer: NewCustomer,
        cancel: &CancellationToken,
    ) -> Result<Customer, TerminalError> {
        let created = cancellable(cancel, self.services.catalog.create_customer(customer)).await?;

        match self.customers.loaded_mut() {
            Some(directory) => directory.push(created.clone()),
            None => self.customers = Resource::Loaded(vec![created.clone()]),
        }

        self.cart
            .set_customer(CustomerSelection::Customer(created.id.clone()));

        info!(customer_id = %created.id, "customer created");

        Ok(created)
    }

    /// The cart and held orders, for persisting.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            cart: self.cart.clone(),
            held: self.held.clone(),
        }
    }

    /// Replaces the cart and held orders with a saved snapshot, keeping the configured tax rate.
    pub fn rehydrate(&mut self, snapshot: CartSnapshot) {
        let tax_rate = self.cart.tax_rate();

        self.cart = snapshot.cart;
        self.cart.set_tax_rate(tax_rate);
        self.held = snapshot.held;
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use rust_decimal::Decimal;
    use testresult::TestResult;
    use till::{cart::Discount, customers::CustomerId, orders::PaymentMethod};

    use crate::{
        api::{MockCatalogService, MockOrdersService, MockRefundsService},
        test::helpers::{customers, placed_order, products, terminal_context},
    };

    use super::*;

    fn terminal(catalog: MockCatalogService, orders: MockOrdersService) -> Terminal {
        let mut refunds = MockRefundsService::new();

        refunds.expect_create_refund().never();

        Terminal::new(
            terminal_context(),
            AppContext::new(catalog, orders, refunds),
            TaxRate::default(),
        )
    }

    fn loaded_catalog() -> MockCatalogService {
        let mut catalog = MockCatalogService::new();

        catalog
            .expect_list_products()
            .once()
            .withf(|store_id| *store_id == StoreId::new("5"))
            .return_once(|_| Ok(products()));

        catalog
            .expect_list_customers()
            .once()
            .return_once(|| Ok(customers()));

        catalog
    }

    fn no_orders() -> MockOrdersService {
        let mut orders = MockOrdersService::new();

        orders.expect_create_order().never();

        orders
    }

    #[tokio::test]
    async fn load_fills_products_and_customers() -> TestResult {
        let mut terminal = terminal(loaded_catalog(), no_orders());

        terminal.load(&CancellationToken::new()).await?;

        assert_eq!(terminal.products().loaded().map(Catalog::len), Some(3));
        assert_eq!(terminal.customers().loaded().map(Vec::len), Some(2));
        assert_eq!(terminal.search("denim").len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn load_failure_is_recorded_per_resource() {
        let mut catalog = MockCatalogService::new();

        catalog.expect_list_products().once().return_once(|_| {
            Err(ApiError::Status {
                status: StatusCode::SERVICE_UNAVAILABLE,
                message: "down for maintenance".to_string(),
            })
        });
        catalog
            .expect_list_customers()
            .once()
            .return_once(|| Ok(customers()));

        let mut terminal = terminal(catalog, no_orders());

        let result = terminal.load(&CancellationToken::new()).await;

        assert!(matches!(result, Err(TerminalError::Api(ApiError::Status { .. }))));
        assert!(
            terminal
                .products()
                .error()
                .is_some_and(|message| message.contains("down for maintenance"))
        );
        assert_eq!(terminal.customers().loaded().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn cancelled_load_leaves_resources_idle() {
        let mut catalog = MockCatalogService::new();

        catalog
            .expect_list_products()
            .return_once(|_| Ok(products()));
        catalog
            .expect_list_customers()
            .return_once(|| Ok(customers()));

        let mut terminal = terminal(catalog, no_orders());
        let cancel = CancellationToken::new();

        cancel.cancel();

        let result = terminal.load(&cancel).await;

        assert!(matches!(result, Err(TerminalError::Api(ApiError::Cancelled))));
        assert_eq!(terminal.products(), &Resource::Idle);
        assert_eq!(terminal.customers(), &Resource::Idle);
    }

    #[tokio::test]
    async fn empty_cart_checkout_never_calls_backend() {
        let mut terminal = terminal(MockCatalogService::new(), no_orders());

        let result = terminal.checkout(&CancellationToken::new()).await;

        assert!(matches!(result, Err(TerminalError::Cart(CartError::Empty))));
    }

    #[tokio::test]
    async fn checkout_success_clears_cart_and_returns_receipt() -> TestResult {
        let mut orders = MockOrdersService::new();

        orders
            .expect_create_order()
            .once()
            .withf(|request| {
                request.store_id == StoreId::new("5")
                    && request.customer_id == Some(CustomerId::new("c-1"))
                    && request.customer.is_some()
                    && request.payment_type == PaymentMethod::Upi
                    && request.items.len() == 2
            })
            .return_once(|_| Ok(placed_order("1042", 998)));

        let mut terminal = terminal(loaded_catalog(), orders);

        terminal.load(&CancellationToken::new()).await?;
        terminal.add_product_by_sku("SH-001", NonZeroU32::MIN)?;
        terminal.add_product_by_sku("jn-002", NonZeroU32::MIN)?;
        terminal.select_customer(CustomerSelection::Customer(CustomerId::new("c-1")))?;
        terminal.cart_mut().set_payment_method(PaymentMethod::Upi);

        let receipt = terminal.checkout(&CancellationToken::new()).await?;

        assert!(terminal.cart().is_empty());
        assert_eq!(terminal.cart().payment_method(), PaymentMethod::Cash);
        assert_eq!(receipt.label, "ORD-1042");
        assert_eq!(receipt.customer_name.as_deref(), Some("Asha Rao"));
        assert_eq!(receipt.totals.subtotal, 99_800);
        assert_eq!(
            receipt
                .lines
                .iter()
                .map(|line| line.name.as_str())
                .collect::<Vec<_>>(),
            vec!["Linen Shirt", "Denim Jeans"]
        );

        Ok(())
    }

    #[tokio::test]
    async fn discounted_checkout_sends_adjusted_total() -> TestResult {
        let mut orders = MockOrdersService::new();

        orders
            .expect_create_order()
            .once()
            .withf(|request| {
                request.subtotal == Some(99_800)
                    && request.discount == Some(9_800)
                    && request.tax == Some(4_500)
                    && request.total == Some(94_500)
            })
            .return_once(|_| Ok(placed_order("1043", 945)));

        let mut terminal = terminal(loaded_catalog(), orders);

        terminal.load(&CancellationToken::new()).await?;
        terminal.add_product_by_sku("SH-001", NonZeroU32::MIN)?;
        terminal.add_product_by_sku("JN-002", NonZeroU32::MIN)?;
        terminal.cart_mut().set_discount(Discount::Amount(9_800));
        terminal
            .cart_mut()
            .set_tax_rate(TaxRate::from(Decimal::new(5, 2)));

        let receipt = terminal.checkout(&CancellationToken::new()).await?;

        assert_eq!(receipt.totals.discount, 9_800);
        assert_eq!(receipt.totals.tax, 4_500);
        assert_eq!(receipt.totals.total, 94_500);
        assert_eq!(receipt.amount_charged, receipt.totals.total);

        Ok(())
    }

    #[tokio::test]
    async fn checkout_failure_keeps_cart_intact() -> TestResult {
        let mut orders = MockOrdersService::new();

        orders.expect_create_order().once().return_once(|_| {
            Err(ApiError::Status {
                status: StatusCode::BAD_REQUEST,
                message: "Insufficient stock".to_string(),
            })
        });

        let mut terminal = terminal(loaded_catalog(), orders);

        terminal.load(&CancellationToken::new()).await?;
        terminal.add_product_by_sku("SH-001", NonZeroU32::MIN)?;
        terminal.add_product_by_sku("SH-001", NonZeroU32::MIN)?;
        terminal.add_product_by_sku("3", NonZeroU32::MIN)?;

        let before = terminal.cart().clone();

        let result = terminal.checkout(&CancellationToken::new()).await;

        assert!(matches!(result, Err(TerminalError::Api(ApiError::Status { .. }))));
        assert_eq!(terminal.cart(), &before);

        Ok(())
    }

    #[tokio::test]
    async fn cancelled_checkout_keeps_cart_intact() -> TestResult {
        let mut orders = MockOrdersService::new();

        orders
            .expect_create_order()
            .return_once(|_| Ok(placed_order("1042", 599)));

        let mut terminal = terminal(loaded_catalog(), orders);

        terminal.load(&CancellationToken::new()).await?;
        terminal.add_product_by_sku("SH-001", NonZeroU32::MIN)?;

        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = terminal.checkout(&cancel).await;

        assert!(matches!(result, Err(TerminalError::Api(ApiError::Cancelled))));
        assert_eq!(terminal.cart().len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn unknown_sku_and_customer_are_rejected() -> TestResult {
        let mut terminal = terminal(loaded_catalog(), no_orders());

        assert!(matches!(
            terminal.add_product_by_sku("SH-001", NonZeroU32::MIN),
            Err(TerminalError::CatalogNotLoaded)
        ));

        terminal.load(&CancellationToken::new()).await?;

        assert!(matches!(
            terminal.add_product_by_sku("nope", NonZeroU32::MIN),
            Err(TerminalError::UnknownProduct(_))
        ));
        assert!(matches!(
            terminal.select_customer(CustomerSelection::Customer(CustomerId::new("c-404"))),
            Err(TerminalError::UnknownCustomer(_))
        ));

        terminal.select_customer(CustomerSelection::WalkIn)?;

        Ok(())
    }

    #[tokio::test]
    async fn create_customer_appends_and_selects() -> TestResult {
        let mut catalog = loaded_catalog();

        catalog
            .expect_create_customer()
            .once()
            .withf(|new| new.full_name == "Meera Iyer")
            .return_once(|new| {
                Ok(Customer {
                    id: CustomerId::new("c-3"),
                    full_name: new.full_name,
                    email: new.email,
                    phone: new.phone,
                    address: new.address,
                })
            });

        let mut terminal = terminal(catalog, no_orders());

        terminal.load(&CancellationToken::new()).await?;

        let created = terminal
            .create_customer(
                NewCustomer {
                    full_name: "Meera Iyer".to_string(),
                    email: "meera@example.com".to_string(),
                    phone: "555-0199".to_string(),
                    address: None,
                },
                &CancellationToken::new(),
            )
            .await?;

        assert_eq!(terminal.customers().loaded().map(Vec::len), Some(3));
        assert_eq!(
            terminal.cart().customer(),
            &CustomerSelection::Customer(created.id.clone())
        );
        assert_eq!(
            terminal.selected_customer().map(|c| c.full_name.as_str()),
            Some("Meera Iyer")
        );

        Ok(())
    }

    #[test]
    fn hold_restore_and_snapshot() -> TestResult {
        let mut terminal = terminal(MockCatalogService::new(), no_orders());

        terminal.cart_mut().add_product(&Product::new("1", "Linen Shirt", 59_900));

        let id = terminal.hold()?;

        assert!(terminal.cart().is_empty());
        assert_eq!(terminal.snapshot().held.len(), 1);

        terminal.restore_held(id)?;

        assert_eq!(terminal.cart().len(), 1);
        assert!(terminal.held().is_empty());

        Ok(())
    }
}

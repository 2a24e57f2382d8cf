use clap::{Parser, Subcommand};
use rusty_money::iso::Currency;
use till_app::{
    api::{ApiClient, ApiConfig},
    config::AppConfig,
    context::AppContext,
    refund_desk::RefundDesk,
    session::{FileCartStore, Session},
    terminal::Terminal,
};
use tokio_util::sync::CancellationToken;

mod cart;
mod customers;
mod orders;
mod products;
mod refund;
mod refunds;
mod render;
mod sell;

#[derive(Debug, Parser)]
#[command(name = "till", about = "Till point-of-sale register", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    config: AppConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the store's products
    Products(products::ProductsArgs),

    /// List or register customers
    Customers(customers::CustomersCommand),

    /// Ring up a sale in one go
    Sell(sell::SellArgs),

    /// Work with the saved cart
    Cart(cart::CartCommand),

    /// List the cashier's orders, or show one
    Orders(orders::OrdersArgs),

    /// Refund items from an order
    Refund(refund::RefundArgs),

    /// List the cashier's refunds
    Refunds(refunds::RefundsArgs),
}

impl Cli {
    /// Loads `.env`, then parses flags and environment.
    pub(crate) fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    pub(crate) fn config(&self) -> &AppConfig {
        &self.config
    }

    pub(crate) async fn run(self, cancel: CancellationToken) -> Result<(), String> {
        let runtime = Runtime::new(self.config, cancel)?;

        match self.command {
            Commands::Products(args) => products::run(args, &runtime).await,
            Commands::Customers(command) => customers::run(command, &runtime).await,
            Commands::Sell(args) => sell::run(args, &runtime).await,
            Commands::Cart(command) => cart::run(command, &runtime).await,
            Commands::Orders(args) => orders::run(args, &runtime).await,
            Commands::Refund(args) => refund::run(args, &runtime).await,
            Commands::Refunds(args) => refunds::run(args, &runtime).await,
        }
    }
}

/// Everything a command needs to reach the backend.
#[derive(Debug)]
pub(crate) struct Runtime {
    config: AppConfig,
    services: AppContext,
    currency: &'static Currency,
    cancel: CancellationToken,
}

impl Runtime {
    fn new(config: AppConfig, cancel: CancellationToken) -> Result<Self, String> {
        let currency = config.currency().map_err(|error| error.to_string())?;
        let client = ApiClient::new(ApiConfig::from(&config.backend));

        Ok(Self {
            services: AppContext::from_client(&client),
            config,
            currency,
            cancel,
        })
    }

    pub(crate) fn config(&self) -> &AppConfig {
        &self.config
    }

    pub(crate) fn services(&self) -> &AppContext {
        &self.services
    }

    pub(crate) fn currency(&self) -> &'static Currency {
        self.currency
    }

    pub(crate) fn cancel(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn terminal(&self) -> Result<Terminal, String> {
        let context = self
            .config
            .terminal_context()
            .map_err(|error| error.to_string())?;
        let tax_rate = self.config.tax_rate().map_err(|error| error.to_string())?;

        Ok(Terminal::new(context, self.services.clone(), tax_rate))
    }

    pub(crate) fn refund_desk(&self) -> RefundDesk {
        RefundDesk::new(self.services.clone(), self.config.refund_policy())
    }

    /// Register session backed by the cart file.
    pub(crate) fn session(&self) -> Result<Session, String> {
        let store = FileCartStore::new(self.config.register.cart_path.clone());

        Ok(Session::start(
            Box::new(store),
            self.terminal()?,
            self.refund_desk(),
        ))
    }
}

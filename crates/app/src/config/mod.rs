//! Register configuration
//!
//! Every setting can come from a flag, the environment or a `.env` file.

use std::path::PathBuf;

use clap::Args;
use rust_decimal::Decimal;
use rusty_money::iso::{self, Currency};
use thiserror::Error;
use till::{
    cart::TaxRate,
    orders::{BranchId, CashierId, StoreId},
    returns::RefundPolicy,
};

use crate::{api::ApiConfig, terminal::TerminalContext};

pub mod observability;

pub use observability::{LogFormat, LoggingConfig};

/// Errors raised when a command needs a setting that is missing or invalid.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No store configured.
    #[error("no store configured; set TILL_STORE_ID or pass --store-id")]
    MissingStore,

    /// No cashier configured.
    #[error("no cashier configured; set TILL_CASHIER_ID or pass --cashier-id")]
    MissingCashier,

    /// The currency code is not an ISO 4217 code.
    #[error("unknown currency `{0}`")]
    UnknownCurrency(String),

    /// The tax rate is outside `0..=100`.
    #[error("tax percent must be between 0 and 100, got {0}")]
    InvalidTaxPercent(Decimal),
}

/// Backend connection settings.
#[derive(Debug, Clone, Args)]
pub struct BackendConfig {
    /// Backend base URL
    #[arg(long, env = "TILL_API_URL", default_value = "http://localhost:5000")]
    pub api_url: String,

    /// Bearer token for the backend
    #[arg(long, env = "TILL_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,
}

impl From<&BackendConfig> for ApiConfig {
    fn from(config: &BackendConfig) -> Self {
        Self {
            base_url: config.api_url.clone(),
            token: config.api_token.clone(),
        }
    }
}

/// Settings for this register.
#[derive(Debug, Clone, Args)]
pub struct RegisterConfig {
    /// Store the register sells for
    #[arg(long, env = "TILL_STORE_ID")]
    pub store_id: Option<StoreId>,

    /// Branch the register belongs to
    #[arg(long, env = "TILL_BRANCH_ID")]
    pub branch_id: Option<BranchId>,

    /// Cashier signed in at the register
    #[arg(long, env = "TILL_CASHIER_ID")]
    pub cashier_id: Option<CashierId>,

    /// File the open cart is saved to between runs
    #[arg(long, env = "TILL_CART_PATH", default_value = ".till/cart.json")]
    pub cart_path: PathBuf,

    /// ISO 4217 currency prices are shown in
    #[arg(long, env = "TILL_CURRENCY", default_value = "INR")]
    pub currency: String,

    /// Tax rate applied to the discounted subtotal, in percent
    #[arg(long, env = "TILL_TAX_PERCENT", default_value = "0")]
    pub tax_percent: Decimal,

    /// Let refunds use an operator-entered amount, capped at the order total
    #[arg(long, env = "TILL_REFUND_MANUAL_AMOUNT", default_value_t = false)]
    pub refund_manual_amount: bool,
}

/// Full application configuration.
#[derive(Debug, Clone, Args)]
pub struct AppConfig {
    /// Backend connection settings.
    #[command(flatten)]
    pub backend: BackendConfig,

    /// Register settings.
    #[command(flatten)]
    pub register: RegisterConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Configured store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingStore`] if none is set.
    pub fn store_id(&self) -> Result<StoreId, ConfigError> {
        self.register
            .store_id
            .clone()
            .ok_or(ConfigError::MissingStore)
    }

    /// Configured cashier.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCashier`] if none is set.
    pub fn cashier_id(&self) -> Result<CashierId, ConfigError> {
        self.register
            .cashier_id
            .clone()
            .ok_or(ConfigError::MissingCashier)
    }

    /// Where sales are rung up.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingStore`] if no store is set.
    pub fn terminal_context(&self) -> Result<TerminalContext, ConfigError> {
        Ok(TerminalContext {
            store_id: self.store_id()?,
            branch_id: self.register.branch_id.clone(),
            cashier_id: self.register.cashier_id.clone(),
        })
    }

    /// Display currency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownCurrency`] for codes rusty-money does not know.
    pub fn currency(&self) -> Result<&'static Currency, ConfigError> {
        let code = self.register.currency.trim().to_ascii_uppercase();

        iso::find(&code).ok_or_else(|| ConfigError::UnknownCurrency(self.register.currency.clone()))
    }

    /// Tax rate as a fraction.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTaxPercent`] outside `0..=100`.
    pub fn tax_rate(&self) -> Result<TaxRate, ConfigError> {
        let percent = self.register.tax_percent;

        if percent.is_sign_negative() || percent > Decimal::ONE_HUNDRED {
            return Err(ConfigError::InvalidTaxPercent(percent));
        }

        Ok(TaxRate::from(percent / Decimal::ONE_HUNDRED))
    }

    /// How refund amounts are decided.
    #[must_use]
    pub fn refund_policy(&self) -> RefundPolicy {
        RefundPolicy {
            allow_manual_amount: self.register.refund_manual_amount,
        }
    }
}

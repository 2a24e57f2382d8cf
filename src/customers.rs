//! Customers

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::ids::TypedId;

/// Customer Id
pub type CustomerId = TypedId<Customer>;

/// Sentinel used by the terminal for "no customer".
pub const WALK_IN: &str = "walk-in";

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Customer id
    pub id: CustomerId,

    /// Full name
    pub full_name: String,

    /// Email address
    #[serde(default)]
    pub email: String,

    /// Phone number
    #[serde(default)]
    pub phone: String,

    /// Postal address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Data for registering a new customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    /// Full name
    pub full_name: String,

    /// Email address
    pub email: String,

    /// Phone number
    pub phone: String,

    /// Postal address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Which customer, if any, a sale is for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum CustomerSelection {
    /// Anonymous walk-in sale.
    #[default]
    WalkIn,

    /// A registered customer.
    Customer(CustomerId),
}

impl CustomerSelection {
    /// The selected customer id, or `None` for walk-ins.
    #[must_use]
    pub fn customer_id(&self) -> Option<&CustomerId> {
        match self {
            Self::WalkIn => None,
            Self::Customer(id) => Some(id),
        }
    }

    /// Finds the selected customer in a directory.
    #[must_use]
    pub fn resolve<'a>(&self, directory: &'a [Customer]) -> Option<&'a Customer> {
        let id = self.customer_id()?;

        directory.iter().find(|customer| &customer.id == id)
    }
}

impl From<Option<CustomerId>> for CustomerSelection {
    fn from(value: Option<CustomerId>) -> Self {
        value.map_or(Self::WalkIn, Self::Customer)
    }
}

impl From<String> for CustomerSelection {
    fn from(value: String) -> Self {
        let trimmed = value.trim();

        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(WALK_IN) {
            Self::WalkIn
        } else {
            Self::Customer(CustomerId::new(trimmed))
        }
    }
}

impl From<CustomerSelection> for String {
    fn from(value: CustomerSelection) -> Self {
        value.to_string()
    }
}

impl FromStr for CustomerSelection {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

impl Display for CustomerSelection {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::WalkIn => f.write_str(WALK_IN),
            Self::Customer(id) => Display::fmt(id, f),
        }
    }
}

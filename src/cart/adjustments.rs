//! Adjustments
//!
//! Order-level discount and tax applied on top of the line subtotal.

use std::str::FromStr;

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::{AmountError, minor_from_decimal, percent_of_minor};

/// Discount text that could not be understood.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid discount `{0}` (expected an amount like 150 or a percentage like 10%)")]
pub struct InvalidDiscount(pub String);

/// Order-level discount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "DiscountRepr", try_from = "DiscountRepr")]
pub enum Discount {
    /// No discount
    #[default]
    None,

    /// Fixed amount off, in minor units
    Amount(i64),

    /// Percentage of the subtotal
    Percentage(Percentage),
}

impl Discount {
    /// Amount taken off `subtotal`, never more than the subtotal itself.
    ///
    /// # Errors
    ///
    /// Returns an [`AmountError`] if a percentage discount overflows.
    pub fn amount_off(&self, subtotal: i64) -> Result<i64, AmountError> {
        let cap = subtotal.max(0);

        let off = match self {
            Self::None => 0,
            Self::Amount(amount) => *amount,
            Self::Percentage(percent) => percent_of_minor(percent, cap)?,
        };

        Ok(off.clamp(0, cap))
    }

    /// Check whether this is [`Discount::None`] or a zero discount.
    #[must_use]
    pub fn is_none(&self) -> bool {
        match self {
            Self::None => true,
            Self::Amount(amount) => *amount == 0,
            Self::Percentage(percent) => (*percent) * Decimal::ONE == Decimal::ZERO,
        }
    }
}

impl FromStr for Discount {
    type Err = InvalidDiscount;

    /// Parses `150`, `12.5` (amounts in major units) or `10%`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let invalid = || InvalidDiscount(s.to_string());

        if text.is_empty() {
            return Ok(Self::None);
        }

        if let Some(points) = text.strip_suffix('%') {
            let points = Decimal::from_str(points.trim()).map_err(|_err| invalid())?;

            if points.is_sign_negative() {
                return Err(invalid());
            }

            return Ok(Self::Percentage(Percentage::from(points / Decimal::ONE_HUNDRED)));
        }

        let amount = Decimal::from_str(text).map_err(|_err| invalid())?;

        if amount.is_sign_negative() {
            return Err(invalid());
        }

        minor_from_decimal(amount)
            .map(Self::Amount)
            .map_err(|_err| invalid())
    }
}

/// Persisted form of a [`Discount`].
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
enum DiscountRepr {
    None,
    Amount(i64),
    Percentage(Decimal),
}

impl From<Discount> for DiscountRepr {
    fn from(discount: Discount) -> Self {
        match discount {
            Discount::None => Self::None,
            Discount::Amount(amount) => Self::Amount(amount),
            Discount::Percentage(percent) => Self::Percentage(percent * Decimal::ONE),
        }
    }
}

impl TryFrom<DiscountRepr> for Discount {
    type Error = InvalidDiscount;

    fn try_from(repr: DiscountRepr) -> Result<Self, Self::Error> {
        match repr {
            DiscountRepr::None => Ok(Self::None),
            DiscountRepr::Amount(amount) if amount >= 0 => Ok(Self::Amount(amount)),
            DiscountRepr::Percentage(fraction) if !fraction.is_sign_negative() => {
                Ok(Self::Percentage(Percentage::from(fraction)))
            }
            DiscountRepr::Amount(amount) => Err(InvalidDiscount(amount.to_string())),
            DiscountRepr::Percentage(fraction) => Err(InvalidDiscount(fraction.to_string())),
        }
    }
}

/// Tax rate applied to the discounted subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "Decimal", from = "Decimal")]
pub struct TaxRate(Percentage);

impl TaxRate {
    /// A rate of zero.
    #[must_use]
    pub fn zero() -> Self {
        Self(Percentage::from(Decimal::ZERO))
    }

    /// Tax owed on `taxable`, rounded half away from zero.
    ///
    /// # Errors
    ///
    /// Returns an [`AmountError`] if the calculation overflows.
    pub fn on(&self, taxable: i64) -> Result<i64, AmountError> {
        percent_of_minor(&self.0, taxable)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<Percentage> for TaxRate {
    fn from(percent: Percentage) -> Self {
        Self(percent)
    }
}

impl From<Decimal> for TaxRate {
    fn from(fraction: Decimal) -> Self {
        Self(Percentage::from(fraction))
    }
}

impl From<TaxRate> for Decimal {
    fn from(rate: TaxRate) -> Self {
        rate.0 * Decimal::ONE
    }
}

/// Discount and tax applied when totalling lines.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Adjustments {
    /// Tax rate
    pub tax_rate: TaxRate,

    /// Discount
    pub discount: Discount,
}

//! Money
//!
//! Amounts are carried as `i64` hundredths of the major unit ("minor units"). The backend speaks
//! decimal major units, so conversion happens at the serde boundary through [`major`] and
//! [`major_opt`]; display goes through `rusty_money`.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use thiserror::Error;

/// Number of decimal places used by minor units.
pub const MINOR_SCALE: u32 = 2;

/// Currency used when none is configured.
pub const DEFAULT_CURRENCY: &Currency = iso::INR;

/// Errors that can occur converting between decimal amounts and minor units.
#[derive(Debug, Error, PartialEq)]
pub enum AmountError {
    /// A decimal amount does not fit in minor units.
    #[error("amount {0} cannot be represented in minor units")]
    OutOfRange(Decimal),

    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,
}

/// Converts a decimal major-unit amount into minor units, rounding half away from zero.
///
/// # Errors
///
/// Returns [`AmountError::OutOfRange`] if the amount overflows an `i64` of minor units.
pub fn minor_from_decimal(amount: Decimal) -> Result<i64, AmountError> {
    amount
        .round_dp_with_strategy(MINOR_SCALE, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|minor| minor.to_i64())
        .ok_or(AmountError::OutOfRange(amount))
}

/// Converts minor units back into a decimal major-unit amount.
#[must_use]
pub fn decimal_from_minor(minor: i64) -> Decimal {
    Decimal::new(minor, MINOR_SCALE)
}

/// Calculate the share of a minor unit amount given by a percentage, rounded half away from zero.
///
/// # Errors
///
/// Returns [`AmountError::PercentConversion`] if the calculation overflows.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, AmountError> {
    let minor = Decimal::from_i64(minor).ok_or(AmountError::PercentConversion)?;

    ((*percent) * Decimal::ONE) // decimal_percentage keeps its Decimal private
        .checked_mul(minor)
        .ok_or(AmountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(AmountError::PercentConversion)
}

/// Unit price multiplied by a quantity, saturating rather than wrapping.
#[must_use]
pub fn extend(unit_price: i64, quantity: u32) -> i64 {
    unit_price.saturating_mul(i64::from(quantity))
}

/// Wraps a minor unit amount for display in the given currency.
#[must_use]
pub fn display(minor: i64, currency: &'static Currency) -> Money<'static, Currency> {
    Money::from_decimal(decimal_from_minor(minor), currency)
}

/// Serde adapter for minor-unit fields carried as decimal numbers on the wire.
pub mod major {
    use rust_decimal::{Decimal, prelude::ToPrimitive};
    use serde::{Deserialize, Deserializer, Serializer, de, ser};

    use super::{decimal_from_minor, minor_from_decimal};

    /// Serializes minor units as a JSON number in major units.
    ///
    /// # Errors
    ///
    /// Returns a serializer error if the amount has no `f64` representation.
    pub fn serialize<S: Serializer>(minor: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        let major = decimal_from_minor(*minor)
            .to_f64()
            .ok_or_else(|| ser::Error::custom(format!("amount {minor} is not representable")))?;

        serializer.serialize_f64(major)
    }

    /// Deserializes a JSON number or numeric string in major units into minor units.
    ///
    /// # Errors
    ///
    /// Returns a deserializer error if the value is not numeric or overflows.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;

        minor_from_decimal(amount).map_err(de::Error::custom)
    }
}

/// Serde adapter for optional minor-unit fields.
pub mod major_opt {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serializer, de};

    use super::minor_from_decimal;

    /// Serializes optional minor units, writing `null` for `None`.
    ///
    /// # Errors
    ///
    /// Returns a serializer error if the amount has no `f64` representation.
    pub fn serialize<S: Serializer>(minor: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error> {
        match minor {
            Some(minor) => super::major::serialize(minor, serializer),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes an optional major-unit amount.
    ///
    /// # Errors
    ///
    /// Returns a deserializer error if the value is present but not numeric.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<i64>, D::Error> {
        <Option<Decimal> as Deserialize>::deserialize(deserializer)?
            .map(minor_from_decimal)
            .transpose()
            .map_err(de::Error::custom)
    }
}

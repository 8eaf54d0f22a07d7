//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are stored as decimal strings and never pass through floating
//! point, so cart totals add up to the cent.

use core::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    /// The input is not a decimal number.
    #[error("price must be a real number")]
    NotANumber,
    /// The input is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The input is above [`Price::MAX_DOLLARS`].
    #[error("price cannot exceed {} dollars", Price::MAX_DOLLARS)]
    TooLarge,
}

/// A non-negative price in US dollars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// A price of zero dollars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest accepted unit price, in dollars.
    pub const MAX_DOLLARS: i64 = 1_000_000_000_000;

    /// Parse a price from user or database input.
    ///
    /// Accepts anything `Decimal` accepts after trimming whitespace
    /// (`"12"`, `"12.5"`, `"0.99"`).
    ///
    /// # Errors
    ///
    /// Returns `PriceError::NotANumber` for non-numeric input,
    /// `PriceError::Negative` for values below zero and
    /// `PriceError::TooLarge` above [`Price::MAX_DOLLARS`].
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let amount = Decimal::from_str(s.trim()).map_err(|_| PriceError::NotANumber)?;
        Self::try_from(amount)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Price multiplied by a whole quantity, `None` on overflow.
    #[must_use]
    pub fn checked_times(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(Decimal::from(quantity)).map(Self)
    }

    /// Sum of two amounts, `None` on overflow.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Sum of many amounts, `None` if any partial sum overflows.
    #[must_use]
    pub fn checked_sum<I: IntoIterator<Item = Self>>(amounts: I) -> Option<Self> {
        amounts
            .into_iter()
            .try_fold(Self::ZERO, Self::checked_add)
    }

    /// Format as US dollars with thousands separators, e.g. `$1,234.50`.
    #[must_use]
    pub fn usd(self) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let text = format!("{rounded:.2}");
        let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, digit) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }

        format!("${grouped}.{cents}")
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        if amount > Decimal::from(Self::MAX_DOLLARS) {
            return Err(PriceError::TooLarge);
        }
        Ok(Self(amount))
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//! Cart and order line quantities.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Quantity`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuantityError {
    /// The input is not an integer.
    #[error("quantity must be a whole number")]
    NotANumber,
    /// The input is zero or negative.
    #[error("quantity must be at least 1")]
    NotPositive,
    /// The input is above [`Quantity::MAX`].
    #[error("quantity cannot exceed {}", Quantity::MAX)]
    TooLarge,
}

/// A line quantity between 1 and [`Quantity::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Quantity(u32);

impl Quantity {
    /// Largest quantity a single cart or order line may hold.
    pub const MAX: u32 = 1_000_000;

    /// Create a quantity, rejecting zero and anything above [`Self::MAX`].
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::NotPositive` when `n` is zero and
    /// `QuantityError::TooLarge` when it exceeds the cap.
    pub const fn new(n: u32) -> Result<Self, QuantityError> {
        if n == 0 {
            return Err(QuantityError::NotPositive);
        }
        if n > Self::MAX {
            return Err(QuantityError::TooLarge);
        }
        Ok(Self(n))
    }

    /// Get the underlying count.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Sum of two quantities, `None` when it would exceed [`Self::MAX`].
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match Self::new(self.0 + other.0) {
            Ok(sum) => Some(sum),
            Err(_) => None,
        }
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(n: i64) -> Result<Self, Self::Error> {
        if n <= 0 {
            return Err(QuantityError::NotPositive);
        }
        let n = u32::try_from(n).map_err(|_| QuantityError::TooLarge)?;
        Self::new(n)
    }
}

impl From<Quantity> for i64 {
    fn from(q: Quantity) -> Self {
        Self::from(q.0)
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n = s
            .trim()
            .parse::<i64>()
            .map_err(|_| QuantityError::NotANumber)?;
        Self::try_from(n)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positive() {
        assert_eq!("3".parse::<Quantity>().unwrap().get(), 3);
        assert_eq!(" 12 ".parse::<Quantity>().unwrap().get(), 12);
    }

    #[test]
    fn test_parse_rejects_zero_negative_and_text() {
        assert_eq!("0".parse::<Quantity>(), Err(QuantityError::NotPositive));
        assert_eq!("-2".parse::<Quantity>(), Err(QuantityError::NotPositive));
        assert_eq!("1.5".parse::<Quantity>(), Err(QuantityError::NotANumber));
        assert_eq!("".parse::<Quantity>(), Err(QuantityError::NotANumber));
    }

    #[test]
    fn test_rejects_above_cap() {
        assert_eq!("1000000".parse::<Quantity>().unwrap().get(), Quantity::MAX);
        assert_eq!("1000001".parse::<Quantity>(), Err(QuantityError::TooLarge));
        assert_eq!(Quantity::new(u32::MAX), Err(QuantityError::TooLarge));
        assert_eq!(
            Quantity::try_from(i64::from(u32::MAX) + 1),
            Err(QuantityError::TooLarge)
        );
    }

    #[test]
    fn test_checked_add() {
        let a = Quantity::new(2).unwrap();
        let b = Quantity::new(5).unwrap();
        assert_eq!(a.checked_add(b).unwrap().get(), 7);

        let max = Quantity::new(Quantity::MAX).unwrap();
        assert_eq!(max.checked_add(a), None);
        let half = Quantity::new(Quantity::MAX / 2).unwrap();
        assert_eq!(half.checked_add(half).unwrap().get(), Quantity::MAX);
    }
}

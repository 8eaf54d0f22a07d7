//! Shopping cart.

use shopfront_core::{Price, Quantity};

use super::Item;

/// One cart entry joined with its item.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub item: Item,
    pub quantity: Quantity,
}

impl CartLine {
    /// Item price times quantity, `None` on decimal overflow.
    #[must_use]
    pub fn line_total(&self) -> Option<Price> {
        self.item.price.checked_times(self.quantity.get())
    }
}

/// All cart entries of one user.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Sum of all line totals, `None` on decimal overflow.
    #[must_use]
    pub fn total(&self) -> Option<Price> {
        self.lines
            .iter()
            .map(CartLine::line_total)
            .try_fold(Price::ZERO, |acc, line| acc.checked_add(line?))
    }

    /// Number of units across all lines.
    #[must_use]
    pub fn unit_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity.get())).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use shopfront_core::ItemId;

    fn line(id: i64, price: &str, qty: u32) -> CartLine {
        CartLine {
            item: Item {
                id: ItemId::new(id),
                title: format!("item {id}"),
                price: Price::parse(price).unwrap(),
                description: String::new(),
                filename: String::new(),
            },
            quantity: Quantity::new(qty).unwrap(),
        }
    }

    #[test]
    fn test_totals_use_decimal_arithmetic() {
        let cart = Cart {
            lines: vec![line(1, "0.10", 3), line(2, "19.99", 2)],
        };

        assert_eq!(cart.lines[0].line_total().unwrap().to_string(), "0.30");
        assert_eq!(cart.total().unwrap().usd(), "$40.28");
        assert_eq!(cart.unit_count(), 5);
    }

    #[test]
    fn test_empty_cart() {
        let cart = Cart::default();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Some(Price::ZERO));
    }

    #[test]
    fn test_largest_accepted_lines_still_total() {
        let max_price = Price::MAX_DOLLARS.to_string();
        let cart = Cart {
            lines: (1..=50)
                .map(|id| line(id, &max_price, Quantity::MAX))
                .collect(),
        };

        assert_eq!(
            cart.total().unwrap().usd(),
            "$50,000,000,000,000,000,000.00"
        );
    }
}

//! Basket and order totals.
//!
//! Totals are derived on every read and never stored.

use serde::{Deserialize, Serialize};

/// One priced line of an order: how many units of an offer, at what unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketLine {
    pub quantity: i64,
    pub price: i64,
}

/// Sum of `quantity * price` over all lines, saturating at `i64::MAX`.
#[must_use]
pub fn total_sum<'a, I>(lines: I) -> i64
where
    I: IntoIterator<Item = &'a BasketLine>,
{
    lines.into_iter().fold(0_i64, |acc, line| {
        acc.saturating_add(line.quantity.saturating_mul(line.price))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_basket_totals_zero() {
        let lines: [BasketLine; 0] = [];
        assert_eq!(total_sum(&lines), 0);
    }

    #[test]
    fn totals_quantity_times_price() {
        let lines = [
            BasketLine {
                quantity: 2,
                price: 100,
            },
            BasketLine {
                quantity: 3,
                price: 50,
            },
        ];
        assert_eq!(total_sum(&lines), 350);
    }

    #[test]
    fn huge_totals_saturate() {
        let lines = [
            BasketLine {
                quantity: i64::MAX,
                price: 2,
            },
            BasketLine {
                quantity: 1,
                price: 1,
            },
        ];
        assert_eq!(total_sum(&lines), i64::MAX);
    }
}

//! Cross-step checks on values the storefront renders
//!
//! These functions never touch the UI. They take amounts already read from a
//! screen and compare them with what those amounts imply.

use serde::{Deserialize, Serialize};

use crate::money::MoneyAmount;
use crate::types::Direction;

/// Item subtotal and tax as rendered on the checkout overview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub item_subtotal: MoneyAmount,
    pub tax: MoneyAmount,
}

impl OrderSummary {
    pub fn expected_total(&self) -> MoneyAmount {
        expected_total(self.item_subtotal, self.tax)
    }
}

/// Which derived value disagreed with the rendered one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedValue {
    Total,
    ItemSubtotal,
}

impl std::fmt::Display for DerivedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DerivedValue::Total => write!(f, "total"),
            DerivedValue::ItemSubtotal => write!(f, "item subtotal"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalMismatch {
    pub value: DerivedValue,
    pub expected: MoneyAmount,
    pub rendered: MoneyAmount,
}

impl std::fmt::Display for TotalMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} rendered as {} but components add up to {}",
            self.value, self.rendered, self.expected
        )
    }
}

/// `round2(item_subtotal + tax)`. Amounts are already in cents, so the sum is exact.
pub fn expected_total(item_subtotal: MoneyAmount, tax: MoneyAmount) -> MoneyAmount {
    item_subtotal + tax
}

pub fn verify_total(summary: &OrderSummary, rendered: MoneyAmount) -> Result<(), TotalMismatch> {
    let expected = summary.expected_total();
    if expected == rendered {
        Ok(())
    } else {
        Err(TotalMismatch {
            value: DerivedValue::Total,
            expected,
            rendered,
        })
    }
}

pub fn expected_subtotal(prices: &[MoneyAmount]) -> MoneyAmount {
    prices.iter().sum()
}

pub fn verify_subtotal(prices: &[MoneyAmount], rendered: MoneyAmount) -> Result<(), TotalMismatch> {
    let expected = expected_subtotal(prices);
    if expected == rendered {
        Ok(())
    } else {
        Err(TotalMismatch {
            value: DerivedValue::ItemSubtotal,
            expected,
            rendered,
        })
    }
}

/// Non-decreasing for `Ascending`, non-increasing for `Descending`
pub fn is_ordered<T: PartialOrd>(values: &[T], direction: Direction) -> bool {
    values.windows(2).all(|pair| match direction {
        Direction::Ascending => pair[0] <= pair[1],
        Direction::Descending => pair[0] >= pair[1],
    })
}

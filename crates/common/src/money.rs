//! Two-decimal currency amounts
//!
//! Amounts are held as integer cents. Rendered text such as `Item total: $29.99`
//! is parsed by stripping the label and currency symbol, then rounding the
//! decimal text half-up to two places. No floating point is involved, so sums
//! of parsed amounts are exact.

use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A currency amount with two-decimal precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoneyAmount {
    cents: i64,
}

impl MoneyAmount {
    pub const ZERO: MoneyAmount = MoneyAmount { cents: 0 };

    pub const fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    pub const fn cents(&self) -> i64 {
        self.cents
    }

    /// Parse rendered currency text.
    ///
    /// Accepts bare numbers (`29.99`), symbol-prefixed text (`$29.99`) and
    /// labelled text (`Tax: $2.40`). Anything after the final `:` is taken as
    /// the amount.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || Error::InvalidAmount {
            text: text.to_string(),
        };

        let value = text.rsplit(':').next().unwrap_or(text);
        let value: String = value
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '$' && *c != ',')
            .collect();

        let (negative, unsigned) = match value.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, value.as_str()),
        };
        let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if whole.is_empty() || !is_digits(whole) || !is_digits(fraction) {
            return Err(invalid());
        }
        let whole: i64 = whole.parse().map_err(|_| invalid())?;

        let digits: Vec<i64> = fraction
            .bytes()
            .map(|b| i64::from(b - b'0'))
            .collect();
        let tenths = digits.first().copied().unwrap_or(0);
        let hundredths = digits.get(1).copied().unwrap_or(0);
        let round_up = digits.get(2).map(|d| *d >= 5).unwrap_or(false);

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(tenths * 10 + hundredths + i64::from(round_up)))
            .ok_or_else(invalid)?;

        Ok(Self {
            cents: if negative { -cents } else { cents },
        })
    }
}

fn is_digits(text: &str) -> bool {
    text.bytes().all(|b| b.is_ascii_digit())
}

impl FromStr for MoneyAmount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Add for MoneyAmount {
    type Output = MoneyAmount;

    fn add(self, rhs: MoneyAmount) -> MoneyAmount {
        MoneyAmount::from_cents(self.cents + rhs.cents)
    }
}

impl Sum for MoneyAmount {
    fn sum<I: Iterator<Item = MoneyAmount>>(iter: I) -> Self {
        iter.fold(MoneyAmount::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a MoneyAmount> for MoneyAmount {
    fn sum<I: Iterator<Item = &'a MoneyAmount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl fmt::Display for MoneyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.cents < 0 { "-" } else { "" };
        let abs = self.cents.unsigned_abs();
        write!(f, "{}${}.{:02}", sign, abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("$29.99", 2999 ; "symbol prefixed")]
    #[test_case("Item total: $29.99", 2999 ; "item total label")]
    #[test_case("Tax: $2.40", 240 ; "tax label")]
    #[test_case("Total: $32.39", 3239 ; "total label")]
    #[test_case("7.99", 799 ; "bare number")]
    #[test_case("$15", 1500 ; "whole dollars")]
    #[test_case("$9.5", 950 ; "single decimal")]
    #[test_case("2.3992", 240 ; "extra precision rounds")]
    #[test_case("0.125", 13 ; "half rounds up")]
    #[test_case("0.124", 12 ; "below half rounds down")]
    #[test_case(" $ 1,049.00 ", 104900 ; "whitespace and grouping")]
    fn parses_rendered_amounts(text: &str, cents: i64) {
        assert_eq!(MoneyAmount::parse(text).unwrap().cents(), cents);
    }

    #[test_case("" ; "empty")]
    #[test_case("Total: $" ; "label without amount")]
    #[test_case("$abc" ; "letters")]
    #[test_case("1.2.3" ; "two points")]
    fn rejects_non_amounts(text: &str) {
        assert!(matches!(
            MoneyAmount::parse(text),
            Err(Error::InvalidAmount { .. })
        ));
    }

    #[test]
    fn display_uses_two_decimals() {
        assert_eq!(MoneyAmount::from_cents(3239).to_string(), "$32.39");
        assert_eq!(MoneyAmount::from_cents(5).to_string(), "$0.05");
        assert_eq!(MoneyAmount::from_cents(-120).to_string(), "-$1.20");
    }

    #[test]
    fn sums_are_exact() {
        let prices = [
            MoneyAmount::parse("$29.99").unwrap(),
            MoneyAmount::parse("$49.99").unwrap(),
            MoneyAmount::parse("$0.01").unwrap(),
        ];
        let total: MoneyAmount = prices.iter().sum();
        assert_eq!(total, MoneyAmount::from_cents(7999));
    }
}

//! Display formatting for amounts of a given currency.

use crate::model::Currency;
use std::fmt;
use std::fmt::Formatter;

/// An amount together with its currency, for display only. Arithmetic is done on plain `f64`.
///
/// ```
/// # use paytrack::model::{Currency, Money};
/// assert_eq!(Money::new(-60000.0, Currency::Eur).to_string(), "-€ 60,000.00");
/// assert_eq!(Money::new(12.5, Currency::Try).to_string(), "₺ 12.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Money {
    value: f64,
    currency: Currency,
}

impl Money {
    pub const fn new(value: f64, currency: Currency) -> Self {
        Self { value, currency }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let sign = if self.value < 0.0 { "-" } else { "" };
        let num = format_num::format_num!(",.2", self.value.abs());
        write!(f, "{sign}{} {num}", self.currency.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_positive() {
        assert_eq!(Money::new(1234.5, Currency::Usd).to_string(), "$ 1,234.50");
    }

    #[test]
    fn test_display_zero() {
        assert_eq!(Money::new(0.0, Currency::Gbp).to_string(), "£ 0.00");
    }

    #[test]
    fn test_display_negative() {
        assert_eq!(Money::new(-5.0, Currency::Eur).to_string(), "-€ 5.00");
    }
}

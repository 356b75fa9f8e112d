//! Currency conversion through the anchor currency.

use crate::model::Currency;
use crate::rates::{RateTable, ANCHOR};
use crate::{Error, ErrorType, Result};

/// Converts `amount` from `from` into `to` using `rates`.
///
/// The amount is first expressed in anchor units (`amount * rates[from]`) and then divided by
/// `rates[to]`. Converting a currency into itself returns `amount` untouched, even when the
/// currency is absent from `rates`.
///
/// # Errors
/// Returns an `ErrorType::MissingRate` error if a rate that is needed is absent from `rates`, or is
/// not a positive finite number.
pub fn convert(amount: f64, from: Currency, to: Currency, rates: &RateTable) -> Result<f64> {
    if from == to {
        return Ok(amount);
    }
    let anchored = if from == ANCHOR {
        amount
    } else {
        amount * rate(rates, from)?
    };
    if to == ANCHOR {
        Ok(anchored)
    } else {
        Ok(anchored / rate(rates, to)?)
    }
}

fn rate(rates: &RateTable, currency: Currency) -> Result<f64> {
    match rates.get(currency) {
        Some(rate) if rate.is_finite() && rate > 0.0 => Ok(rate),
        Some(rate) => Err(Error::msg(
            ErrorType::MissingRate,
            format!("The exchange rate for {currency} is unusable: {rate}"),
        )),
        None => Err(Error::msg(
            ErrorType::MissingRate,
            format!("No exchange rate for {currency}"),
        )),
    }
}

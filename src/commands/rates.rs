use crate::commands::Out;
use crate::rates::{RateOrigin, RateProvider, RateTable, ANCHOR};
use crate::{Config, Mode, Result};
use serde::Serialize;
use std::fmt::Write;

/// The rates in use and where they came from.
#[derive(Debug, Clone, Serialize)]
pub struct RatesReport {
    pub origin: RateOrigin,
    pub rates: RateTable,
}

/// Shows the current exchange rates. This never fails because of the rate source: when it cannot
/// be reached, the fallback table is shown.
pub async fn rates(config: &Config, mode: Mode) -> Result<Out<RatesReport>> {
    let provider = RateProvider::from_config(config, mode)?;
    let (rates, origin) = provider.get_rates_with_origin().await;

    let mut message = format!("Exchange rates in {ANCHOR} ({origin})");
    for (currency, rate) in rates.iter().filter(|(c, _)| *c != ANCHOR) {
        let _ = write!(message, "\n  1 {currency} = {rate:.4} {ANCHOR}");
    }
    Ok(Out::new(message, RatesReport { origin, rates }))
}

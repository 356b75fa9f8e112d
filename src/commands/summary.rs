use crate::commands::{open_store, Out};
use crate::model::{Currency, Money};
use crate::rates::RateProvider;
use crate::summary::{Summary, Totals};
use crate::{Config, Mode, Result};
use std::fmt::Write;

/// Computes a fresh summary of all payments with the current exchange rates.
///
/// # Errors
///
/// - Returns an `Auth` error if nobody is logged in.
/// - Returns a `MissingRate` error if a payment is in a currency that has no rate.
pub async fn summary(config: &Config, mode: Mode) -> Result<Out<Summary>> {
    let store = open_store(config, mode).await?;
    let rates = RateProvider::from_config(config, mode)?.get_rates().await;
    let summary = store.summarize(&rates)?;

    let reporting = summary.reporting_currency;
    let mut message = format!("Summary of {} payments", store.payments().len());
    for (currency, totals) in &summary.by_currency {
        let _ = write!(message, "\n  {currency}: {}", line(totals, *currency));
    }
    let _ = write!(
        message,
        "\n  Total in {reporting}: {}",
        line(&summary.total_in_reporting_currency, reporting)
    );
    Ok(Out::new(message, summary))
}

fn line(totals: &Totals, currency: Currency) -> String {
    format!(
        "total {}, paid {}, remaining {}",
        Money::new(totals.total_debt, currency),
        Money::new(totals.paid, currency),
        Money::new(totals.remaining, currency),
    )
}

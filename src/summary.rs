//! Aggregation of payment amounts per currency and in a single reporting currency.

use crate::convert::convert;
use crate::error::IntoResult;
use crate::model::{Currency, PaymentRecord};
use crate::rates::RateTable;
use crate::{ErrorType, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::AddAssign;

/// Sums of the five numeric fields of a set of payments.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Totals {
    pub previous_debt: f64,
    pub current_debt: f64,
    pub total_debt: f64,
    pub paid: f64,
    pub remaining: f64,
}

impl Totals {
    fn from_amounts([previous_debt, current_debt, total_debt, paid, remaining]: [f64; 5]) -> Self {
        Self {
            previous_debt,
            current_debt,
            total_debt,
            paid,
            remaining,
        }
    }

    fn amounts(&self) -> [f64; 5] {
        [
            self.previous_debt,
            self.current_debt,
            self.total_debt,
            self.paid,
            self.remaining,
        ]
    }
}

impl AddAssign for Totals {
    fn add_assign(&mut self, rhs: Self) {
        self.previous_debt += rhs.previous_debt;
        self.current_debt += rhs.current_debt;
        self.total_debt += rhs.total_debt;
        self.paid += rhs.paid;
        self.remaining += rhs.remaining;
    }
}

/// The aggregated view of a payment collection. This is also the `summary` snapshot that is
/// written with every save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Every canonical currency is present, with zero totals when no payment uses it.
    #[serde(default)]
    pub by_currency: BTreeMap<Currency, Totals>,
    /// Older documents call this `totalInEUR`.
    #[serde(default, alias = "totalInEUR")]
    pub total_in_reporting_currency: Totals,
    #[serde(default = "default_reporting_currency")]
    pub reporting_currency: Currency,
}

fn default_reporting_currency() -> Currency {
    Currency::Eur
}

impl Summary {
    /// The summary of an empty collection.
    pub fn empty(reporting_currency: Currency) -> Self {
        Self {
            by_currency: Currency::ALL
                .into_iter()
                .map(|c| (c, Totals::default()))
                .collect(),
            total_in_reporting_currency: Totals::default(),
            reporting_currency,
        }
    }

    pub fn for_currency(&self, currency: Currency) -> Totals {
        self.by_currency.get(&currency).copied().unwrap_or_default()
    }
}

/// Computes per-currency subtotals and the grand total converted into `reporting`.
///
/// An amount of zero contributes zero without consulting `rates`, so a currency whose records
/// carry only zero amounts does not need a rate.
///
/// # Errors
/// Returns an `ErrorType::MissingRate` error when a non-zero amount is in a currency that has no
/// usable rate, or when `reporting` itself has none.
pub fn summarize(
    payments: &[PaymentRecord],
    rates: &RateTable,
    reporting: Currency,
) -> Result<Summary> {
    let mut summary = Summary::empty(reporting);
    for payment in payments {
        let currency = payment.currency();
        let amounts = payment.amounts();
        *summary.by_currency.entry(currency).or_default() += Totals::from_amounts(amounts);

        let mut converted = [0.0; 5];
        for (out, amount) in converted.iter_mut().zip(amounts) {
            if amount != 0.0 {
                *out = convert(amount, currency, reporting, rates)
                    .map_err(anyhow::Error::from)
                    .with_context(|| format!("Unable to summarize payment {}", payment.id()))
                    .pub_result(ErrorType::MissingRate)?;
            }
        }
        summary.total_in_reporting_currency += Totals::from_amounts(converted);
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewPayment;

    /// Converts each field of `totals` from `from` into `to`.
    fn convert_totals(
        totals: Totals,
        from: Currency,
        to: Currency,
        rates: &RateTable,
    ) -> Result<Totals> {
        let mut converted = [0.0; 5];
        for (out, amount) in converted.iter_mut().zip(totals.amounts()) {
            *out = convert(amount, from, to, rates)?;
        }
        Ok(Totals::from_amounts(converted))
    }

    fn rates() -> RateTable {
        RateTable::new([
            (Currency::Try, 1.0),
            (Currency::Usd, 43.1),
            (Currency::Eur, 50.0),
            (Currency::Gbp, 57.8),
        ])
    }

    fn payment(id: u64, currency: Currency, previous: f64, current: f64, paid: f64) -> PaymentRecord {
        NewPayment {
            item_name: format!("Item {id}"),
            currency,
            previous_debt: previous,
            current_debt: current,
            paid,
            ..NewPayment::default()
        }
        .into_record(id)
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "Expected {a} to be close to {b}");
    }

    #[test]
    fn test_empty_collection() {
        let summary = summarize(&[], &rates(), Currency::Eur).unwrap();
        assert_eq!(summary.by_currency.len(), Currency::ALL.len());
        for currency in Currency::ALL {
            assert_eq!(summary.for_currency(currency), Totals::default());
        }
        assert_eq!(summary.total_in_reporting_currency, Totals::default());
        assert_eq!(summary.reporting_currency, Currency::Eur);
    }

    #[test]
    fn test_by_currency() {
        let payments = vec![
            payment(1, Currency::Try, 100.0, 50.0, 25.0),
            payment(2, Currency::Try, 10.0, 0.0, 10.0),
            payment(3, Currency::Usd, 0.0, 200.0, 0.0),
        ];
        let summary = summarize(&payments, &rates(), Currency::Eur).unwrap();
        let tl = summary.for_currency(Currency::Try);
        assert_eq!(tl.previous_debt, 110.0);
        assert_eq!(tl.total_debt, 160.0);
        assert_eq!(tl.remaining, 125.0);
        assert_eq!(summary.for_currency(Currency::Usd).current_debt, 200.0);
        assert_eq!(summary.for_currency(Currency::Gbp), Totals::default());
    }

    #[test]
    fn test_reporting_total_matches_converted_subtotals() {
        let payments = vec![
            payment(1, Currency::Try, 1000.0, 250.0, 300.0),
            payment(2, Currency::Usd, 12.5, 80.0, 100.0),
            payment(3, Currency::Eur, 0.0, 60_000.0, 10.0),
            payment(4, Currency::Gbp, 33.3, 0.0, 0.0),
            payment(5, Currency::Usd, 1.0, 2.0, 3.0),
        ];
        let rates = rates();
        for reporting in Currency::ALL {
            let summary = summarize(&payments, &rates, reporting).unwrap();
            let mut expected = Totals::default();
            for (currency, totals) in &summary.by_currency {
                expected += convert_totals(*totals, *currency, reporting, &rates).unwrap();
            }
            let actual = summary.total_in_reporting_currency;
            assert_close(expected.total_debt, actual.total_debt);
            assert_close(expected.paid, actual.paid);
            assert_close(expected.remaining, actual.remaining);
        }
    }

    #[test]
    fn test_zero_amounts_need_no_rate() {
        let rates = RateTable::new([(Currency::Try, 1.0), (Currency::Eur, 50.0)]);
        let payments = vec![
            payment(1, Currency::Gbp, 0.0, 0.0, 0.0),
            payment(2, Currency::Try, 500.0, 0.0, 0.0),
        ];
        let summary = summarize(&payments, &rates, Currency::Eur).unwrap();
        assert_close(summary.total_in_reporting_currency.total_debt, 10.0);
    }

    #[test]
    fn test_missing_rate() {
        let rates = RateTable::new([(Currency::Try, 1.0), (Currency::Eur, 50.0)]);
        let payments = vec![payment(7, Currency::Usd, 10.0, 0.0, 0.0)];
        let err = summarize(&payments, &rates, Currency::Eur).unwrap_err();
        assert!(err.is(ErrorType::MissingRate));
        assert!(err.to_string().contains("payment 7"));
    }

    #[test]
    fn test_reads_legacy_total_field() {
        let json = r#"{
            "byCurrency": {"TL": {"totalDebt": 5}},
            "totalInEUR": {"previousDebt": 1, "currentDebt": 2, "totalDebt": 3, "paid": 1, "remaining": 2}
        }"#;
        let summary: Summary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.reporting_currency, Currency::Eur);
        assert_eq!(summary.total_in_reporting_currency.total_debt, 3.0);
        assert_eq!(summary.for_currency(Currency::Try).total_debt, 5.0);
    }
}

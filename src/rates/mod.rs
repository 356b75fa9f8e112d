//! Exchange rates: the [`RateTable`] type and the [`RateProvider`] that obtains one.
//!
//! A `RateTable` holds, for each currency, how many units of the anchor currency (TRY) one unit
//! of that currency is worth. The provider caches a fetched table on disk for a configurable
//! duration and never fails: when the rate source cannot be reached it logs a warning and hands
//! out a fixed fallback table.

mod frankfurter;
mod test_source;

use crate::error::{IntoResult, Res};
use crate::model::Currency;
use crate::{utils, Config, ErrorType, Mode, Result};
use anyhow::{bail, Context};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

pub(crate) use frankfurter::Frankfurter;
pub(crate) use test_source::TestRateSource;

/// The currency in which all rates are expressed. `rates[ANCHOR]` is always `1.0`.
pub const ANCHOR: Currency = Currency::Try;

/// The base currency requested from the rate source.
const BASE: Currency = Currency::Eur;

/// Used whenever fresh rates cannot be obtained.
const FALLBACK: [(Currency, f64); 4] = [
    (Currency::Try, 1.0),
    (Currency::Usd, 43.1),
    (Currency::Eur, 50.0),
    (Currency::Gbp, 57.8),
];

/// Anchor units per one unit of each currency.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateTable(BTreeMap<Currency, f64>);

impl RateTable {
    pub fn new(rates: impl IntoIterator<Item = (Currency, f64)>) -> Self {
        Self(rates.into_iter().collect())
    }

    /// The hard-coded table handed out when the rate source is unavailable.
    pub fn fallback() -> Self {
        Self::new(FALLBACK)
    }

    pub fn get(&self, currency: Currency) -> Option<f64> {
        self.0.get(&currency).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Currency, f64)> + '_ {
        self.0.iter().map(|(c, r)| (*c, *r))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Where a rate table handed out by the provider came from.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateOrigin {
    Cache,
    Fresh,
    Fallback,
}

serde_plain::derive_display_from_serialize!(RateOrigin);

/// The response of a rate source: units of each currency per one unit of the base currency.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct LatestRates {
    pub(crate) rates: BTreeMap<String, f64>,
    #[serde(default)]
    pub(crate) date: String,
}

/// Something that can fetch the latest exchange rates.
#[async_trait::async_trait]
pub(crate) trait RateSource {
    async fn fetch_latest(&self, base: Currency, symbols: &[Currency]) -> Res<LatestRates>;
}

/// What we store in the cache file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct RateCache {
    rates: RateTable,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    date: String,
}

/// Obtains rate tables, caching them on disk.
pub struct RateProvider {
    source: Box<dyn RateSource + Send + Sync>,
    cache_path: PathBuf,
    max_age: Duration,
}

impl RateProvider {
    pub(crate) fn new(
        source: Box<dyn RateSource + Send + Sync>,
        cache_path: impl Into<PathBuf>,
        max_age: Duration,
    ) -> Self {
        Self {
            source,
            cache_path: cache_path.into(),
            max_age,
        }
    }

    /// Creates a provider that talks to the configured rate API, or to a fixed in-memory source
    /// when running in `Mode::Test`.
    pub fn from_config(config: &Config, mode: Mode) -> Result<Self> {
        let source: Box<dyn RateSource + Send + Sync> = match mode {
            Mode::Remote => Box::new(
                Frankfurter::new(config.rate_api_url()).pub_result(ErrorType::Config)?,
            ),
            Mode::Test => Box::new(TestRateSource::default()),
        };
        Ok(Self::new(
            source,
            config.rates_cache_path(),
            config.rate_cache_duration(),
        ))
    }

    /// Returns a usable rate table. This never fails.
    pub async fn get_rates(&self) -> RateTable {
        self.get_rates_with_origin().await.0
    }

    /// Same as `get_rates`, but also tells where the table came from.
    pub async fn get_rates_with_origin(&self) -> (RateTable, RateOrigin) {
        self.get_rates_at(Utc::now()).await
    }

    pub(crate) async fn get_rates_at(&self, now: DateTime<Utc>) -> (RateTable, RateOrigin) {
        if let Some(cache) = self.read_cache().await {
            if now - cache.timestamp < self.max_age {
                debug!("Using cached exchange rates from {}", cache.timestamp);
                return (cache.rates, RateOrigin::Cache);
            }
            debug!("Cached exchange rates from {} have expired", cache.timestamp);
        }

        match self.fetch().await {
            Ok((rates, date)) => {
                info!("Fetched exchange rates for {date}");
                let cache = RateCache {
                    rates: rates.clone(),
                    timestamp: now,
                    date,
                };
                if let Err(e) = utils::serialize(&self.cache_path, &cache).await {
                    warn!("Unable to cache exchange rates: {e:#}");
                }
                (rates, RateOrigin::Fresh)
            }
            Err(e) => {
                warn!("Unable to fetch exchange rates, using the fallback table: {e:#}");
                (RateTable::fallback(), RateOrigin::Fallback)
            }
        }
    }

    async fn read_cache(&self) -> Option<RateCache> {
        if !self.cache_path.is_file() {
            return None;
        }
        match utils::deserialize(&self.cache_path).await {
            Ok(cache) => Some(cache),
            Err(e) => {
                debug!("Ignoring unreadable rate cache: {e:#}");
                None
            }
        }
    }

    async fn fetch(&self) -> Res<(RateTable, String)> {
        let symbols: Vec<Currency> = Currency::ALL.into_iter().filter(|c| *c != BASE).collect();
        let latest = self.source.fetch_latest(BASE, &symbols).await?;
        let table = anchor_table(&latest, BASE)?;
        Ok((table, latest.date))
    }
}

/// Converts base-denominated rates into anchor units per foreign unit: with `r[X]` being units of
/// `X` per one `base`, `rates[X] = r[ANCHOR] / r[X]`.
fn anchor_table(latest: &LatestRates, base: Currency) -> Res<RateTable> {
    let per_base = |currency: Currency| -> Res<f64> {
        if currency == base {
            return Ok(1.0);
        }
        let rate = latest
            .rates
            .get(currency.code())
            .copied()
            .with_context(|| format!("The rate source did not return a rate for {currency}"))?;
        if !rate.is_finite() || rate <= 0.0 {
            bail!("The rate source returned an unusable rate {rate} for {currency}");
        }
        Ok(rate)
    };

    let anchor_per_base = per_base(ANCHOR)?;
    let mut table = BTreeMap::new();
    for currency in Currency::ALL {
        let rate = if currency == ANCHOR {
            1.0
        } else {
            anchor_per_base / per_base(currency)?
        };
        table.insert(currency, rate);
    }
    Ok(RateTable(table))
}

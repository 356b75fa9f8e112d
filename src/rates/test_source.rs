//! Implements `RateSource` with fixed in-memory data for testing purposes.
//!
//! Note: like the in-memory remote store, this is compiled into the production binary so that the
//! whole app can be run, top-to-bottom, without network access.

use crate::error::Res;
use crate::model::Currency;
use crate::rates::{LatestRates, RateSource};
use anyhow::Context;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A `RateSource` that returns `latest`, or fails when it is `None`. It counts its calls.
pub(crate) struct TestRateSource {
    latest: Option<LatestRates>,
    calls: Arc<AtomicUsize>,
}

impl TestRateSource {
    pub(crate) fn new(latest: Option<LatestRates>) -> Self {
        Self {
            latest,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A handle on the call counter that stays valid after the source is boxed.
    #[cfg(test)]
    pub(crate) fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl Default for TestRateSource {
    /// EUR-based seed rates.
    fn default() -> Self {
        let rates = [("TRY", 50.0), ("USD", 1.16), ("GBP", 0.865)]
            .into_iter()
            .map(|(code, rate)| (code.to_string(), rate))
            .collect();
        Self::new(Some(LatestRates {
            rates,
            date: "2026-01-02".to_string(),
        }))
    }
}

#[async_trait::async_trait]
impl RateSource for TestRateSource {
    async fn fetch_latest(&self, base: Currency, _symbols: &[Currency]) -> Res<LatestRates> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.latest
            .clone()
            .with_context(|| format!("The test rate source has no rates for base {base}"))
    }
}

//! Implements `RateSource` against a Frankfurter-compatible HTTP API.

use crate::error::Res;
use crate::model::Currency;
use crate::rates::{LatestRates, RateSource};
use anyhow::{anyhow, bail, Context};
use tracing::trace;
use url::Url;

pub(crate) struct Frankfurter {
    client: reqwest::Client,
    base_url: Url,
}

impl Frankfurter {
    pub(crate) fn new(base_url: &str) -> Res<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid exchange rate API URL '{base_url}'"))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
        })
    }

    /// Builds `{base_url}/latest?base=EUR&symbols=TRY,USD,GBP`.
    fn latest_url(&self, base: Currency, symbols: &[Currency]) -> Res<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                anyhow!(
                    "The exchange rate API URL cannot have a path: {}",
                    self.base_url
                )
            })?
            .pop_if_empty()
            .push("latest");
        let symbols: Vec<&str> = symbols.iter().map(Currency::code).collect();
        url.query_pairs_mut()
            .append_pair("base", base.code())
            .append_pair("symbols", &symbols.join(","));
        Ok(url)
    }
}

#[async_trait::async_trait]
impl RateSource for Frankfurter {
    async fn fetch_latest(&self, base: Currency, symbols: &[Currency]) -> Res<LatestRates> {
        let url = self.latest_url(base, symbols)?;
        trace!("GET {url}");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to send exchange rate request to {url}"))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Exchange rate request to {url} failed with status {status}");
        }

        response
            .json::<LatestRates>()
            .await
            .context("Failed to parse the exchange rate response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_url() {
        let source = Frankfurter::new("https://api.frankfurter.dev/v1").unwrap();
        let url = source
            .latest_url(Currency::Eur, &[Currency::Try, Currency::Usd, Currency::Gbp])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.frankfurter.dev/v1/latest?base=EUR&symbols=TRY%2CUSD%2CGBP"
        );
    }

    #[test]
    fn test_latest_url_trailing_slash() {
        let source = Frankfurter::new("https://example.com/rates/").unwrap();
        let url = source.latest_url(Currency::Eur, &[Currency::Try]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/rates/latest?base=EUR&symbols=TRY"
        );
    }

    #[test]
    fn test_latest_url_without_path() {
        let source = Frankfurter::new("mailto:rates@example.com").unwrap();
        let err = source.latest_url(Currency::Eur, &[Currency::Try]).unwrap_err();
        assert!(err
            .to_string()
            .contains("cannot have a path: mailto:rates@example.com"));
    }

    #[test]
    fn test_invalid_url() {
        assert!(Frankfurter::new("not a url").is_err());
    }

    #[test]
    fn test_parse_response() {
        let json = r#"{"amount":1.0,"base":"EUR","date":"2026-10-16","rates":{"GBP":0.86,"TRY":49.1,"USD":1.17}}"#;
        let latest: LatestRates = serde_json::from_str(json).unwrap();
        assert_eq!(latest.date, "2026-10-16");
        assert_eq!(latest.rates.get("TRY"), Some(&49.1));
    }
}

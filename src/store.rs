//! The in-memory payment collection and its synchronization with the remote document.
//!
//! A [`RecordStore`] owns the collection. It loads the whole document once, applies mutations in
//! memory and writes the whole document back after each one, guarded by the version token it got
//! from the last successful read or write. A failed write leaves the mutation applied in memory
//! and is reported to the caller; nothing is rolled back or retried.

use crate::api::{read_local, remote_store, RemoteStore, VersionToken};
use crate::error::IntoResult;
use crate::filter::{filter, FilterCriteria};
use crate::model::{Currency, NewPayment, PaymentRecord, PaymentUpdates, PaymentsDocument};
use crate::rates::RateTable;
use crate::summary::{summarize, Summary};
use crate::{Config, Error, ErrorType, Mode, Result};
use anyhow::{anyhow, Context};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Where the collection currently held by the store was loaded from.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Remote,
    LocalFallback,
}

serde_plain::derive_display_from_serialize!(DataSource);

/// Holds the payment collection. Mutating methods take `&mut self`, so they can never run
/// concurrently with each other.
pub struct RecordStore {
    remote: Box<dyn RemoteStore + Send>,
    path: String,
    local_path: Option<PathBuf>,
    reporting_currency: Currency,
    document: PaymentsDocument,
    version_token: VersionToken,
    source: Option<DataSource>,
    rates: Option<RateTable>,
}

impl RecordStore {
    pub(crate) fn new(
        remote: Box<dyn RemoteStore + Send>,
        path: impl Into<String>,
        local_path: Option<PathBuf>,
        reporting_currency: Currency,
    ) -> Self {
        Self {
            remote,
            path: path.into(),
            local_path,
            reporting_currency,
            document: PaymentsDocument::default(),
            version_token: VersionToken::default(),
            source: None,
            rates: None,
        }
    }

    /// Creates a store for the document configured in `config`. Nothing is loaded yet.
    pub async fn from_config(config: &Config, mode: Mode) -> Result<Self> {
        let remote = remote_store(config, mode).await?;
        Ok(Self::new(
            remote,
            config.file_path(),
            config.local_fallback_path(),
            config.reporting_currency(),
        ))
    }

    /// Loads the collection from the remote store, or from the local fallback copy if that fails.
    ///
    /// After a fallback load the version token is the local sentinel, which the remote store will
    /// refuse, so saves are expected to fail until the next successful remote load.
    ///
    /// # Errors
    /// Returns an `ErrorType::DataUnavailable` error if both sources fail.
    pub async fn load(&mut self) -> Result<DataSource> {
        let remote_error = match self.load_remote().await {
            Ok((document, token)) => {
                info!(
                    "Loaded {} payments from '{}' at version {token}",
                    document.payments.len(),
                    self.path
                );
                return Ok(self.replace(document, token, DataSource::Remote));
            }
            Err(e) => e,
        };
        warn!("Unable to load from the remote store, trying the local copy: {remote_error}");

        match self.load_local().await {
            Ok(document) => {
                warn!(
                    "Loaded {} payments from the local copy, saving will not work",
                    document.payments.len()
                );
                Ok(self.replace(
                    document,
                    VersionToken::local_fallback(),
                    DataSource::LocalFallback,
                ))
            }
            Err(local_error) => Err(Error::new(
                ErrorType::DataUnavailable,
                anyhow!(
                    "Unable to load payments. Remote: {remote_error}. Local: {local_error:#}"
                ),
            )),
        }
    }

    async fn load_remote(&mut self) -> Result<(PaymentsDocument, VersionToken)> {
        let fetched = self.remote.fetch(&self.path).await?;
        let document = serde_json::from_value(fetched.content)
            .with_context(|| format!("The document at '{}' is malformed", self.path))
            .pub_result(ErrorType::Request)?;
        Ok((document, fetched.version_token))
    }

    async fn load_local(&self) -> anyhow::Result<PaymentsDocument> {
        let path = self
            .local_path
            .as_deref()
            .context("No local fallback copy is configured")?;
        let value = read_local(path).await?;
        serde_json::from_value(value)
            .with_context(|| format!("The local copy at {} is malformed", path.display()))
    }

    fn replace(
        &mut self,
        document: PaymentsDocument,
        token: VersionToken,
        source: DataSource,
    ) -> DataSource {
        self.document = document;
        self.version_token = token;
        self.source = Some(source);
        source
    }

    /// The payments in insertion order.
    pub fn payments(&self) -> &[PaymentRecord] {
        &self.document.payments
    }

    pub fn document(&self) -> &PaymentsDocument {
        &self.document
    }

    pub fn version_token(&self) -> &VersionToken {
        &self.version_token
    }

    /// `None` until `load` has succeeded.
    pub fn source(&self) -> Option<DataSource> {
        self.source
    }

    pub fn reporting_currency(&self) -> Currency {
        self.reporting_currency
    }

    /// Sets the rate table used for the summary that is written with every save. Without one, the
    /// table stored in the loaded document's metadata is reused.
    pub fn set_rates(&mut self, rates: RateTable) {
        self.rates = Some(rates);
    }

    /// A fresh summary of the current collection.
    pub fn summarize(&self, rates: &RateTable) -> Result<Summary> {
        summarize(&self.document.payments, rates, self.reporting_currency)
    }

    pub fn filter(&self, criteria: &FilterCriteria) -> Vec<&PaymentRecord> {
        filter(&self.document.payments, criteria)
    }

    /// # Errors
    /// Returns an `ErrorType::NotFound` error if there is no payment with `id`.
    pub fn get(&self, id: u64) -> Result<&PaymentRecord> {
        self.document
            .payments
            .iter()
            .find(|p| p.id() == id)
            .ok_or_else(|| not_found(id))
    }

    /// Appends a payment with the next free id, then saves.
    ///
    /// The returned record is the one that was appended. When the save fails, the record stays in
    /// the collection and the error is returned.
    pub async fn create(&mut self, new: NewPayment) -> Result<PaymentRecord> {
        self.ensure_loaded().await?;
        let id = next_id(&self.document.payments);
        let record = new.into_record(id);
        debug!("Creating payment {id}");
        self.document.payments.push(record.clone());
        self.persist().await?;
        Ok(record)
    }

    /// Overwrites the fields that are set in `updates`, then saves.
    ///
    /// `totalDebt` and `remaining` are not recomputed here. Callers that change the amounts must
    /// supply them, see [`PaymentUpdates::with_recomputed_totals`].
    ///
    /// # Errors
    /// Returns an `ErrorType::NotFound` error if there is no payment with `id`.
    pub async fn update(&mut self, id: u64, updates: PaymentUpdates) -> Result<PaymentRecord> {
        self.ensure_loaded().await?;
        let record = self
            .document
            .payments
            .iter_mut()
            .find(|p| p.id() == id)
            .ok_or_else(|| not_found(id))?;
        record.apply(updates);
        let record = record.clone();
        debug!("Updated payment {id}");
        self.persist().await?;
        Ok(record)
    }

    /// Removes the payment with `id`, if any, then saves. Returns whether a payment was removed.
    pub async fn delete(&mut self, id: u64) -> Result<bool> {
        self.ensure_loaded().await?;
        let before = self.document.payments.len();
        self.document.payments.retain(|p| p.id() != id);
        let removed = self.document.payments.len() != before;
        if !removed {
            debug!("There is no payment {id} to delete");
        }
        self.persist().await?;
        Ok(removed)
    }

    /// Mutations are applied to a loaded collection only, so a store that was never loaded loads
    /// first.
    async fn ensure_loaded(&mut self) -> Result<()> {
        if self.source.is_none() {
            debug!("Loading '{}' before the first change", self.path);
            self.load().await?;
        }
        Ok(())
    }

    /// Attaches a fresh summary and timestamp to the document and writes it with the current
    /// version token.
    async fn persist(&mut self) -> Result<()> {
        let rates = match &self.rates {
            Some(rates) => rates.clone(),
            None if !self.document.metadata.currency.is_empty() => {
                self.document.metadata.currency.clone()
            }
            None => RateTable::fallback(),
        };
        let summary = self.summarize(&rates)?;
        self.document.summary = Some(summary);
        self.document.metadata.currency = rates;
        self.document.metadata.last_update = Some(Utc::now());

        let content = serde_json::to_value(&self.document)
            .context("Unable to serialize the payments document")
            .pub_result(ErrorType::Internal)?;

        match self
            .remote
            .write(&self.path, &content, &self.version_token)
            .await
        {
            Ok(token) => {
                debug!("Saved '{}', version {} -> {token}", self.path, self.version_token);
                self.version_token = token;
                Ok(())
            }
            Err(e) => {
                error!("Saving '{}' failed, local changes are not saved: {e}", self.path);
                if e.is(ErrorType::Auth) {
                    return Err(e);
                }
                Err(Error::new(
                    ErrorType::SaveFailed,
                    anyhow::Error::from(e).context(format!("Unable to save '{}'", self.path)),
                ))
            }
        }
    }
}

/// One more than the largest id, or 1 for an empty collection.
fn next_id(payments: &[PaymentRecord]) -> u64 {
    payments.iter().map(PaymentRecord::id).max().unwrap_or(0) + 1
}

fn not_found(id: u64) -> Error {
    Error::msg(ErrorType::NotFound, format!("There is no payment with id {id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{TestStore, TestStoreState};
    use crate::model::InvoiceStatus;
    use crate::utils;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use uuid::Uuid;

    fn document(ids: &[u64]) -> Value {
        let payments: Vec<Value> = ids
            .iter()
            .map(|id| {
                json!({
                    "id": id,
                    "itemName": format!("Item {id}"),
                    "companyName": "Acme Corp",
                    "projectName": "Website",
                    "currency": "TL",
                    "previousDebt": 150,
                    "currentDebt": 50,
                    "totalDebt": 200,
                    "paid": 0,
                    "remaining": 200,
                    "invoiceStatus": "FATURASIZ",
                    "documentUploaded": false,
                    "documentURL": "",
                    "customField": "kept"
                })
            })
            .collect();
        json!({
            "payments": payments,
            "metadata": {
                "currency": {"TRY": 1.0, "USD": 43.1, "EUR": 50.0, "GBP": 57.8},
                "lastUpdate": null
            }
        })
    }

    /// Seeds the in-memory remote with `content` at a fresh path and returns the path.
    fn seed(content: Option<Value>) -> String {
        let path = format!("{}.json", Uuid::new_v4());
        TestStore::set_state(
            &path,
            TestStoreState {
                content,
                version: 1,
                reject_credential: false,
            },
        );
        path
    }

    fn store(path: &str, local_path: Option<PathBuf>) -> RecordStore {
        RecordStore::new(Box::new(TestStore::new()), path, local_path, Currency::Eur)
    }

    async fn loaded(ids: &[u64]) -> (RecordStore, String) {
        let path = seed(Some(document(ids)));
        let mut store = store(&path, None);
        assert_eq!(store.load().await.unwrap(), DataSource::Remote);
        (store, path)
    }

    #[test]
    fn test_next_id() {
        assert_eq!(next_id(&[]), 1);
        let payments: Vec<PaymentRecord> = [3, 7, 2]
            .into_iter()
            .map(|id| NewPayment::default().into_record(id))
            .collect();
        assert_eq!(next_id(&payments), 8);
    }

    #[tokio::test]
    async fn test_load_remote() {
        let (store, _) = loaded(&[1, 2]).await;
        assert_eq!(store.payments().len(), 2);
        assert_eq!(store.version_token().as_str(), "test-sha-1");
        assert_eq!(store.source(), Some(DataSource::Remote));
        assert_eq!(store.get(2).unwrap().currency(), Currency::Try);
    }

    #[tokio::test]
    async fn test_create_assigns_max_plus_one() {
        let (mut store, path) = loaded(&[3, 7, 2]).await;
        let created = store
            .create(NewPayment {
                item_name: "Printer".into(),
                currency: Currency::Usd,
                current_debt: 80.0,
                paid: 20.0,
                ..NewPayment::default()
            })
            .await
            .unwrap();
        assert_eq!(created.id(), 8);
        assert_eq!(created.total_debt(), 80.0);
        assert_eq!(created.remaining(), 60.0);
        let ids: Vec<u64> = store.payments().iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec![3, 7, 2, 8]);
        assert_eq!(store.version_token().as_str(), "test-sha-2");

        let saved = TestStore::get_state(&path).content.unwrap();
        assert_eq!(saved["payments"].as_array().unwrap().len(), 4);
        assert_eq!(saved["payments"][0]["customField"], "kept");
        assert!(saved["metadata"]["lastUpdate"].is_string());
        assert_eq!(saved["summary"]["reportingCurrency"], "EUR");
        // 3 records of 200 TRY at 50 TRY per EUR.
        assert_eq!(saved["summary"]["byCurrency"]["TRY"]["totalDebt"], 600.0);
    }

    #[tokio::test]
    async fn test_create_loads_first() {
        let path = seed(Some(document(&[3, 7])));
        let mut store = store(&path, None);
        assert_eq!(store.source(), None);

        let created = store.create(NewPayment::default()).await.unwrap();
        assert_eq!(created.id(), 8);
        assert_eq!(store.source(), Some(DataSource::Remote));
        let ids: Vec<u64> = store.payments().iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec![3, 7, 8]);
        assert_eq!(store.version_token().as_str(), "test-sha-2");
    }

    #[tokio::test]
    async fn test_delete_without_data_fails_before_writing() {
        let path = seed(None);
        let mut store = store(&path, None);
        let err = store.delete(1).await.unwrap_err();
        assert!(err.is(ErrorType::DataUnavailable));
        assert_eq!(TestStore::get_state(&path).version, 1);
    }

    #[tokio::test]
    async fn test_create_on_empty_collection() {
        let (mut store, _) = loaded(&[]).await;
        let created = store.create(NewPayment::default()).await.unwrap();
        assert_eq!(created.id(), 1);
        assert!(!created.document_uploaded());
        assert_eq!(created.document_url(), "");
    }

    #[tokio::test]
    async fn test_update_does_not_recompute() {
        let (mut store, _) = loaded(&[1]).await;
        let updated = store
            .update(
                1,
                PaymentUpdates {
                    paid: Some(100.0),
                    invoice_status: Some(InvoiceStatus::Invoiced),
                    ..PaymentUpdates::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.paid(), 100.0);
        assert_eq!(updated.total_debt(), 200.0);
        assert_eq!(updated.remaining(), 200.0);
        assert_eq!(updated.company_name(), "Acme Corp");
        assert_eq!(store.get(1).unwrap(), &updated);
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let (mut store, path) = loaded(&[1]).await;
        let err = store
            .update(9, PaymentUpdates::default())
            .await
            .unwrap_err();
        assert!(err.is(ErrorType::NotFound));
        assert!(store.get(9).unwrap_err().is(ErrorType::NotFound));
        // Nothing was written.
        assert_eq!(TestStore::get_state(&path).version, 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let (mut store, path) = loaded(&[1, 2, 3]).await;
        assert!(store.delete(2).await.unwrap());
        let ids: Vec<u64> = store.payments().iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec![1, 3]);

        // Deleting an absent id changes nothing but still saves.
        assert!(!store.delete(2).await.unwrap());
        assert_eq!(store.payments().len(), 2);
        assert_eq!(TestStore::get_state(&path).version, 3);
    }

    #[tokio::test]
    async fn test_conflict_keeps_mutation_and_fails() {
        let (mut store, path) = loaded(&[1, 2]).await;
        let mut state = TestStore::get_state(&path);
        state.version += 1;
        TestStore::set_state(&path, state);

        let err = store.delete(1).await.unwrap_err();
        assert!(err.is(ErrorType::SaveFailed));
        assert_eq!(store.payments().len(), 1);
        assert_eq!(store.version_token().as_str(), "test-sha-1");
        let remote = TestStore::get_state(&path).content.unwrap();
        assert_eq!(remote["payments"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_credential_on_save() {
        let (mut store, path) = loaded(&[1]).await;
        let mut state = TestStore::get_state(&path);
        state.reject_credential = true;
        TestStore::set_state(&path, state);

        let err = store.create(NewPayment::default()).await.unwrap_err();
        assert!(err.is(ErrorType::Auth));
        assert_eq!(store.payments().len(), 2);
    }

    #[tokio::test]
    async fn test_local_fallback() {
        let dir = TempDir::new().unwrap();
        let local = dir.path().join("payments.json");
        utils::write(&local, document(&[5]).to_string()).await.unwrap();
        let path = seed(None);

        let mut store = store(&path, Some(local));
        assert_eq!(store.load().await.unwrap(), DataSource::LocalFallback);
        assert!(store.version_token().is_local_fallback());
        assert_eq!(store.payments()[0].id(), 5);

        // The sentinel token does not match anything the remote store has.
        let err = store.delete(5).await.unwrap_err();
        assert!(err.is(ErrorType::SaveFailed));
        assert!(store.payments().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_remote_falls_back() {
        let dir = TempDir::new().unwrap();
        let local = dir.path().join("payments.json");
        utils::write(&local, document(&[]).to_string()).await.unwrap();
        let path = seed(Some(json!({"payments": "nope"})));

        let mut store = store(&path, Some(local));
        assert_eq!(store.load().await.unwrap(), DataSource::LocalFallback);
    }

    #[tokio::test]
    async fn test_data_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = seed(None);
        let mut store = store(&path, Some(dir.path().join("missing.json")));
        let err = store.load().await.unwrap_err();
        assert!(err.is(ErrorType::DataUnavailable));
        assert_eq!(store.source(), None);

        let mut store = self::store(&path, None);
        assert!(store.load().await.unwrap_err().is(ErrorType::DataUnavailable));
    }

    #[tokio::test]
    async fn test_set_rates_is_used_for_saved_summary() {
        let (mut store, path) = loaded(&[1]).await;
        store.set_rates(RateTable::new([(Currency::Try, 1.0), (Currency::Eur, 40.0)]));
        store.delete(99).await.unwrap();
        let saved = TestStore::get_state(&path).content.unwrap();
        assert_eq!(saved["metadata"]["currency"]["EUR"], 40.0);
        assert_eq!(
            saved["summary"]["totalInReportingCurrency"]["totalDebt"],
            5.0
        );
    }

    #[tokio::test]
    async fn test_filter_and_summarize() {
        let (store, _) = loaded(&[1, 2]).await;
        let criteria = FilterCriteria {
            search: Some("item 2".into()),
            ..FilterCriteria::default()
        };
        let found = store.filter(&criteria);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), 2);

        let summary = store.summarize(&RateTable::fallback()).unwrap();
        assert_eq!(summary.for_currency(Currency::Try).total_debt, 400.0);
        assert_eq!(summary.total_in_reporting_currency.total_debt, 8.0);
    }
}

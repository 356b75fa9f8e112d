//! Implements the `RemoteStore` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without using GitHub.
//!
//! All `TestStore` instances in a process share one map of documents keyed by path, so a document
//! written by one command is seen by the next. Tests keep out of each other's way by using a unique
//! path.

use crate::api::{Fetched, RemoteStore, VersionToken};
use crate::{Error, ErrorType, Result};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex, MutexGuard};

static DOCUMENTS: LazyLock<Mutex<HashMap<String, TestStoreState>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// The state of one document in the in-memory store.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TestStoreState {
    /// `None` means that no file exists at the path.
    pub(crate) content: Option<Value>,
    /// Incremented by every successful write. The version token is derived from it.
    pub(crate) version: u64,
    /// When `true`, every call fails as if the credential were invalid.
    pub(crate) reject_credential: bool,
}

impl TestStoreState {
    fn token(&self) -> VersionToken {
        VersionToken::new(format!("test-sha-{}", self.version))
    }
}

impl Default for TestStoreState {
    /// Seeded with a few payments.
    fn default() -> Self {
        Self {
            content: Some(seed_document()),
            version: 1,
            reject_credential: false,
        }
    }
}

/// An implementation of the `RemoteStore` trait that keeps documents in memory.
#[derive(Debug, Default)]
pub(crate) struct TestStore {}

impl TestStore {
    pub(crate) fn new() -> Self {
        Self {}
    }

    /// Returns the state of the document at `path`, seeding it if it does not exist yet.
    #[cfg(test)]
    pub(crate) fn get_state(path: &str) -> TestStoreState {
        documents().entry(path.to_string()).or_default().clone()
    }

    /// Replaces the state of the document at `path`.
    #[cfg(test)]
    pub(crate) fn set_state(path: &str, state: TestStoreState) {
        documents().insert(path.to_string(), state);
    }
}

/// A poisoned lock only means that another test panicked while holding it.
fn documents() -> MutexGuard<'static, HashMap<String, TestStoreState>> {
    DOCUMENTS.lock().unwrap_or_else(|e| e.into_inner())
}

fn rejected() -> Error {
    Error::msg(ErrorType::Auth, "The test store rejected the credential")
}

#[async_trait::async_trait]
impl RemoteStore for TestStore {
    async fn fetch(&mut self, path: &str) -> Result<Fetched> {
        let mut documents = documents();
        let state = documents.entry(path.to_string()).or_default();
        if state.reject_credential {
            return Err(rejected());
        }
        let content = state.content.clone().ok_or_else(|| {
            Error::msg(ErrorType::Request, format!("'{path}' does not exist"))
        })?;
        Ok(Fetched {
            content,
            version_token: state.token(),
        })
    }

    async fn write(
        &mut self,
        path: &str,
        content: &Value,
        expected: &VersionToken,
    ) -> Result<VersionToken> {
        let mut documents = documents();
        let state = documents.entry(path.to_string()).or_default();
        if state.reject_credential {
            return Err(rejected());
        }
        let current = state.token();
        if *expected != current {
            return Err(Error::msg(
                ErrorType::Conflict,
                format!("'{path}' is at version {current}, the write expected {expected}"),
            ));
        }
        state.version += 1;
        state.content = Some(content.clone());
        Ok(state.token())
    }
}

/// Seed document, in the shape the web app writes.
fn seed_document() -> Value {
    json!({
        "payments": [
            {
                "id": 1,
                "itemName": "Sunucu kiralama",
                "companyName": "Acme Hosting",
                "serviceType": "Hosting",
                "projectName": "Web Sitesi",
                "currency": "USD",
                "previousDebt": 120,
                "currentDebt": 40,
                "totalDebt": 160,
                "paid": 100,
                "remaining": 60,
                "invoiceStatus": "FATURALI",
                "documentUploaded": false,
                "documentURL": ""
            },
            {
                "id": 2,
                "itemName": "Ofis bilgisayarları",
                "companyName": "Northwind Bilişim",
                "serviceType": "Donanım",
                "projectName": "Ofis",
                "currency": "TL",
                "previousDebt": 0,
                "currentDebt": 85000,
                "totalDebt": 85000,
                "paid": 25000,
                "remaining": 60000,
                "invoiceStatus": "FATURASIZ",
                "documentUploaded": false,
                "documentURL": ""
            },
            {
                "id": 3,
                "itemName": "Yazılım lisansı",
                "companyName": "Globex",
                "serviceType": "Lisans",
                "projectName": "Web Sitesi",
                "currency": "EUR",
                "previousDebt": 300,
                "currentDebt": 0,
                "totalDebt": 300,
                "paid": 300,
                "remaining": 0,
                "invoiceStatus": "FATURALI",
                "documentUploaded": true,
                "documentURL": "https://example.com/invoices/3.pdf"
            }
        ],
        "summary": {},
        "metadata": {
            "currency": {"TRY": 1.0, "USD": 43.1, "EUR": 50.0, "GBP": 57.8},
            "lastUpdate": "2026-01-02T09:30:00.000Z"
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn unique_path() -> String {
        format!("{}.json", Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_write_requires_current_token() {
        let path = unique_path();
        let mut store = TestStore::new();
        let fetched = store.fetch(&path).await.unwrap();
        assert_eq!(fetched.version_token.as_str(), "test-sha-1");

        let new_token = store
            .write(&path, &json!({"payments": []}), &fetched.version_token)
            .await
            .unwrap();
        assert_eq!(new_token.as_str(), "test-sha-2");

        let err = store
            .write(&path, &json!({}), &fetched.version_token)
            .await
            .unwrap_err();
        assert!(err.is(ErrorType::Conflict));
        assert_eq!(
            TestStore::get_state(&path).content,
            Some(json!({"payments": []}))
        );
    }

    #[tokio::test]
    async fn test_rejected_credential() {
        let path = unique_path();
        TestStore::set_state(
            &path,
            TestStoreState {
                reject_credential: true,
                ..TestStoreState::default()
            },
        );
        let err = TestStore::new().fetch(&path).await.unwrap_err();
        assert!(err.is(ErrorType::Auth));
    }

    #[tokio::test]
    async fn test_missing_document() {
        let path = unique_path();
        TestStore::set_state(
            &path,
            TestStoreState {
                content: None,
                ..TestStoreState::default()
            },
        );
        let err = TestStore::new().fetch(&path).await.unwrap_err();
        assert!(err.is(ErrorType::Request));
    }
}

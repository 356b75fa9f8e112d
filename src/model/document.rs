use crate::model::PaymentRecord;
use crate::rates::RateTable;
use crate::summary::Summary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The JSON document that is read and written as a whole:
///
/// ```json
/// {
///   "payments": [ ... ],
///   "summary": { "byCurrency": { ... }, "totalInReportingCurrency": { ... } },
///   "metadata": { "currency": { "TRY": 1.0, "EUR": 50.0 }, "lastUpdate": "2026-10-19T08:00:00Z" }
/// }
/// ```
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentsDocument {
    #[serde(default)]
    pub payments: Vec<PaymentRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(flatten)]
    pub other_fields: BTreeMap<String, Value>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// The rate table used for the saved summary.
    #[serde(default)]
    pub currency: RateTable,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub other_fields: BTreeMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Currency;

    #[test]
    fn test_parse_document() {
        let json = r#"{
            "payments": [
                {"id": 1, "itemName": "Domain", "currency": "TL", "totalDebt": 10},
                {"id": 2, "itemName": "VPS", "currency": "USD", "totalDebt": 5}
            ],
            "summary": {"byCurrency": {}, "totalInEUR": {"totalDebt": 1.2}},
            "metadata": {"currency": {"TRY": 1, "EUR": 50}, "lastUpdate": "2025-03-01T10:00:00.000Z", "source": "web"},
            "version": 3
        }"#;
        let doc: PaymentsDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.payments.len(), 2);
        assert_eq!(doc.payments[0].currency(), Currency::Try);
        assert_eq!(doc.metadata.currency.get(Currency::Eur), Some(50.0));
        assert!(doc.metadata.last_update.is_some());
        assert_eq!(doc.metadata.other_fields["source"], "web");
        assert_eq!(doc.other_fields["version"], 3);

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["version"], 3);
        assert_eq!(value["metadata"]["source"], "web");
        assert_eq!(value["payments"][0]["currency"], "TRY");
    }

    #[test]
    fn test_parse_minimal_document() {
        let doc: PaymentsDocument = serde_json::from_str(r#"{"payments": []}"#).unwrap();
        assert!(doc.payments.is_empty());
        assert!(doc.summary.is_none());
        assert!(doc.metadata.currency.is_empty());
        assert!(doc.metadata.last_update.is_none());
    }

    #[test]
    fn test_unknown_currency_is_rejected() {
        let json = r#"{"payments": [{"id": 1, "currency": "JPY"}]}"#;
        assert!(serde_json::from_str::<PaymentsDocument>(json).is_err());
    }
}

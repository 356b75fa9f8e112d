//! Narrowing a payment collection down by project, currency, invoice status and free text.

use crate::model::{Currency, InvoiceStatus, PaymentRecord};
use serde::{Deserialize, Serialize};

/// The criteria for [`filter`]. A `None` (or, for text, empty) field imposes no constraint.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    pub project: Option<String>,
    pub currency: Option<Currency>,
    pub invoice_status: Option<InvoiceStatus>,
    pub search: Option<String>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        non_empty(&self.project).is_none()
            && self.currency.is_none()
            && self.invoice_status.is_none()
            && non_empty(&self.search).is_none()
    }

    /// Returns `true` when `payment` satisfies every constraint.
    pub fn matches(&self, payment: &PaymentRecord) -> bool {
        if let Some(project) = non_empty(&self.project) {
            if payment.project_name() != project {
                return false;
            }
        }
        if let Some(currency) = self.currency {
            if payment.currency() != currency {
                return false;
            }
        }
        if let Some(status) = self.invoice_status {
            if payment.invoice_status() != status {
                return false;
            }
        }
        if let Some(search) = non_empty(&self.search) {
            let needle = search.to_lowercase();
            let contains = |field: &str| !field.is_empty() && field.to_lowercase().contains(&needle);
            if !contains(payment.item_name()) && !contains(payment.company_name()) {
                return false;
            }
        }
        true
    }
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|s| !s.is_empty())
}

/// Returns the payments that match `criteria`, in their original order.
pub fn filter<'a>(payments: &'a [PaymentRecord], criteria: &FilterCriteria) -> Vec<&'a PaymentRecord> {
    payments.iter().filter(|p| criteria.matches(p)).collect()
}

use crate::model::Currency;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Whether an invoice has been issued for a payment.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum InvoiceStatus {
    #[serde(rename = "FATURALI")]
    Invoiced,
    #[default]
    #[serde(rename = "FATURASIZ")]
    NotInvoiced,
}

impl Display for InvoiceStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            InvoiceStatus::Invoiced => f.write_str("invoiced"),
            InvoiceStatus::NotInvoiced => f.write_str("not-invoiced"),
        }
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    /// Accepts the stored values (`FATURALI`, `FATURASIZ`) and their English names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "faturali" | "invoiced" => Ok(InvoiceStatus::Invoiced),
            "faturasiz" | "not-invoiced" => Ok(InvoiceStatus::NotInvoiced),
            _ => Err(format!(
                "Unknown invoice status '{s}', expected 'invoiced' or 'not-invoiced'"
            )),
        }
    }
}

/// A single payment record as stored in the remote document.
///
/// `total_debt` and `remaining` are derived values, computed when a record is written. Nothing
/// recomputes them on read, so a record whose amounts were changed without calling
/// [`PaymentRecord::recompute`] keeps its old totals.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub(crate) id: u64,
    #[serde(default)]
    pub(crate) item_name: String,
    #[serde(default)]
    pub(crate) company_name: String,
    #[serde(default)]
    pub(crate) service_type: String,
    #[serde(default)]
    pub(crate) project_name: String,
    pub(crate) currency: Currency,
    #[serde(default)]
    pub(crate) previous_debt: f64,
    #[serde(default)]
    pub(crate) current_debt: f64,
    #[serde(default)]
    pub(crate) total_debt: f64,
    #[serde(default)]
    pub(crate) paid: f64,
    #[serde(default)]
    pub(crate) remaining: f64,
    #[serde(default)]
    pub(crate) invoice_status: InvoiceStatus,
    #[serde(default)]
    pub(crate) document_uploaded: bool,
    #[serde(default, rename = "documentURL")]
    pub(crate) document_url: String,
    /// Keys we do not know about are carried along untouched.
    #[serde(flatten)]
    pub(crate) other_fields: BTreeMap<String, Value>,
}

impl PaymentRecord {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn previous_debt(&self) -> f64 {
        self.previous_debt
    }

    pub fn current_debt(&self) -> f64 {
        self.current_debt
    }

    pub fn total_debt(&self) -> f64 {
        self.total_debt
    }

    pub fn paid(&self) -> f64 {
        self.paid
    }

    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    pub fn invoice_status(&self) -> InvoiceStatus {
        self.invoice_status
    }

    pub fn document_uploaded(&self) -> bool {
        self.document_uploaded
    }

    pub fn document_url(&self) -> &str {
        &self.document_url
    }

    /// The five numeric fields, in the order previous, current, total, paid, remaining.
    pub(crate) fn amounts(&self) -> [f64; 5] {
        [
            self.previous_debt,
            self.current_debt,
            self.total_debt,
            self.paid,
            self.remaining,
        ]
    }

    /// Sets `total_debt` and `remaining` from the current amounts.
    pub fn recompute(&mut self) {
        self.total_debt = self.previous_debt + self.current_debt;
        self.remaining = self.total_debt - self.paid;
    }

    /// Applies `updates` as a shallow overwrite. Fields that are `None` keep their value and the
    /// derived totals are left alone.
    pub(crate) fn apply(&mut self, updates: PaymentUpdates) {
        let PaymentUpdates {
            item_name,
            company_name,
            service_type,
            project_name,
            currency,
            previous_debt,
            current_debt,
            total_debt,
            paid,
            remaining,
            invoice_status,
            document_uploaded,
            document_url,
        } = updates;
        set(&mut self.item_name, item_name);
        set(&mut self.company_name, company_name);
        set(&mut self.service_type, service_type);
        set(&mut self.project_name, project_name);
        set(&mut self.currency, currency);
        set(&mut self.previous_debt, previous_debt);
        set(&mut self.current_debt, current_debt);
        set(&mut self.total_debt, total_debt);
        set(&mut self.paid, paid);
        set(&mut self.remaining, remaining);
        set(&mut self.invoice_status, invoice_status);
        set(&mut self.document_uploaded, document_uploaded);
        set(&mut self.document_url, document_url);
    }
}

fn set<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

/// The user-supplied fields of a new payment. The id and document metadata are assigned by the
/// store.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    pub item_name: String,
    pub company_name: String,
    pub service_type: String,
    pub project_name: String,
    pub currency: Currency,
    pub previous_debt: f64,
    pub current_debt: f64,
    pub paid: f64,
    pub invoice_status: InvoiceStatus,
}

impl NewPayment {
    /// Builds the stored record, deriving the totals and defaulting the document fields.
    pub(crate) fn into_record(self, id: u64) -> PaymentRecord {
        let mut record = PaymentRecord {
            id,
            item_name: self.item_name,
            company_name: self.company_name,
            service_type: self.service_type,
            project_name: self.project_name,
            currency: self.currency,
            previous_debt: self.previous_debt,
            current_debt: self.current_debt,
            total_debt: 0.0,
            paid: self.paid,
            remaining: 0.0,
            invoice_status: self.invoice_status,
            document_uploaded: false,
            document_url: String::new(),
            other_fields: BTreeMap::new(),
        };
        record.recompute();
        record
    }
}

/// A partial update of a payment. `None` means "leave as is".
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUpdates {
    pub item_name: Option<String>,
    pub company_name: Option<String>,
    pub service_type: Option<String>,
    pub project_name: Option<String>,
    pub currency: Option<Currency>,
    pub previous_debt: Option<f64>,
    pub current_debt: Option<f64>,
    pub total_debt: Option<f64>,
    pub paid: Option<f64>,
    pub remaining: Option<f64>,
    pub invoice_status: Option<InvoiceStatus>,
    pub document_uploaded: Option<bool>,
    #[serde(rename = "documentURL")]
    pub document_url: Option<String>,
}

impl PaymentUpdates {
    /// Returns `true` if any of the amounts that feed the derived totals is being changed.
    pub fn touches_amounts(&self) -> bool {
        self.previous_debt.is_some() || self.current_debt.is_some() || self.paid.is_some()
    }

    /// Fills in `total_debt` and `remaining` from the merge of these updates over `current`.
    pub fn with_recomputed_totals(mut self, current: &PaymentRecord) -> Self {
        let previous = self.previous_debt.unwrap_or(current.previous_debt);
        let now = self.current_debt.unwrap_or(current.current_debt);
        let paid = self.paid.unwrap_or(current.paid);
        let total = previous + now;
        self.total_debt = Some(total);
        self.remaining = Some(total - paid);
        self
    }
}

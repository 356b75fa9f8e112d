//! Types that represent the core data model, such as `PaymentRecord` and `Currency`.
mod currency;
mod document;
mod money;
mod payment;

pub use currency::{Currency, UnknownCurrency};
pub use document::{Metadata, PaymentsDocument};
pub use money::Money;
pub use payment::{InvoiceStatus, NewPayment, PaymentRecord, PaymentUpdates};

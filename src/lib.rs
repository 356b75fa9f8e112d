//! Tracks payments owed to suppliers in several currencies.
//!
//! The payments live in a JSON document in a GitHub repository. A [`store::RecordStore`] loads
//! the document, applies changes and writes it back along with a recomputed [`summary::Summary`].
//! Amounts in different currencies are compared through a [`rates::RateTable`] that is anchored on
//! Turkish lira.

mod api;
pub mod args;
mod backup;
pub mod commands;
mod config;
pub mod convert;
mod error;
pub mod filter;
pub mod model;
pub mod rates;
pub mod session;
pub mod store;
pub mod summary;
mod utils;

#[cfg(test)]
mod test;

pub use api::{Mode, VersionToken, TEST_MODE_ENV};
pub use config::{Config, NewConfig, Repository};
pub use error::{Error, ErrorType, Result};

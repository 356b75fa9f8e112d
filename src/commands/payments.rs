//! Handlers for the commands that read and change payments.

use crate::args::{AddArgs, DeleteArgs, FilterArgs, UpdateArgs};
use crate::commands::{open_store, open_store_with_rates, plural, Out};
use crate::model::{Money, PaymentRecord};
use crate::{Config, Mode, Result};
use std::fmt::Write;

/// Lists the payments that match the filters, in the order they were added.
///
/// # Returns
///
/// On success, returns an `Out` containing:
/// - A message with one line per payment.
/// - The matching `PaymentRecord` objects.
///
/// # Errors
///
/// - Returns an `Auth` error if nobody is logged in.
/// - Returns a `DataUnavailable` error if the payments cannot be loaded.
pub async fn list(config: &Config, mode: Mode, args: &FilterArgs) -> Result<Out<Vec<PaymentRecord>>> {
    let store = open_store(config, mode).await?;
    let found: Vec<PaymentRecord> = store
        .filter(&args.criteria())
        .into_iter()
        .cloned()
        .collect();

    let mut message = format!("Found {} payment{}", found.len(), plural(found.len()));
    for payment in &found {
        let _ = write!(message, "\n  {}", describe(payment));
    }
    Ok(Out::new(message, found))
}

/// Adds a payment. `totalDebt` and `remaining` are computed from the given amounts.
///
/// # Errors
///
/// - Returns an `Auth` error if nobody is logged in or GitHub rejects the credential.
/// - Returns a `SaveFailed` error if the document could not be written. The payment is not saved.
pub async fn add(config: &Config, mode: Mode, args: &AddArgs) -> Result<Out<PaymentRecord>> {
    let mut store = open_store_with_rates(config, mode).await?;
    let created = store.create(args.new_payment()).await?;
    Ok(Out::new(
        format!("Added payment {}", describe(&created)),
        created,
    ))
}

/// Changes the fields of a payment that are given in `args`.
///
/// When any of the amounts change, `totalDebt` and `remaining` are recomputed from the merged
/// values before the change is handed to the store.
///
/// # Errors
///
/// - Returns a `NotFound` error if there is no payment with the id.
/// - Returns an `Auth` error if nobody is logged in or GitHub rejects the credential.
/// - Returns a `SaveFailed` error if the document could not be written.
pub async fn update(config: &Config, mode: Mode, args: &UpdateArgs) -> Result<Out<PaymentRecord>> {
    let mut store = open_store_with_rates(config, mode).await?;
    let id = args.id();
    let mut updates = args.updates();
    if updates.touches_amounts() {
        updates = updates.with_recomputed_totals(store.get(id)?);
    }
    let updated = store.update(id, updates).await?;
    Ok(Out::new(
        format!("Updated payment {}", describe(&updated)),
        updated,
    ))
}

/// Deletes a payment. Deleting an id that does not exist is not an error.
///
/// # Errors
///
/// - Returns an `Auth` error if nobody is logged in or GitHub rejects the credential.
/// - Returns a `SaveFailed` error if the document could not be written.
pub async fn delete(config: &Config, mode: Mode, args: &DeleteArgs) -> Result<Out<bool>> {
    let mut store = open_store_with_rates(config, mode).await?;
    let id = args.id();
    let removed = store.delete(id).await?;
    let message = if removed {
        format!("Deleted payment {id}")
    } else {
        format!("There is no payment {id}, nothing was deleted")
    };
    Ok(Out::new(message, removed))
}

/// A one-line description of a payment for messages.
fn describe(p: &PaymentRecord) -> String {
    let company = if p.company_name().is_empty() {
        String::new()
    } else {
        format!(" ({})", p.company_name())
    };
    format!(
        "#{} {}{company}: total {}, paid {}, remaining {} [{}]",
        p.id(),
        p.item_name(),
        Money::new(p.total_debt(), p.currency()),
        Money::new(p.paid(), p.currency()),
        Money::new(p.remaining(), p.currency()),
        p.invoice_status(),
    )
}

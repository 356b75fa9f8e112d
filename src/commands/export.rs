use crate::args::ExportArgs;
use crate::commands::{open_store, plural, Out};
use crate::error::{ErrorType, IntoResult, Res};
use crate::model::PaymentRecord;
use crate::{utils, Config, Mode, Result};
use anyhow::Context;
use serde::Serialize;
use std::path::PathBuf;

/// Spreadsheet programs need the byte order mark to detect UTF-8.
const BOM: &[u8] = b"\xEF\xBB\xBF";

const HEADERS: [&str; 9] = [
    "ID",
    "Item",
    "Company",
    "Service",
    "Project",
    "Currency",
    "Total Debt",
    "Remaining",
    "Status",
];

#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub path: PathBuf,
    pub rows: usize,
}

/// Writes the payments that match the filters to a CSV file.
///
/// # Errors
///
/// - Returns an `Auth` error if nobody is logged in.
/// - Returns an `Internal` error if the file cannot be written.
pub async fn export(config: &Config, mode: Mode, args: &ExportArgs) -> Result<Out<ExportReport>> {
    let store = open_store(config, mode).await?;
    let payments = store.filter(&args.filter().criteria());
    let csv = to_csv(&payments).pub_result(ErrorType::Internal)?;
    utils::write(args.output(), csv)
        .await
        .pub_result(ErrorType::Internal)?;

    let report = ExportReport {
        path: args.output().to_path_buf(),
        rows: payments.len(),
    };
    Ok(Out::new(
        format!(
            "Exported {} payment{} to {}",
            report.rows,
            plural(report.rows),
            report.path.display()
        ),
        report,
    ))
}

fn to_csv(payments: &[&PaymentRecord]) -> Res<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(BOM.to_vec());
    writer.write_record(HEADERS)?;
    for p in payments {
        writer.write_record([
            p.id().to_string(),
            p.item_name().to_string(),
            p.company_name().to_string(),
            p.service_type().to_string(),
            p.project_name().to_string(),
            p.currency().to_string(),
            p.total_debt().to_string(),
            p.remaining().to_string(),
            p.invoice_status().to_string(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("{}", e.error()))
        .context("Unable to finish writing CSV")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::FilterArgs;
    use crate::filter::FilterCriteria;
    use crate::model::InvoiceStatus;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_export() {
        let env = TestEnv::new().await;
        let output = env.config().root().join("export.csv");
        let filter = FilterArgs::from(FilterCriteria {
            invoice_status: Some(InvoiceStatus::Invoiced),
            ..FilterCriteria::default()
        });
        let out = export(&env.config(), Mode::Test, &ExportArgs::new(filter, &output))
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap().rows, 2);

        let bytes = std::fs::read(&output).unwrap();
        assert!(bytes.starts_with(BOM));
        let text = String::from_utf8(bytes[BOM.len()..].to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "ID,Item,Company,Service,Project,Currency,Total Debt,Remaining,Status"
        );
        assert_eq!(
            lines[1],
            "1,Sunucu kiralama,Acme Hosting,Hosting,Web Sitesi,USD,160,60,invoiced"
        );
        assert_eq!(lines.len(), 3);
    }
}

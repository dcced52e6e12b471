use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate};
use std::io::Read;

use crate::application::LedgerService;
use crate::domain::{AccountId, parse_amount};

/// Result of an import operation
#[derive(Debug, Clone)]
pub struct ImportResult {
    pub imported: usize,
    pub errors: Vec<ImportError>,
}

/// Error that occurred during import
#[derive(Debug, Clone)]
pub struct ImportError {
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub dry_run: bool,
}

/// Importer for loading balance history into the ledger
pub struct Importer<'a> {
    service: &'a LedgerService,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Import balance entries for an account from CSV.
    ///
    /// The header must name a `date` and a `value` column; other columns are
    /// ignored, so a history export can be imported back as is. Invalid rows
    /// are reported and skipped. Storage failures abort the import.
    pub async fn import_history_csv<R: Read>(
        &self,
        account_id: AccountId,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let mut csv_reader = csv::Reader::from_reader(reader);

        let headers = csv_reader.headers().context("Failed to read CSV header")?;
        let date_col = column_index(headers, "date")?;
        let value_col = column_index(headers, "value")?;

        let mut imported = 0;
        let mut errors = Vec::new();

        for (line_num, result) in csv_reader.records().enumerate() {
            let line = line_num + 2; // +2 for header and 0-indexing

            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: None,
                        error: format!("CSV parse error: {}", e),
                    });
                    continue;
                }
            };

            let date = match parse_date(record.get(date_col).unwrap_or("")) {
                Ok(d) => d,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: Some("date".to_string()),
                        error: format!("Invalid date: {}", e),
                    });
                    continue;
                }
            };

            let value = match parse_amount(record.get(value_col).unwrap_or("")) {
                Ok(v) => v,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: Some("value".to_string()),
                        error: format!("Invalid value: {}", e),
                    });
                    continue;
                }
            };

            if !options.dry_run {
                self.service
                    .record_balance(account_id, value, date)
                    .await
                    .with_context(|| format!("Failed to import line {}", line))?;
            }
            imported += 1;
        }

        Ok(ImportResult { imported, errors })
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| anyhow::anyhow!("Missing '{}' column in CSV header", name))
}

// Accepts YYYY-MM-DD or a full RFC3339 timestamp (its date part is kept)
fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }

    anyhow::bail!("'{}' is not a YYYY-MM-DD date", s)
}

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::LedgerService;
use crate::domain::{Account, AccountId, MonthlyReport};

/// Monthly evolution of one account, as written by the JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountReportSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub account: Account,
    pub reports: Vec<MonthlyReport>,
}

/// Exporter for converting balance data to various formats
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export an account's balance history to CSV format
    pub async fn export_history_csv<W: Write>(
        &self,
        account_id: AccountId,
        writer: W,
    ) -> Result<usize> {
        let history = self.service.balance_history(account_id).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["id", "date", "value"])?;

        for entry in &history {
            csv_writer.write_record([
                entry.id.to_string(),
                entry.date.format("%Y-%m-%d").to_string(),
                entry.value.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(history.len())
    }

    /// Export an account's monthly reports to CSV format
    pub async fn export_reports_csv<W: Write>(
        &self,
        account_id: AccountId,
        writer: W,
    ) -> Result<usize> {
        let reports = self.service.monthly_reports(account_id).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "year",
            "month",
            "date",
            "value",
            "evolution_value",
            "evolution_ratio",
        ])?;

        for report in &reports {
            csv_writer.write_record([
                report.year().to_string(),
                report.month().to_string(),
                report.date().format("%Y-%m-%d").to_string(),
                report.value().to_string(),
                report.evolution_value.to_string(),
                report.evolution_ratio.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(reports.len())
    }

    /// Export an account's monthly reports as a JSON snapshot
    pub async fn export_reports_json<W: Write>(
        &self,
        account_id: AccountId,
        mut writer: W,
    ) -> Result<AccountReportSnapshot> {
        let account = self.service.get_account(account_id).await?;
        let reports = self.service.monthly_reports(account_id).await?;

        let snapshot = AccountReportSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            account,
            reports,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}

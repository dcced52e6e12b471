use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::application::LedgerService;
use crate::domain::{AccountId, BalanceEntry, EntryId, format_amount, format_ratio, parse_amount};
use crate::storage::StoreLocation;

/// Balancebook - account balances and their monthly evolution
#[derive(Parser)]
#[command(name = "balancebook")]
#[command(about = "Record account balances over time and follow their month-by-month evolution")]
#[command(version)]
pub struct Cli {
    /// Database file path (":memory:" for a throwaway database)
    #[arg(short, long, env = "BALANCEBOOK_DB", default_value = "balancebook.db")]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Balance entry commands
    #[command(subcommand)]
    Entry(EntryCommands),

    /// Month-by-month evolution of an account
    Report {
        /// Account ID
        account: AccountId,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Export an account's data to CSV or JSON
    Export {
        /// What to export: history, reports
        export_type: String,

        /// Account ID
        account: AccountId,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Output format: csv, or json for reports
        #[arg(short, long, default_value = "csv")]
        format: String,
    },

    /// Import balance history from CSV (columns: date, value)
    Import {
        /// Account ID
        account: AccountId,

        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Validate without importing
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a new account
    Add {
        /// Account name
        name: String,
    },

    /// List all accounts
    List,

    /// Rename an account
    Rename {
        /// Account ID
        id: AccountId,

        /// New name
        name: String,
    },

    /// Delete an account and all of its balance entries
    Delete {
        /// Account ID
        id: AccountId,
    },

    /// Show account details
    Show {
        /// Account ID
        id: AccountId,
    },
}

#[derive(Subcommand)]
pub enum EntryCommands {
    /// Record a balance for an account
    Add {
        /// Account ID
        account: AccountId,

        /// Balance value (e.g., "1234.56")
        value: String,

        /// Observation date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Replace a balance entry
    Update {
        /// Entry ID
        id: EntryId,

        /// Account ID
        account: AccountId,

        /// Balance value
        value: String,

        /// Observation date (YYYY-MM-DD)
        date: String,
    },

    /// Delete a balance entry
    Delete {
        /// Entry ID
        id: EntryId,
    },

    /// List the balance history of an account
    List {
        /// Account ID
        account: AccountId,
    },
}

impl Cli {
    /// Install the log subscriber. `RUST_LOG` wins over `--verbose`.
    pub fn init_tracing(&self) {
        let default_filter = if self.verbose {
            "balancebook=debug"
        } else {
            "warn"
        };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init();
    }

    pub async fn run(self) -> Result<()> {
        let location = StoreLocation::parse(&self.database);

        match self.command {
            Commands::Init => {
                let service = LedgerService::init(location).await?;
                println!("Database initialized: {}", service.location());
                if service.location().is_memory() {
                    println!("Note: an in-memory database is discarded when the process exits");
                }
            }

            Commands::Account(account_cmd) => {
                let service = LedgerService::open(location);
                run_account_command(&service, account_cmd).await?;
            }

            Commands::Entry(entry_cmd) => {
                let service = LedgerService::open(location);
                run_entry_command(&service, entry_cmd).await?;
            }

            Commands::Report { account, format } => {
                let service = LedgerService::open(location);
                run_report_command(&service, account, &format).await?;
            }

            Commands::Export {
                export_type,
                account,
                output,
                format,
            } => {
                let service = LedgerService::open(location);
                run_export_command(&service, &export_type, account, output.as_deref(), &format)
                    .await?;
            }

            Commands::Import {
                account,
                input,
                dry_run,
            } => {
                let service = LedgerService::open(location);
                run_import_command(&service, account, input.as_deref(), dry_run).await?;
            }
        }

        Ok(())
    }
}

async fn run_account_command(service: &LedgerService, cmd: AccountCommands) -> Result<()> {
    match cmd {
        AccountCommands::Add { name } => {
            let account = service.create_account(name).await?;
            println!("Created account: {} ({})", account.name, account.id);
        }

        AccountCommands::List => {
            let accounts = service.list_accounts().await?;
            if accounts.is_empty() {
                println!("No accounts found.");
            } else {
                println!("{:>6}  {:<30}", "ID", "NAME");
                println!("{}", "-".repeat(38));
                for account in accounts {
                    println!("{:>6}  {:<30}", account.id, truncate(&account.name, 30));
                }
            }
        }

        AccountCommands::Rename { id, name } => {
            // Fail loudly on the CLI; the service itself treats unknown IDs as no-ops.
            service.get_account(id).await?;
            service.rename_account(id, name.clone()).await?;
            println!("Renamed account {} to {}", id, name);
        }

        AccountCommands::Delete { id } => {
            let account = service.get_account(id).await?;
            service.delete_account(id).await?;
            println!("Deleted account: {} ({})", account.name, id);
        }

        AccountCommands::Show { id } => {
            let overview = service.account_overview(id).await?;

            println!("Account: {}", overview.account.name);
            println!("  ID:           {}", overview.account.id);
            println!("  Entries:      {}", overview.entry_count);
            if let Some(latest) = &overview.latest {
                println!(
                    "  Balance:      {} (as of {})",
                    format_amount(latest.value),
                    latest.date.format("%Y-%m-%d")
                );
            }
        }
    }
    Ok(())
}

async fn run_entry_command(service: &LedgerService, cmd: EntryCommands) -> Result<()> {
    match cmd {
        EntryCommands::Add {
            account,
            value,
            date,
        } => {
            let value = parse_amount(&value).context("Invalid value. Use '1234.56' or '1234'")?;
            let date = match date {
                Some(date_str) => parse_date(&date_str)?,
                None => Local::now().date_naive(),
            };

            let entry = service.record_balance(account, value, date).await?;
            println!(
                "Recorded balance {} on {} for account {} ({})",
                format_amount(entry.value),
                entry.date.format("%Y-%m-%d"),
                entry.account_id,
                entry.id
            );
        }

        EntryCommands::Update {
            id,
            account,
            value,
            date,
        } => {
            let entry = BalanceEntry {
                id,
                value: parse_amount(&value).context("Invalid value. Use '1234.56' or '1234'")?,
                date: parse_date(&date)?,
                account_id: account,
            };
            service.update_balance_entry(&entry).await?;
            println!("Updated balance entry {}", id);
        }

        EntryCommands::Delete { id } => {
            service.delete_balance_entry(id).await?;
            println!("Deleted balance entry {}", id);
        }

        EntryCommands::List { account } => {
            let history = service.balance_history(account).await?;
            if history.is_empty() {
                println!("No balance entries found.");
            } else {
                println!("{:>6}  {:<10}  {:>14}", "ID", "DATE", "VALUE");
                println!("{}", "-".repeat(34));
                for entry in history {
                    println!(
                        "{:>6}  {:<10}  {:>14}",
                        entry.id,
                        entry.date.format("%Y-%m-%d"),
                        format_amount(entry.value)
                    );
                }
            }
        }
    }
    Ok(())
}

async fn run_report_command(
    service: &LedgerService,
    account_id: AccountId,
    format: &str,
) -> Result<()> {
    let account = service.get_account(account_id).await?;
    let reports = service.monthly_reports(account_id).await?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        "csv" => {
            println!("year,month,date,value,evolution_value,evolution_ratio");
            for report in &reports {
                println!(
                    "{},{},{},{},{},{}",
                    report.year(),
                    report.month(),
                    report.date().format("%Y-%m-%d"),
                    report.value(),
                    report.evolution_value,
                    report.evolution_ratio
                );
            }
        }
        "table" => {
            println!("Monthly Evolution: {}", account.name);
            println!();
            if reports.is_empty() {
                println!("No balance entries recorded.");
                return Ok(());
            }

            println!(
                "{:<8} {:<10} {:>14} {:>14} {:>10}",
                "MONTH", "DATE", "BALANCE", "CHANGE", "CHANGE %"
            );
            println!("{}", "-".repeat(60));

            for report in &reports {
                println!(
                    "{:<8} {:<10} {:>14} {:>14} {:>10}",
                    format!("{}-{:02}", report.year(), report.month()),
                    report.date().format("%Y-%m-%d"),
                    format_amount(report.value()),
                    format_amount(report.evolution_value),
                    format_ratio(report.evolution_ratio)
                );
            }
        }
        other => {
            anyhow::bail!(
                "Invalid report format '{}'. Valid formats: table, json, csv",
                other
            );
        }
    }

    Ok(())
}

async fn run_export_command(
    service: &LedgerService,
    export_type: &str,
    account_id: AccountId,
    output: Option<&str>,
    format: &str,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    // Reject bad arguments before touching the output file
    let kind = ExportKind::parse(export_type, format)?;
    let exporter = Exporter::new(service);

    // Determine output writer
    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match kind {
        ExportKind::HistoryCsv => {
            let count = exporter.export_history_csv(account_id, writer).await?;
            if output.is_some() {
                eprintln!("Exported {} balance entries", count);
            }
        }
        ExportKind::ReportsJson => {
            let snapshot = exporter.export_reports_json(account_id, writer).await?;
            if output.is_some() {
                eprintln!(
                    "Exported {} monthly reports for {}",
                    snapshot.reports.len(),
                    snapshot.account.name
                );
            }
        }
        ExportKind::ReportsCsv => {
            let count = exporter.export_reports_csv(account_id, writer).await?;
            if output.is_some() {
                eprintln!("Exported {} monthly reports", count);
            }
        }
    }

    Ok(())
}

/// Supported `export` type and format pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExportKind {
    HistoryCsv,
    ReportsCsv,
    ReportsJson,
}

impl ExportKind {
    fn parse(export_type: &str, format: &str) -> Result<Self> {
        match (export_type, format) {
            ("history", "csv") => Ok(ExportKind::HistoryCsv),
            ("reports", "csv") => Ok(ExportKind::ReportsCsv),
            ("reports", "json") => Ok(ExportKind::ReportsJson),
            ("history", _) => {
                anyhow::bail!("Invalid history export format '{}'. Valid formats: csv", format)
            }
            ("reports", _) => {
                anyhow::bail!(
                    "Invalid reports export format '{}'. Valid formats: csv, json",
                    format
                )
            }
            _ => anyhow::bail!(
                "Invalid export type '{}'. Valid types: history, reports",
                export_type
            ),
        }
    }
}

async fn run_import_command(
    service: &LedgerService,
    account_id: AccountId,
    input: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    use crate::io::{ImportOptions, Importer};
    use std::fs::File;
    use std::io::{Read, stdin};

    service.get_account(account_id).await?;
    let importer = Importer::new(service);

    // Determine input reader
    let reader: Box<dyn Read> = match input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open input file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdin()),
    };

    let result = importer
        .import_history_csv(account_id, reader, ImportOptions { dry_run })
        .await?;

    if dry_run {
        println!("Validation successful");
    } else {
        println!("Import complete");
    }
    println!("  Imported: {}", result.imported);
    println!("  Errors:   {}", result.errors.len());

    if !result.errors.is_empty() {
        println!("\nErrors:");
        for error in result.errors.iter().take(10) {
            println!(
                "  Line {}: {}",
                error.line,
                error
                    .field
                    .as_ref()
                    .map(|f| format!("{}: ", f))
                    .unwrap_or_default()
                    + &error.error
            );
        }
        if result.errors.len() > 10 {
            println!("  ... and {} more errors", result.errors.len() - 10);
        }
    }

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str))
}

// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use balancebook::application::LedgerService;
use balancebook::domain::{Account, BalanceEntry};
use balancebook::storage::StoreLocation;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database file
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(StoreLocation::File(db_path)).await?;
    Ok((service, temp_dir))
}

/// Helper to create a test service on a throwaway in-memory database
pub fn memory_service() -> LedgerService {
    LedgerService::in_memory()
}

/// Helper to parse a YYYY-MM-DD string into a NaiveDate
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Test fixture: an account with balances spread over July, August and October 2025
pub struct SampleHistory;

impl SampleHistory {
    /// Two July entries (100 then 150), one in August (350), none in
    /// September, one in October (300).
    pub async fn create(service: &LedgerService) -> Result<Account> {
        let account = service.create_account("Test Account").await?;
        for (date, value) in [
            ("2025-07-10", 100),
            ("2025-07-25", 150),
            ("2025-08-05", 350),
            ("2025-10-15", 300),
        ] {
            service
                .record_balance(account.id, Decimal::from(value), parse_date(date))
                .await?;
        }
        Ok(account)
    }
}

/// Values of a history, in returned order
pub fn values(history: &[BalanceEntry]) -> Vec<Decimal> {
    history.iter().map(|e| e.value).collect()
}

mod common;

use anyhow::Result;
use balancebook::application::{AppError, LedgerService};
use balancebook::domain::{Account, BalanceEntry};
use balancebook::storage::{Repository, StoreLocation};
use chrono::NaiveDate;
use common::{memory_service, parse_date, test_service, values};
use rust_decimal_macros::dec;
use std::collections::HashSet;

#[tokio::test]
async fn test_add_account_is_listed_back() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let account = service.create_account("Compte Courant").await?;
    assert_ne!(account.id, 0);

    let accounts = service.list_accounts().await?;
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].name, "Compte Courant");
    assert_eq!(accounts[0].id, account.id);

    Ok(())
}

#[tokio::test]
async fn test_account_ids_are_unique() -> Result<()> {
    let (service, _temp) = test_service().await?;

    for name in ["Checking", "Savings", "Checking", ""] {
        service.create_account(name).await?;
    }

    let accounts = service.list_accounts().await?;
    let ids: HashSet<_> = accounts.iter().map(|a| a.id).collect();
    assert_eq!(accounts.len(), 4);
    assert_eq!(ids.len(), 4);

    // Names are not unique and may be empty
    assert_eq!(accounts.iter().filter(|a| a.name == "Checking").count(), 2);
    assert!(accounts.iter().any(|a| a.name.is_empty()));

    Ok(())
}

#[tokio::test]
async fn test_repository_writes_assigned_ids_back() -> Result<()> {
    let repo = Repository::in_memory();

    let mut account = Account::new("Livret A");
    let account_id = repo.add_account(&mut account).await?;
    assert_eq!(account.id, account_id);

    let mut entry = BalanceEntry::new(account_id, dec!(12.5), parse_date("2025-01-01"));
    let entry_id = repo.add_balance_entry(&mut entry).await?;
    assert_eq!(entry.id, entry_id);
    assert_ne!(entry_id, 0);

    Ok(())
}

#[tokio::test]
async fn test_history_is_ordered_by_date() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let account = service.create_account("Livret A").await?;

    // Insert out of order
    service
        .record_balance(account.id, dec!(1000), parse_date("2025-03-15"))
        .await?;
    service
        .record_balance(account.id, dec!(200), parse_date("2025-03-07"))
        .await?;
    service
        .record_balance(account.id, dec!(500), parse_date("2025-03-14"))
        .await?;

    let history = service.balance_history(account.id).await?;

    assert_eq!(history.len(), 3);
    assert_eq!(values(&history), vec![dec!(200), dec!(500), dec!(1000)]);

    Ok(())
}

#[tokio::test]
async fn test_history_is_ordered_for_years_beyond_four_digits() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let account = service.create_account("Long range").await?;
    let new_year = |year: i32| NaiveDate::from_ymd_opt(year, 1, 1).unwrap();

    for year in [10000, 2025, -1, -2] {
        service
            .record_balance(account.id, dec!(1), new_year(year))
            .await?;
    }

    let history = service.balance_history(account.id).await?;
    let dates: Vec<NaiveDate> = history.iter().map(|e| e.date).collect();
    assert_eq!(
        dates,
        vec![new_year(-2), new_year(-1), new_year(2025), new_year(10000)]
    );

    let overview = service.account_overview(account.id).await?;
    assert_eq!(overview.latest.map(|e| e.date), Some(new_year(10000)));

    Ok(())
}

#[tokio::test]
async fn test_history_only_contains_the_account_entries() -> Result<()> {
    let service = memory_service();
    let checking = service.create_account("Checking").await?;
    let savings = service.create_account("Savings").await?;

    service
        .record_balance(checking.id, dec!(10), parse_date("2025-01-01"))
        .await?;
    service
        .record_balance(savings.id, dec!(20), parse_date("2025-01-02"))
        .await?;

    let history = service.balance_history(checking.id).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].account_id, checking.id);

    Ok(())
}

#[tokio::test]
async fn test_decimal_values_round_trip_exactly() -> Result<()> {
    let service = memory_service();
    let account = service.create_account("Brokerage").await?;

    for value in [dec!(0.1), dec!(-42.125), dec!(1234567890.0000001)] {
        service
            .record_balance(account.id, value, parse_date("2025-06-01"))
            .await?;
    }

    let history = service.balance_history(account.id).await?;
    assert_eq!(
        values(&history),
        vec![dec!(0.1), dec!(-42.125), dec!(1234567890.0000001)]
    );

    Ok(())
}

#[tokio::test]
async fn test_update_account_changes_name() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let mut account = service.create_account("Ancien Nom").await?;

    account.name = "Nouveau Nom".to_string();
    service.update_account(&account).await?;

    let updated = service.list_accounts().await?;
    assert_eq!(updated[0].name, "Nouveau Nom");

    service.rename_account(account.id, "Encore").await?;
    assert_eq!(service.get_account(account.id).await?.name, "Encore");

    Ok(())
}

#[tokio::test]
async fn test_update_unknown_account_is_a_noop() -> Result<()> {
    let service = memory_service();
    let account = service.create_account("Kept").await?;

    service.rename_account(account.id + 100, "Ghost").await?;

    let accounts = service.list_accounts().await?;
    assert_eq!(accounts, vec![account]);

    Ok(())
}

#[tokio::test]
async fn test_delete_account_removes_its_entries() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let account = service.create_account("Compte à supprimer").await?;
    service
        .record_balance(account.id, dec!(100), parse_date("2025-01-01"))
        .await?;
    service
        .record_balance(account.id, dec!(200), parse_date("2025-02-01"))
        .await?;

    service.delete_account(account.id).await?;

    assert!(service.list_accounts().await?.is_empty());
    assert!(service.balance_history(account.id).await?.is_empty());
    assert!(service.monthly_reports(account.id).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_delete_account_keeps_other_accounts() -> Result<()> {
    let service = memory_service();
    let doomed = service.create_account("Old card").await?;
    let kept = service.create_account("Checking").await?;
    service
        .record_balance(doomed.id, dec!(1), parse_date("2025-01-01"))
        .await?;
    service
        .record_balance(kept.id, dec!(2), parse_date("2025-01-01"))
        .await?;

    service.delete_account(doomed.id).await?;

    assert_eq!(service.list_accounts().await?, vec![kept.clone()]);
    assert_eq!(values(&service.balance_history(kept.id).await?), vec![dec!(2)]);

    Ok(())
}

#[tokio::test]
async fn test_entries_for_unknown_account_are_accepted_and_cleaned_up() -> Result<()> {
    let service = memory_service();

    // No account 42 exists; the insert is not rejected
    let orphan = service
        .record_balance(42, dec!(5), parse_date("2025-01-01"))
        .await?;
    assert_eq!(service.balance_history(42).await?, vec![orphan]);

    // Deleting the (missing) account still clears the entries referencing it
    service.delete_account(42).await?;
    assert!(service.balance_history(42).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_update_balance_entry_changes_only_that_entry() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let account = service.create_account("Compte test").await?;
    let mut entry = service
        .record_balance(account.id, dec!(1234), parse_date("2025-01-10"))
        .await?;
    service
        .record_balance(account.id, dec!(999), parse_date("2025-01-20"))
        .await?;

    entry.value = dec!(5678);
    service.update_balance_entry(&entry).await?;

    let history = service.balance_history(account.id).await?;
    assert_eq!(values(&history), vec![dec!(5678), dec!(999)]);

    Ok(())
}

#[tokio::test]
async fn test_update_balance_entry_date_reorders_history() -> Result<()> {
    let service = memory_service();
    let account = service.create_account("Compte test").await?;
    let mut first = service
        .record_balance(account.id, dec!(1), parse_date("2025-01-01"))
        .await?;
    service
        .record_balance(account.id, dec!(2), parse_date("2025-01-15"))
        .await?;

    first.date = parse_date("2025-02-01");
    service.update_balance_entry(&first).await?;

    let history = service.balance_history(account.id).await?;
    assert_eq!(values(&history), vec![dec!(2), dec!(1)]);

    Ok(())
}

#[tokio::test]
async fn test_delete_balance_entry_removes_only_one_entry() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let account = service.create_account("Compte test").await?;
    let to_delete = service
        .record_balance(account.id, dec!(100), parse_date("2025-01-01"))
        .await?;
    let to_keep = service
        .record_balance(account.id, dec!(200), parse_date("2025-01-01"))
        .await?;

    service.delete_balance_entry(to_delete.id).await?;

    let history = service.balance_history(account.id).await?;
    assert_eq!(history, vec![to_keep]);

    // Deleting again is a no-op
    service.delete_balance_entry(to_delete.id).await?;
    assert_eq!(service.balance_history(account.id).await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_get_unknown_account_is_not_found() -> Result<()> {
    let service = memory_service();

    let result = service.get_account(7).await;
    assert!(matches!(result, Err(AppError::AccountNotFound(7))));

    Ok(())
}

#[tokio::test]
async fn test_account_overview() -> Result<()> {
    let service = memory_service();
    let account = service.create_account("Savings").await?;
    service
        .record_balance(account.id, dec!(300), parse_date("2025-05-31"))
        .await?;
    service
        .record_balance(account.id, dec!(100), parse_date("2025-04-30"))
        .await?;

    let overview = service.account_overview(account.id).await?;
    assert_eq!(overview.account, account);
    assert_eq!(overview.entry_count, 2);
    assert_eq!(overview.latest.map(|e| e.value), Some(dec!(300)));

    let empty = service.create_account("Empty").await?;
    let overview = service.account_overview(empty.id).await?;
    assert_eq!(overview.entry_count, 0);
    assert!(overview.latest.is_none());

    Ok(())
}

#[tokio::test]
async fn test_file_database_persists_across_services() -> Result<()> {
    let temp_dir = tempfile::TempDir::new()?;
    let location = StoreLocation::File(temp_dir.path().join("persist.db"));

    {
        let service = LedgerService::open(location.clone());
        let account = service.create_account("Durable").await?;
        service
            .record_balance(account.id, dec!(42.42), parse_date("2025-09-09"))
            .await?;
    }

    let reopened = LedgerService::open(location);
    let accounts = reopened.list_accounts().await?;
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].name, "Durable");
    assert_eq!(
        values(&reopened.balance_history(accounts[0].id).await?),
        vec![dec!(42.42)]
    );

    Ok(())
}

#[tokio::test]
async fn test_memory_databases_are_independent() -> Result<()> {
    let first = memory_service();
    let second = memory_service();

    first.create_account("Only here").await?;

    assert_eq!(first.list_accounts().await?.len(), 1);
    assert!(second.list_accounts().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_undecodable_value_reports_storage_fault() -> Result<()> {
    let temp_dir = tempfile::TempDir::new()?;
    let db_path = temp_dir.path().join("damaged.db");
    let service = LedgerService::init(StoreLocation::File(db_path.clone())).await?;
    let account = service.create_account("Damaged").await?;
    service
        .record_balance(account.id, dec!(10), parse_date("2025-01-01"))
        .await?;

    // Corrupt the stored value behind the service's back
    let raw = sqlx::SqlitePool::connect(&format!("sqlite:{}", db_path.display())).await?;
    sqlx::query("UPDATE balance_entries SET value = 'not-a-number'")
        .execute(&raw)
        .await?;
    raw.close().await;

    match service.balance_history(account.id).await {
        Err(AppError::Storage(fault)) => {
            assert_eq!(fault.operation, "list_balance_history");
            assert!(matches!(*fault.source, sqlx::Error::Decode(_)));
        }
        other => panic!("Expected a storage fault, got {:?}", other),
    }

    Ok(())
}

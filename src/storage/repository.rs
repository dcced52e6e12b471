use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::domain::{Account, AccountId, BalanceEntry, EntryId};

use super::error::FaultContext;
use super::{MIGRATION_001_INITIAL, StorageFault, StoreLocation};

/// Repository for persisting and querying accounts and balance entries.
///
/// Construction does no I/O. The pool is opened and the schema created on
/// the first operation, exactly once, even when that first access happens
/// from several tasks at the same time.
pub struct Repository {
    location: StoreLocation,
    pool: OnceCell<Result<SqlitePool, StorageFault>>,
}

impl Repository {
    /// Create a repository for the given location. Nothing is opened yet.
    pub fn new(location: StoreLocation) -> Self {
        Self {
            location,
            pool: OnceCell::new(),
        }
    }

    /// Create a repository backed by a volatile in-memory database.
    pub fn in_memory() -> Self {
        Self::new(StoreLocation::Memory)
    }

    /// Where this repository keeps its data.
    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    /// Open the store now instead of on first use.
    pub async fn init(&self) -> Result<(), StorageFault> {
        self.pool().await.map(|_| ())
    }

    /// The shared pool, set up on first call. A failed setup is remembered
    /// and returned to every caller.
    async fn pool(&self) -> Result<&SqlitePool, StorageFault> {
        self.pool
            .get_or_init(|| self.connect_and_migrate())
            .await
            .as_ref()
            .map_err(Clone::clone)
    }

    async fn connect_and_migrate(&self) -> Result<SqlitePool, StorageFault> {
        debug!(location = %self.location, "Opening balance store");

        let options = self.location.connect_options().fault("initialize")?;
        let pool = self
            .location
            .pool_options()
            .connect_with(options)
            .await
            .fault("initialize")?;

        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&pool)
            .await
            .fault("initialize")?;

        info!(location = %self.location, "Balance store ready");
        Ok(pool)
    }

    // ========================
    // Account operations
    // ========================

    /// List all accounts.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, StorageFault> {
        let rows = sqlx::query("SELECT id, name FROM accounts ORDER BY id")
            .fetch_all(self.pool().await?)
            .await
            .fault("list_accounts")?;

        rows.iter()
            .map(Self::row_to_account)
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .fault("list_accounts")
    }

    /// Get an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>, StorageFault> {
        let row = sqlx::query("SELECT id, name FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool().await?)
            .await
            .fault("get_account")?;

        row.as_ref()
            .map(Self::row_to_account)
            .transpose()
            .fault("get_account")
    }

    /// Insert a new account. The assigned ID is written back into `account`
    /// and returned.
    pub async fn add_account(&self, account: &mut Account) -> Result<AccountId, StorageFault> {
        let result = sqlx::query("INSERT INTO accounts (name) VALUES (?)")
            .bind(&account.name)
            .execute(self.pool().await?)
            .await
            .fault("add_account")?;

        account.id = result.last_insert_rowid();
        debug!(account_id = account.id, "Added account");
        Ok(account.id)
    }

    /// Replace the stored account with the same ID. Unknown IDs are ignored.
    pub async fn update_account(&self, account: &Account) -> Result<(), StorageFault> {
        let result = sqlx::query("UPDATE accounts SET name = ? WHERE id = ?")
            .bind(&account.name)
            .bind(account.id)
            .execute(self.pool().await?)
            .await
            .fault("update_account")?;

        debug!(
            account_id = account.id,
            rows = result.rows_affected(),
            "Updated account"
        );
        Ok(())
    }

    /// Delete an account together with all of its balance entries.
    pub async fn delete_account(&self, id: AccountId) -> Result<(), StorageFault> {
        let mut tx = self
            .pool()
            .await?
            .begin()
            .await
            .fault("delete_account")?;

        let entries = sqlx::query("DELETE FROM balance_entries WHERE account_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .fault("delete_account")?;

        sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .fault("delete_account")?;

        tx.commit().await.fault("delete_account")?;

        debug!(
            account_id = id,
            entries = entries.rows_affected(),
            "Deleted account"
        );
        Ok(())
    }

    fn row_to_account(row: &SqliteRow) -> Result<Account, sqlx::Error> {
        Ok(Account {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
        })
    }

    // ========================
    // Balance entry operations
    // ========================

    /// Insert a new balance entry. The assigned ID is written back into
    /// `entry` and returned.
    pub async fn add_balance_entry(
        &self,
        entry: &mut BalanceEntry,
    ) -> Result<EntryId, StorageFault> {
        let result = sqlx::query(
            r#"
            INSERT INTO balance_entries (value, date, account_id)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(entry.value.to_string())
        .bind(entry.date.num_days_from_ce())
        .bind(entry.account_id)
        .execute(self.pool().await?)
        .await
        .fault("add_balance_entry")?;

        entry.id = result.last_insert_rowid();
        debug!(
            entry_id = entry.id,
            account_id = entry.account_id,
            "Added balance entry"
        );
        Ok(entry.id)
    }

    /// Replace the stored entry with the same ID. Unknown IDs are ignored.
    pub async fn update_balance_entry(&self, entry: &BalanceEntry) -> Result<(), StorageFault> {
        let result = sqlx::query(
            r#"
            UPDATE balance_entries
            SET value = ?, date = ?, account_id = ?
            WHERE id = ?
            "#,
        )
        .bind(entry.value.to_string())
        .bind(entry.date.num_days_from_ce())
        .bind(entry.account_id)
        .bind(entry.id)
        .execute(self.pool().await?)
        .await
        .fault("update_balance_entry")?;

        debug!(
            entry_id = entry.id,
            rows = result.rows_affected(),
            "Updated balance entry"
        );
        Ok(())
    }

    /// Delete a single balance entry. Unknown IDs are ignored.
    pub async fn delete_balance_entry(&self, id: EntryId) -> Result<(), StorageFault> {
        sqlx::query("DELETE FROM balance_entries WHERE id = ?")
            .bind(id)
            .execute(self.pool().await?)
            .await
            .fault("delete_balance_entry")?;

        debug!(entry_id = id, "Deleted balance entry");
        Ok(())
    }

    /// List the balance history of an account, oldest first.
    /// Entries on the same date keep their insertion order.
    pub async fn list_balance_history(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<BalanceEntry>, StorageFault> {
        let rows = sqlx::query(
            r#"
            SELECT id, value, date, account_id
            FROM balance_entries
            WHERE account_id = ?
            ORDER BY date, id
            "#,
        )
        .bind(account_id)
        .fetch_all(self.pool().await?)
        .await
        .fault("list_balance_history")?;

        rows.iter()
            .map(Self::row_to_entry)
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .fault("list_balance_history")
    }

    /// Most recent balance entry of an account, if any.
    pub async fn latest_balance_entry(
        &self,
        account_id: AccountId,
    ) -> Result<Option<BalanceEntry>, StorageFault> {
        let row = sqlx::query(
            r#"
            SELECT id, value, date, account_id
            FROM balance_entries
            WHERE account_id = ?
            ORDER BY date DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(account_id)
        .fetch_optional(self.pool().await?)
        .await
        .fault("latest_balance_entry")?;

        row.as_ref()
            .map(Self::row_to_entry)
            .transpose()
            .fault("latest_balance_entry")
    }

    /// Count the balance entries of an account.
    pub async fn count_balance_entries(&self, account_id: AccountId) -> Result<i64, StorageFault> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM balance_entries WHERE account_id = ?")
            .bind(account_id)
            .fetch_one(self.pool().await?)
            .await
            .fault("count_balance_entries")?;

        row.try_get::<i64, _>("count").fault("count_balance_entries")
    }

    fn row_to_entry(row: &SqliteRow) -> Result<BalanceEntry, sqlx::Error> {
        let value_str: String = row.try_get("value")?;
        let days: i32 = row.try_get("date")?;

        Ok(BalanceEntry {
            id: row.try_get("id")?,
            value: Decimal::from_str_exact(&value_str)
                .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            date: NaiveDate::from_num_days_from_ce_opt(days)
                .ok_or_else(|| sqlx::Error::Decode(format!("day {days} out of range").into()))?,
            account_id: row.try_get("account_id")?,
        })
    }
}

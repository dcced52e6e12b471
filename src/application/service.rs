use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{
    Account, AccountId, Amount, BalanceEntry, EntryId, MonthlyReport, build_monthly_reports,
};
use crate::storage::{Repository, StoreLocation};

use super::AppError;

/// Application service providing high-level operations over accounts and
/// their balance history. This is the primary interface for any client.
pub struct LedgerService {
    repo: Repository,
}

/// Detailed account information
#[derive(Debug, Clone)]
pub struct AccountOverview {
    pub account: Account,
    pub entry_count: i64,
    pub latest: Option<BalanceEntry>,
}

impl LedgerService {
    /// Create a new service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Open a service on the given location. The store is set up lazily on
    /// first use.
    pub fn open(location: StoreLocation) -> Self {
        Self::new(Repository::new(location))
    }

    /// Open a service on a volatile in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Repository::in_memory())
    }

    /// Open a service and set up the store right away.
    pub async fn init(location: StoreLocation) -> Result<Self, AppError> {
        let service = Self::open(location);
        service.repo.init().await?;
        Ok(service)
    }

    /// Where the underlying store keeps its data.
    pub fn location(&self) -> &StoreLocation {
        self.repo.location()
    }

    // ========================
    // Account operations
    // ========================

    /// Create a new account.
    pub async fn create_account(&self, name: impl Into<String>) -> Result<Account, AppError> {
        let mut account = Account::new(name);
        self.repo.add_account(&mut account).await?;
        Ok(account)
    }

    /// List all accounts.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        Ok(self.repo.list_accounts().await?)
    }

    /// Get an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Account, AppError> {
        self.repo
            .get_account(id)
            .await?
            .ok_or(AppError::AccountNotFound(id))
    }

    /// Save changes to an existing account.
    pub async fn update_account(&self, account: &Account) -> Result<(), AppError> {
        Ok(self.repo.update_account(account).await?)
    }

    /// Rename an account. Unknown IDs are left alone.
    pub async fn rename_account(
        &self,
        id: AccountId,
        name: impl Into<String>,
    ) -> Result<(), AppError> {
        let account = Account {
            id,
            name: name.into(),
        };
        self.update_account(&account).await
    }

    /// Delete an account and its whole balance history.
    pub async fn delete_account(&self, id: AccountId) -> Result<(), AppError> {
        Ok(self.repo.delete_account(id).await?)
    }

    /// Get detailed account information.
    pub async fn account_overview(&self, id: AccountId) -> Result<AccountOverview, AppError> {
        let account = self.get_account(id).await?;
        let entry_count = self.repo.count_balance_entries(id).await?;
        let latest = self.repo.latest_balance_entry(id).await?;

        Ok(AccountOverview {
            account,
            entry_count,
            latest,
        })
    }

    // ========================
    // Balance operations
    // ========================

    /// Record the balance of an account at a date.
    pub async fn record_balance(
        &self,
        account_id: AccountId,
        value: Amount,
        date: NaiveDate,
    ) -> Result<BalanceEntry, AppError> {
        let mut entry = BalanceEntry::new(account_id, value, date);
        self.repo.add_balance_entry(&mut entry).await?;
        Ok(entry)
    }

    /// Save changes to an existing balance entry.
    pub async fn update_balance_entry(&self, entry: &BalanceEntry) -> Result<(), AppError> {
        Ok(self.repo.update_balance_entry(entry).await?)
    }

    /// Delete a single balance entry.
    pub async fn delete_balance_entry(&self, id: EntryId) -> Result<(), AppError> {
        Ok(self.repo.delete_balance_entry(id).await?)
    }

    /// Balance history of an account, oldest first.
    pub async fn balance_history(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<BalanceEntry>, AppError> {
        Ok(self.repo.list_balance_history(account_id).await?)
    }

    // ========================
    // Reporting
    // ========================

    /// Month-by-month evolution of an account's balance.
    pub async fn monthly_reports(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<MonthlyReport>, AppError> {
        let history = self.repo.list_balance_history(account_id).await?;
        let reports = build_monthly_reports(&history);

        debug!(
            account_id,
            entries = history.len(),
            months = reports.len(),
            "Built monthly reports"
        );
        Ok(reports)
    }
}

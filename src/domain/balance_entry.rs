use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{AccountId, Amount};

pub type EntryId = i64;

/// A balance observed on an account at a given date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub id: EntryId,
    pub value: Amount,
    pub date: NaiveDate,
    pub account_id: AccountId,
}

impl BalanceEntry {
    pub fn new(account_id: AccountId, value: Amount, date: NaiveDate) -> Self {
        Self {
            id: 0,
            value,
            date,
            account_id,
        }
    }

    /// Calendar month the entry belongs to, as `(year, month)`.
    pub fn year_month(&self) -> (i32, u32) {
        (self.date.year(), self.date.month())
    }
}

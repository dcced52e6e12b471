use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Amount, BalanceEntry};

/// How an account's balance stood at the end of a calendar month, compared to
/// the previous month that has data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyReport {
    /// Latest balance entry recorded in this month.
    pub last_entry_of_month: BalanceEntry,
    /// Difference with the previous reported month. Zero for the first month.
    pub evolution_value: Decimal,
    /// `evolution_value` relative to the previous reported month's value.
    /// Zero for the first month and when the previous value is zero.
    pub evolution_ratio: Decimal,
}

impl MonthlyReport {
    pub fn new(last_entry_of_month: BalanceEntry) -> Self {
        Self {
            last_entry_of_month,
            evolution_value: Decimal::ZERO,
            evolution_ratio: Decimal::ZERO,
        }
    }

    pub fn year(&self) -> i32 {
        self.last_entry_of_month.date.year()
    }

    pub fn month(&self) -> u32 {
        self.last_entry_of_month.date.month()
    }

    pub fn date(&self) -> NaiveDate {
        self.last_entry_of_month.date
    }

    pub fn value(&self) -> Amount {
        self.last_entry_of_month.value
    }

    /// Evolution ratio expressed in percent (0.25 -> 25).
    pub fn evolution_percentage(&self) -> Decimal {
        self.evolution_ratio
            .checked_mul(Decimal::ONE_HUNDRED)
            .unwrap_or(Decimal::ZERO)
    }
}

/// Build one report per calendar month from an account's balance history.
///
/// `entries` is expected in ascending date order, as returned by the store.
/// Within a month the entry with the latest date represents the month; when
/// several entries share that date, the last one in input order wins. Months
/// without entries produce no report.
pub fn build_monthly_reports(entries: &[BalanceEntry]) -> Vec<MonthlyReport> {
    if entries.is_empty() {
        return Vec::new();
    }

    // Keyed by (year, month) so iteration is already in calendar order.
    let mut last_per_month: BTreeMap<(i32, u32), &BalanceEntry> = BTreeMap::new();
    for entry in entries {
        last_per_month
            .entry(entry.year_month())
            .and_modify(|selected| {
                if entry.date >= selected.date {
                    *selected = entry;
                }
            })
            .or_insert(entry);
    }

    let mut reports = Vec::with_capacity(last_per_month.len());
    let mut previous: Option<Amount> = None;

    for entry in last_per_month.into_values() {
        let mut report = MonthlyReport::new(entry.clone());

        if let Some(previous_value) = previous {
            let (value, ratio) = evolution(previous_value, entry.value);
            report.evolution_value = value;
            report.evolution_ratio = ratio;
        }

        previous = Some(entry.value);
        reports.push(report);
    }

    reports
}

/// Evolution from `previous` to `current` as `(difference, ratio)`.
///
/// A zero `previous` yields a zero ratio. Results that do not fit in a
/// `Decimal` are reported as zero as well.
fn evolution(previous: Amount, current: Amount) -> (Decimal, Decimal) {
    let Some(difference) = current.checked_sub(previous) else {
        return (Decimal::ZERO, Decimal::ZERO);
    };

    let ratio = if previous.is_zero() {
        Decimal::ZERO
    } else {
        difference.checked_div(previous).unwrap_or(Decimal::ZERO)
    };

    (difference, ratio)
}

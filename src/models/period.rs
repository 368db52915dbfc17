//! Budget period representation
//!
//! Budgets are monthly, so a period is a validated `(year, month)` pair.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{BudgetError, BudgetResult};

/// Earliest year a budget may be planned for
pub const MIN_YEAR: i32 = 1900;

/// Latest year a budget may be planned for
pub const MAX_YEAR: i32 = 2100;

/// A calendar month a budget applies to (e.g. "2025-01")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct BudgetPeriod {
    year: i32,
    month: u32,
}

impl BudgetPeriod {
    /// Create a monthly period, validating the year and month ranges
    pub fn new(year: i32, month: u32) -> BudgetResult<Self> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(BudgetError::InvalidBudgetData(format!(
                "year {} is outside {}..={}",
                year, MIN_YEAR, MAX_YEAR
            )));
        }
        if !(1..=12).contains(&month) {
            return Err(BudgetError::InvalidBudgetData(format!(
                "month {} is outside 1..=12",
                month
            )));
        }
        Ok(Self { year, month })
    }

    /// The period containing `date`
    pub fn containing(date: NaiveDate) -> BudgetResult<Self> {
        Self::new(date.year(), date.month())
    }

    /// Get the current monthly period
    pub fn current_month() -> BudgetResult<Self> {
        Self::containing(chrono::Local::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First day of the month
    pub fn start_date(&self) -> NaiveDate {
        // year and month are validated on construction
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    /// Last day of the month (inclusive)
    pub fn end_date(&self) -> NaiveDate {
        let (year, month) = self.next_year_month();
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|first_of_next| first_of_next - Duration::days(1))
            .unwrap_or_default()
    }

    /// Check if a date falls within this period
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date() && date <= self.end_date()
    }

    /// The following month
    pub fn next(&self) -> BudgetResult<Self> {
        let (year, month) = self.next_year_month();
        Self::new(year, month)
    }

    /// The preceding month
    pub fn prev(&self) -> BudgetResult<Self> {
        if self.month == 1 {
            Self::new(self.year - 1, 12)
        } else {
            Self::new(self.year, self.month - 1)
        }
    }

    fn next_year_month(&self) -> (i32, u32) {
        if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        }
    }

    /// Parse a period string in `YYYY-MM` form
    pub fn parse(s: &str) -> BudgetResult<Self> {
        let s = s.trim();
        let invalid = || BudgetError::InvalidBudgetData(format!("invalid period '{}', expected YYYY-MM", s));

        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for BudgetPeriod {
    type Err = BudgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[derive(Deserialize)]
struct RawPeriod {
    year: i32,
    month: u32,
}

impl TryFrom<RawPeriod> for BudgetPeriod {
    type Error = BudgetError;

    fn try_from(raw: RawPeriod) -> Result<Self, Self::Error> {
        BudgetPeriod::new(raw.year, raw.month)
    }
}

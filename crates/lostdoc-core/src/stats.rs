//! Dashboard aggregates over issued documents.
//!
//! Calendar boundaries (today, this month, this year) are taken in the
//! office timezone and converted to half-open UTC ranges, so they line up
//! with [`crate::store::DocumentQuery`]'s `reported_from`/`reported_before`.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const MONTH_LABELS: [&str; 12] = [
  "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Headline counts for the dashboard cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
  pub reports_today:      u64,
  pub reports_this_month: u64,
  pub reports_this_year:  u64,
  /// Active user accounts.
  pub total_users:        u64,
}

/// Documents issued in each calendar month of one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyIssuance {
  pub year:   i32,
  pub labels: Vec<String>,
  pub counts: Vec<u64>,
}

/// How many items of one name appear across non-deleted documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCount {
  pub name:  String,
  pub count: u64,
}

// ─── Ranges ──────────────────────────────────────────────────────────────────

/// `[from, before)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtcRange {
  pub from:   DateTime<Utc>,
  pub before: DateTime<Utc>,
}

impl UtcRange {
  /// Local midnight of `first` up to local midnight of `next`.
  pub fn local_dates(first: NaiveDate, next: NaiveDate, tz: Tz) -> Result<Self> {
    Ok(Self { from: local_midnight(first, tz)?, before: local_midnight(next, tz)? })
  }

  /// The local calendar day containing `now`.
  pub fn day(now: DateTime<Utc>, tz: Tz) -> Result<Self> {
    let today = now.with_timezone(&tz).date_naive();
    let tomorrow = today.succ_opt().ok_or_else(|| out_of_range(today))?;
    Self::local_dates(today, tomorrow, tz)
  }

  /// One calendar month, `month` in `1..=12`.
  pub fn month(year: i32, month: u32, tz: Tz) -> Result<Self> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
      .ok_or_else(|| Error::validation("month", format!("{year}-{month} is not a month")))?;
    let next = first
      .checked_add_months(Months::new(1))
      .ok_or_else(|| out_of_range(first))?;
    Self::local_dates(first, next, tz)
  }

  pub fn year(year: i32, tz: Tz) -> Result<Self> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1)
      .ok_or_else(|| Error::validation("year", format!("{year} is out of range")))?;
    let next = first
      .checked_add_months(Months::new(12))
      .ok_or_else(|| out_of_range(first))?;
    Self::local_dates(first, next, tz)
  }
}

/// The calendar year and month containing `now` in `tz`.
pub fn local_year_month(now: DateTime<Utc>, tz: Tz) -> (i32, u32) {
  let local = now.with_timezone(&tz);
  (local.year(), local.month())
}

fn local_midnight(date: NaiveDate, tz: Tz) -> Result<DateTime<Utc>> {
  tz.from_local_datetime(&date.and_time(NaiveTime::MIN))
    .earliest()
    .map(|dt| dt.with_timezone(&Utc))
    .ok_or_else(|| Error::Configuration(format!("{date} has no local midnight in {tz}")))
}

fn out_of_range(date: NaiveDate) -> Error {
  Error::validation("date", format!("no calendar date after {date}"))
}

//! Reference-number templates and numbering periods.
//!
//! A template is a printf-style string with exactly three directives, in
//! this order: `%d` (sequence), `%s` (month token), `%d` (four-digit year).
//! `%%` produces a literal percent sign. Any other arity or order is a
//! configuration error; nothing is ever silently dropped.

use std::fmt::Write as _;

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Period ──────────────────────────────────────────────────────────────────

/// The interval over which sequence numbers count up from the seed. One
/// calendar year in the office timezone; `month` only feeds the month token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberingPeriod {
  pub year:  i32,
  pub month: u32,
}

impl NumberingPeriod {
  /// The period containing `now` as seen from `tz`.
  pub fn at(now: DateTime<Utc>, tz: Tz) -> Self {
    let local = now.with_timezone(&tz);
    Self { year: local.year(), month: local.month() }
  }

  pub fn month_token(&self) -> &'static str {
    roman_month(self.month).unwrap_or("?")
  }
}

/// Roman-numeral month token (`1` → `"I"`, `12` → `"XII"`).
pub fn roman_month(month: u32) -> Option<&'static str> {
  const TOKENS: [&str; 12] = [
    "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X", "XI", "XII",
  ];
  TOKENS.get(month.checked_sub(1)? as usize).copied()
}

// ─── Template ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
  Literal(String),
  Sequence,
  Month,
  Year,
}

/// A validated reference-number template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberFormat {
  template: String,
  segments: Vec<Segment>,
}

impl NumberFormat {
  pub fn parse(template: &str) -> Result<Self> {
    let mut segments = Vec::new();
    let mut directives = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars();

    while let Some(c) = chars.next() {
      if c != '%' {
        literal.push(c);
        continue;
      }
      match chars.next() {
        Some('%') => literal.push('%'),
        Some(d @ ('d' | 's')) => {
          if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
          }
          directives.push(d);
          segments.push(match (directives.len(), d) {
            (1, 'd') => Segment::Sequence,
            (2, 's') => Segment::Month,
            (3, 'd') => Segment::Year,
            _ => return Err(arity_error(template)),
          });
        }
        Some(other) => {
          return Err(Error::Configuration(format!(
            "numbering format {template:?} uses unsupported directive %{other}"
          )));
        }
        None => {
          return Err(Error::Configuration(format!(
            "numbering format {template:?} ends with a dangling %"
          )));
        }
      }
    }
    if !literal.is_empty() {
      segments.push(Segment::Literal(literal));
    }
    if directives.len() != 3 {
      return Err(arity_error(template));
    }

    Ok(Self { template: template.to_owned(), segments })
  }

  pub fn as_str(&self) -> &str { &self.template }

  /// Substitute sequence, month token and year.
  pub fn render(&self, sequence: u32, period: NumberingPeriod) -> String {
    let mut out = String::with_capacity(self.template.len() + 8);
    for segment in &self.segments {
      match segment {
        Segment::Literal(s) => out.push_str(s),
        Segment::Sequence => {
          let _ = write!(out, "{sequence}");
        }
        Segment::Month => out.push_str(period.month_token()),
        Segment::Year => {
          let _ = write!(out, "{:04}", period.year);
        }
      }
    }
    out
  }
}

fn arity_error(template: &str) -> Error {
  Error::Configuration(format!(
    "numbering format {template:?} must contain exactly %d, %s, %d in that \
     order (sequence, month, year)"
  ))
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  const DEFAULT: &str = "SKH/%d/%s/TUK.7.2.1/%d";

  #[test]
  fn renders_first_document_of_the_year() {
    let fmt = NumberFormat::parse(DEFAULT).unwrap();
    let period = NumberingPeriod { year: 2025, month: 10 };
    assert_eq!(fmt.render(1, period), "SKH/1/X/TUK.7.2.1/2025");
  }

  #[test]
  fn literal_percent_survives() {
    let fmt = NumberFormat::parse("%d%%/%s/%d").unwrap();
    let period = NumberingPeriod { year: 2024, month: 4 };
    assert_eq!(fmt.render(12, period), "12%/IV/2024");
  }

  #[test]
  fn wrong_arity_is_a_configuration_error() {
    for bad in [
      "SKH/%d/%s",
      "SKH/%d/%s/%d/%d",
      "SKH/%s/%d/%d",
      "SKH/%d/%d/%d",
      "no directives",
    ] {
      assert!(
        matches!(NumberFormat::parse(bad), Err(Error::Configuration(_))),
        "{bad:?} should be rejected"
      );
    }
  }

  #[test]
  fn unknown_and_dangling_directives_are_rejected() {
    assert!(matches!(
      NumberFormat::parse("%d/%s/%x/%d"),
      Err(Error::Configuration(_))
    ));
    assert!(matches!(
      NumberFormat::parse("%d/%s/%d%"),
      Err(Error::Configuration(_))
    ));
  }

  #[test]
  fn roman_months() {
    assert_eq!(roman_month(1), Some("I"));
    assert_eq!(roman_month(9), Some("IX"));
    assert_eq!(roman_month(12), Some("XII"));
    assert_eq!(roman_month(0), None);
    assert_eq!(roman_month(13), None);
  }

  #[test]
  fn period_follows_office_timezone() {
    // 18:00 UTC on New Year's Eve is already 01:00 on 1 January in Jakarta.
    let now = Utc.with_ymd_and_hms(2024, 12, 31, 18, 0, 0).unwrap();
    let jakarta: Tz = "Asia/Jakarta".parse().unwrap();
    assert_eq!(NumberingPeriod::at(now, jakarta), NumberingPeriod {
      year:  2025,
      month: 1,
    });
    assert_eq!(NumberingPeriod::at(now, Tz::UTC), NumberingPeriod {
      year:  2024,
      month: 12,
    });
  }
}

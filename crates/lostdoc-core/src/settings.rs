//! Application settings: a string key/value mapping with a typed view.
//!
//! The store persists the raw mapping. [`AppConfig::from_map`] is the only
//! place raw values are interpreted, so a malformed value fails here, once,
//! with [`Error::Configuration`].

use std::collections::BTreeMap;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, archive::Retention, numbering::NumberFormat};

pub type SettingsMap = BTreeMap<String, String>;

/// Well-known setting keys.
pub mod keys {
  pub const NUMBERING_FORMAT: &str = "numbering_format";
  /// Seed used when the current period has no documents yet.
  pub const LAST_NUMBER: &str = "last_number";
  pub const ARCHIVE_DURATION_DAYS: &str = "archive_duration_days";
  pub const TIMEZONE: &str = "timezone";
  pub const OFFICE_NAME: &str = "office_name";
  pub const LETTERHEAD_LINE_1: &str = "letterhead_line_1";
  pub const LETTERHEAD_LINE_2: &str = "letterhead_line_2";
  pub const LETTERHEAD_LINE_3: &str = "letterhead_line_3";
  pub const ISSUE_PLACE: &str = "issue_place";
  pub const BACKUP_PATH: &str = "backup_path";
}

pub const DEFAULT_NUMBERING_FORMAT: &str = "SKH/%d/%s/TUK.7.2.1/%d";
pub const DEFAULT_ARCHIVE_DURATION_DAYS: u32 = 30;
pub const DEFAULT_TIMEZONE: &str = "Asia/Jakarta";

/// Values written on first start for keys that are not yet stored.
pub fn defaults() -> SettingsMap {
  [
    (keys::NUMBERING_FORMAT, DEFAULT_NUMBERING_FORMAT.to_owned()),
    (keys::LAST_NUMBER, "0".to_owned()),
    (
      keys::ARCHIVE_DURATION_DAYS,
      DEFAULT_ARCHIVE_DURATION_DAYS.to_string(),
    ),
    (keys::TIMEZONE, DEFAULT_TIMEZONE.to_owned()),
  ]
  .into_iter()
  .map(|(k, v)| (k.to_owned(), v))
  .collect()
}

/// Header lines and place name printed on a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Letterhead {
  pub office_name: Option<String>,
  pub lines:       Vec<String>,
  pub issue_place: Option<String>,
}

/// The typed, validated settings read on every issuance.
#[derive(Debug, Clone)]
pub struct AppConfig {
  pub numbering:   NumberFormat,
  pub last_number: u32,
  pub retention:   Retention,
  pub timezone:    Tz,
  pub letterhead:  Letterhead,
}

impl AppConfig {
  pub fn from_map(map: &SettingsMap) -> Result<Self> {
    let numbering = NumberFormat::parse(&value_or_default(map, keys::NUMBERING_FORMAT))?;

    let last_number =
      parse_u32(keys::LAST_NUMBER, &value_or_default(map, keys::LAST_NUMBER))?;

    let days = parse_u32(
      keys::ARCHIVE_DURATION_DAYS,
      &value_or_default(map, keys::ARCHIVE_DURATION_DAYS),
    )?;
    if days == 0 {
      return Err(Error::Configuration(format!(
        "{} must be at least 1",
        keys::ARCHIVE_DURATION_DAYS
      )));
    }

    let tz_name = value_or_default(map, keys::TIMEZONE);
    let timezone: Tz = tz_name.trim().parse().map_err(|e| {
      Error::Configuration(format!("unknown timezone {tz_name:?}: {e}"))
    })?;

    let letterhead = Letterhead {
      office_name: non_empty(map, keys::OFFICE_NAME),
      lines:       [
        keys::LETTERHEAD_LINE_1,
        keys::LETTERHEAD_LINE_2,
        keys::LETTERHEAD_LINE_3,
      ]
      .into_iter()
      .filter_map(|key| non_empty(map, key))
      .collect(),
      issue_place: non_empty(map, keys::ISSUE_PLACE),
    };

    Ok(Self {
      numbering,
      last_number,
      retention: Retention::days(days),
      timezone,
      letterhead,
    })
  }
}

fn value_or_default(map: &SettingsMap, key: &str) -> String {
  map
    .get(key)
    .cloned()
    .or_else(|| defaults().remove(key))
    .unwrap_or_default()
}

fn non_empty(map: &SettingsMap, key: &str) -> Option<String> {
  map
    .get(key)
    .map(|v| v.trim())
    .filter(|v| !v.is_empty())
    .map(str::to_owned)
}

fn parse_u32(key: &str, raw: &str) -> Result<u32> {
  raw.trim().parse().map_err(|_| {
    Error::Configuration(format!("{key} must be a non-negative integer, got {raw:?}"))
  })
}

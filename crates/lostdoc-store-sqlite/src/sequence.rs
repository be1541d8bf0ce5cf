//! Per-period sequence allocation.
//!
//! Must run inside the issuing write transaction: the read of the current
//! maximum and the insert that claims the next value are only atomic
//! together under `BEGIN IMMEDIATE`.

use rusqlite::Connection;

use crate::{Error, Result};

/// The next sequence number for `period`.
///
/// Soft-deleted documents are counted, so a number is never handed out
/// twice. `seed` is the base used when the period has no documents yet.
pub fn next_sequence(conn: &Connection, period: i32, seed: u32) -> Result<u32> {
  let current: Option<u32> = conn.query_row(
    "SELECT MAX(sequence) FROM lost_documents WHERE period = ?1",
    [period],
    |r| r.get(0),
  )?;

  current
    .unwrap_or(seed)
    .checked_add(1)
    .ok_or_else(|| Error::Decode(format!("sequence exhausted for period {period}")))
}

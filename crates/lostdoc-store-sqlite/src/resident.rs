//! Resident lookup and find-or-create, run on a caller-supplied connection
//! so they join the caller's transaction.

use chrono::{DateTime, NaiveDate, Utc};
use lostdoc_core::resident::{Resident, ResidentIdentity};
use rusqlite::{Connection, OptionalExtension as _};
use uuid::Uuid;

use crate::{
  Result,
  encode::{RESIDENT_COLUMNS, RawResident, encode_date, encode_dt, encode_uuid},
};

pub fn find_resident(
  conn: &Connection,
  full_name: &str,
  birth_date: NaiveDate,
) -> Result<Option<Resident>> {
  let sql = format!(
    "SELECT {RESIDENT_COLUMNS} FROM residents
     WHERE full_name = ?1 AND birth_date = ?2 AND deleted_at IS NULL"
  );
  conn
    .query_row(
      &sql,
      rusqlite::params![full_name, encode_date(birth_date)],
      RawResident::from_row,
    )
    .optional()?
    .map(RawResident::into_resident)
    .transpose()
}

pub fn get_resident(conn: &Connection, id: &str) -> Result<Resident> {
  let sql = format!("SELECT {RESIDENT_COLUMNS} FROM residents WHERE resident_id = ?1");
  conn
    .query_row(&sql, [id], RawResident::from_row)?
    .into_resident()
}

/// Return the existing resident for `identity`, or insert a new one.
///
/// An existing row is returned as-is; the identity's descriptive fields are
/// not written back.
pub fn resolve_resident(
  conn: &Connection,
  identity: &ResidentIdentity,
  now: DateTime<Utc>,
) -> Result<Resident> {
  if let Some(existing) =
    find_resident(conn, &identity.full_name, identity.birth_date)?
  {
    return Ok(existing);
  }

  let resident = Resident {
    resident_id: Uuid::new_v4(),
    full_name:   identity.full_name.clone(),
    birth_place: identity.birth_place.clone(),
    birth_date:  identity.birth_date,
    gender:      identity.gender.clone(),
    religion:    identity.religion.clone(),
    occupation:  identity.occupation.clone(),
    address:     identity.address.clone(),
    created_at:  now,
    updated_at:  now,
  };

  conn.execute(
    "INSERT INTO residents (
       resident_id, full_name, birth_place, birth_date, gender,
       religion, occupation, address, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    rusqlite::params![
      encode_uuid(resident.resident_id),
      resident.full_name,
      resident.birth_place,
      encode_date(resident.birth_date),
      resident.gender,
      resident.religion,
      resident.occupation,
      resident.address,
      encode_dt(now),
      encode_dt(now),
    ],
  )?;

  Ok(resident)
}

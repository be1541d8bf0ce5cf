//! [`SqliteStore`]: the SQLite implementation of [`DocumentStore`].

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use lostdoc_core::{
  audit::{AuditEntry, NewAuditEntry},
  document::{LostDocument, LostItem, NewLostItem},
  resident::Resident,
  settings::SettingsMap,
  stats::ItemCount,
  store::{DocumentQuery, DocumentStore, IssuePlan, Revision},
  user::{NewUser, User, UserSummary},
};

use crate::{
  Result,
  encode::{
    DOCUMENT_COLUMNS, RawAuditEntry, RawDocument, RawItem, RawUser, USER_COLUMNS,
    decode_dt, decode_uuid, encode_dt, encode_uuid, like_pattern,
  },
  resident::{find_resident, get_resident, resolve_resident},
  schema::SCHEMA,
  sequence::next_sequence,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A document registry backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` on the connection thread. Errors raised inside `f` come back
  /// with their original classification.
  async fn run<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }
}

// ─── Transactions ────────────────────────────────────────────────────────────

/// Resident resolution, sequence allocation and both inserts under one
/// `BEGIN IMMEDIATE`. Any early return drops the transaction, which rolls
/// it back.
fn issue_in_tx(conn: &mut Connection, plan: IssuePlan) -> Result<Uuid> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

  let resident = resolve_resident(&tx, &plan.draft.resident, plan.issued_at)?;
  let sequence = next_sequence(&tx, plan.period.year, plan.seed)?;
  let reference_number = plan.numbering.render(sequence, plan.period);

  let document_id = Uuid::new_v4();
  let doc_id_str = encode_uuid(document_id);
  let issued_at = encode_dt(plan.issued_at);
  let approved_at = plan
    .draft
    .approving_official_id
    .map(|_| issued_at.clone());

  tx.execute(
    "INSERT INTO lost_documents (
       document_id, reference_number, period, sequence, reported_at,
       loss_location, resident_id, reporting_officer_id,
       approving_official_id, operator_id, approved_at,
       created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?5, ?5)",
    rusqlite::params![
      doc_id_str,
      reference_number,
      plan.period.year,
      sequence,
      issued_at,
      plan.draft.loss_location,
      encode_uuid(resident.resident_id),
      encode_uuid(plan.draft.reporting_officer_id),
      plan.draft.approving_official_id.map(encode_uuid),
      encode_uuid(plan.operator_id),
      approved_at,
    ],
  )?;
  insert_items(&tx, &doc_id_str, &plan.draft.items)?;

  tx.commit()?;
  Ok(document_id)
}

fn revise_in_tx(conn: &mut Connection, revision: Revision) -> Result<bool> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  let doc_id_str = encode_uuid(revision.document_id);

  let current: Option<(String, Option<String>, Option<String>)> = tx
    .query_row(
      "SELECT resident_id, approving_official_id, approved_at
       FROM lost_documents WHERE document_id = ?1 AND deleted_at IS NULL",
      [&doc_id_str],
      |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
    )
    .optional()?;
  let Some((resident_id, old_official, old_approved_at)) = current else {
    return Ok(false);
  };

  let draft = revision.draft;
  let revised_at = encode_dt(revision.revised_at);

  let resident_id = if get_resident(&tx, &resident_id)?.matches(&draft.resident) {
    resident_id
  } else {
    encode_uuid(resolve_resident(&tx, &draft.resident, revision.revised_at)?.resident_id)
  };

  let new_official = draft.approving_official_id.map(encode_uuid);
  let approved_at = match &new_official {
    None => None,
    Some(official) if old_official.as_deref() == Some(official.as_str()) => {
      old_approved_at.or_else(|| Some(revised_at.clone()))
    }
    Some(_) => Some(revised_at.clone()),
  };

  tx.execute(
    "UPDATE lost_documents SET
       loss_location         = ?2,
       resident_id           = ?3,
       reporting_officer_id  = ?4,
       approving_official_id = ?5,
       approved_at           = ?6,
       last_updated_by_id    = ?7,
       updated_at            = ?8
     WHERE document_id = ?1",
    rusqlite::params![
      doc_id_str,
      draft.loss_location,
      resident_id,
      encode_uuid(draft.reporting_officer_id),
      new_official,
      approved_at,
      encode_uuid(revision.actor_id),
      revised_at,
    ],
  )?;

  tx.execute("DELETE FROM lost_items WHERE document_id = ?1", [&doc_id_str])?;
  insert_items(&tx, &doc_id_str, &draft.items)?;

  tx.commit()?;
  Ok(true)
}

fn insert_items(conn: &Connection, doc_id: &str, items: &[NewLostItem]) -> Result<()> {
  let mut stmt = conn.prepare(
    "INSERT INTO lost_items (item_id, document_id, position, name, description)
     VALUES (?1, ?2, ?3, ?4, ?5)",
  )?;
  for (position, item) in items.iter().enumerate() {
    stmt.execute(rusqlite::params![
      encode_uuid(Uuid::new_v4()),
      doc_id,
      position as i64,
      item.name,
      item.description,
    ])?;
  }
  Ok(())
}

// ─── Loading ─────────────────────────────────────────────────────────────────

fn load_document(conn: &Connection, id: &str) -> Result<Option<LostDocument>> {
  let sql = format!(
    "SELECT {DOCUMENT_COLUMNS} FROM lost_documents
     WHERE document_id = ?1 AND deleted_at IS NULL"
  );
  conn
    .query_row(&sql, [id], RawDocument::from_row)
    .optional()?
    .map(|raw| hydrate(conn, raw))
    .transpose()
}

/// Join a document row with its resident, items and personnel.
fn hydrate(conn: &Connection, raw: RawDocument) -> Result<LostDocument> {
  let status = raw.status()?;
  let approving_official = raw
    .approving_official_id
    .as_deref()
    .map(|id| user_summary(conn, id))
    .transpose()?;
  let last_updated_by = raw
    .last_updated_by_id
    .as_deref()
    .map(|id| user_summary(conn, id))
    .transpose()?;

  Ok(LostDocument {
    document_id: decode_uuid(&raw.document_id)?,
    reference_number: raw.reference_number,
    sequence: raw.sequence,
    period: raw.period,
    reported_at: decode_dt(&raw.reported_at)?,
    status,
    loss_location: raw.loss_location,
    resident: get_resident(conn, &raw.resident_id)?,
    items: load_items(conn, &raw.document_id)?,
    reporting_officer: user_summary(conn, &raw.reporting_officer_id)?,
    approving_official,
    operator: user_summary(conn, &raw.operator_id)?,
    last_updated_by,
    approved_at: raw.approved_at.as_deref().map(decode_dt).transpose()?,
    created_at: decode_dt(&raw.created_at)?,
    updated_at: decode_dt(&raw.updated_at)?,
  })
}

fn load_items(conn: &Connection, doc_id: &str) -> Result<Vec<LostItem>> {
  let mut stmt = conn.prepare(
    "SELECT item_id, name, description FROM lost_items
     WHERE document_id = ?1 ORDER BY position",
  )?;
  let raws = stmt
    .query_map([doc_id], |r| {
      Ok(RawItem {
        item_id:     r.get(0)?,
        name:        r.get(1)?,
        description: r.get(2)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawItem::into_item).collect()
}

fn user_summary(conn: &Connection, id: &str) -> Result<UserSummary> {
  let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1");
  conn.query_row(&sql, [id], RawUser::from_row)?.into_summary()
}

fn query_user(
  conn: &Connection,
  column: &str,
  value: &str,
) -> Result<Option<User>> {
  let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
  conn
    .query_row(&sql, [value], RawUser::from_row)
    .optional()?
    .map(RawUser::into_user)
    .transpose()
}

/// `WHERE` clause shared by search and count; binds `?1`..`?4` as produced
/// by [`filter_params`].
const DOCUMENT_FILTER: &str = r"deleted_at IS NULL
  AND (?1 IS NULL
       OR reference_number LIKE ?1 ESCAPE '\'
       OR resident_id IN (SELECT resident_id FROM residents
                          WHERE full_name LIKE ?1 ESCAPE '\'))
  AND (?2 IS NULL OR operator_id = ?2)
  AND (?3 IS NULL OR reported_at >= ?3)
  AND (?4 IS NULL OR reported_at < ?4)";

type FilterParams = (Option<String>, Option<String>, Option<String>, Option<String>);

fn filter_params(query: &DocumentQuery) -> FilterParams {
  let text = query
    .text
    .as_deref()
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .map(like_pattern);
  (
    text,
    query.operator_id.map(encode_uuid),
    query.reported_from.map(encode_dt),
    query.reported_before.map(encode_dt),
  )
}

fn search(conn: &Connection, query: DocumentQuery) -> Result<Vec<LostDocument>> {
  let sql = format!(
    "SELECT {DOCUMENT_COLUMNS} FROM lost_documents
     WHERE {DOCUMENT_FILTER}
     ORDER BY reported_at DESC, sequence DESC
     LIMIT ?5 OFFSET ?6"
  );

  let (text, operator, from, before) = filter_params(&query);
  // SQLite treats a negative LIMIT as unbounded.
  let limit = query.limit.map_or(-1, |l| l as i64);
  let offset = query.offset.unwrap_or(0) as i64;

  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(
      rusqlite::params![text, operator, from, before, limit, offset],
      RawDocument::from_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  raws.into_iter().map(|raw| hydrate(conn, raw)).collect()
}

fn count(conn: &Connection, query: DocumentQuery) -> Result<u64> {
  let sql = format!("SELECT COUNT(*) FROM lost_documents WHERE {DOCUMENT_FILTER}");
  let (text, operator, from, before) = filter_params(&query);
  let n: i64 = conn.query_row(
    &sql,
    rusqlite::params![text, operator, from, before],
    |r| r.get(0),
  )?;
  Ok(n as u64)
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let now = Utc::now();
    let user = User {
      user_id:       Uuid::new_v4(),
      username:      input.username,
      full_name:     input.full_name,
      rank:          input.rank,
      position:      input.position,
      role:          input.role,
      password_hash: input.password_hash,
      active:        true,
      created_at:    now,
      updated_at:    now,
    };

    let row = user.clone();
    self
      .run(move |conn| {
        conn.execute(
          "INSERT INTO users (
             user_id, username, full_name, rank, position, role,
             password_hash, active, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
          rusqlite::params![
            encode_uuid(row.user_id),
            row.username,
            row.full_name,
            row.rank,
            row.position,
            row.role.to_string(),
            row.password_hash,
            row.active,
            encode_dt(row.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);
    self
      .run(move |conn| query_user(conn, "user_id", &id_str))
      .await
  }

  async fn find_user_by_username<'a>(&'a self, username: &'a str) -> Result<Option<User>> {
    let username = username.to_owned();
    self
      .run(move |conn| query_user(conn, "username", &username))
      .await
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    self
      .run(|conn| {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY username");
        let mut stmt = conn.prepare(&sql)?;
        let raws = stmt
          .query_map([], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        raws.into_iter().map(RawUser::into_user).collect()
      })
      .await
  }

  async fn set_user_active(&self, id: Uuid, active: bool, at: DateTime<Utc>) -> Result<bool> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(at);
    self
      .run(move |conn| {
        let changed = conn.execute(
          "UPDATE users SET active = ?2, updated_at = ?3 WHERE user_id = ?1",
          rusqlite::params![id_str, active, at_str],
        )?;
        Ok(changed == 1)
      })
      .await
  }

  // ── Settings ──────────────────────────────────────────────────────────────

  async fn load_settings(&self) -> Result<SettingsMap> {
    self
      .run(|conn| {
        let mut stmt = conn.prepare("SELECT key, value FROM settings")?;
        let map = stmt
          .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
          .collect::<rusqlite::Result<SettingsMap>>()?;
        Ok(map)
      })
      .await
  }

  async fn save_settings(&self, changes: SettingsMap) -> Result<()> {
    self
      .run(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
          )?;
          for (key, value) in &changes {
            stmt.execute([key, value])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await
  }

  // ── Residents ─────────────────────────────────────────────────────────────

  async fn find_resident<'a>(
    &'a self,
    full_name: &'a str,
    birth_date: NaiveDate,
  ) -> Result<Option<Resident>> {
    let full_name = full_name.to_owned();
    self
      .run(move |conn| find_resident(conn, &full_name, birth_date))
      .await
  }

  // ── Documents ─────────────────────────────────────────────────────────────

  async fn issue_document(&self, plan: IssuePlan) -> Result<Uuid> {
    self.run(move |conn| issue_in_tx(conn, plan)).await
  }

  async fn revise_document(&self, revision: Revision) -> Result<bool> {
    self.run(move |conn| revise_in_tx(conn, revision)).await
  }

  async fn soft_delete_document(&self, id: Uuid, deleted_at: DateTime<Utc>) -> Result<bool> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(deleted_at);
    self
      .run(move |conn| {
        let changed = conn.execute(
          "UPDATE lost_documents SET deleted_at = ?2
           WHERE document_id = ?1 AND deleted_at IS NULL",
          [&id_str, &at_str],
        )?;
        Ok(changed == 1)
      })
      .await
  }

  async fn get_document(&self, id: Uuid) -> Result<Option<LostDocument>> {
    let id_str = encode_uuid(id);
    self.run(move |conn| load_document(conn, &id_str)).await
  }

  async fn search_documents<'a>(&'a self, query: &'a DocumentQuery) -> Result<Vec<LostDocument>> {
    let query = query.clone();
    self.run(move |conn| search(conn, query)).await
  }

  async fn count_documents<'a>(&'a self, query: &'a DocumentQuery) -> Result<u64> {
    let query = query.clone();
    self.run(move |conn| count(conn, query)).await
  }

  async fn item_composition(&self) -> Result<Vec<ItemCount>> {
    self
      .run(|conn| {
        let mut stmt = conn.prepare(
          "SELECT i.name, COUNT(*) AS n
           FROM lost_items i
           JOIN lost_documents d ON d.document_id = i.document_id
           WHERE d.deleted_at IS NULL
           GROUP BY i.name
           ORDER BY n DESC, i.name",
        )?;
        let counts = stmt
          .query_map([], |r| {
            let n: i64 = r.get(1)?;
            Ok(ItemCount { name: r.get(0)?, count: n as u64 })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(counts)
      })
      .await
  }

  // ── Audit ─────────────────────────────────────────────────────────────────

  async fn record_audit(&self, entry: NewAuditEntry) -> Result<AuditEntry> {
    let entry = AuditEntry {
      entry_id:    Uuid::new_v4(),
      actor_id:    entry.actor_id,
      action:      entry.action,
      detail:      entry.detail,
      recorded_at: Utc::now(),
    };

    let row = entry.clone();
    self
      .run(move |conn| {
        conn.execute(
          "INSERT INTO audit_log (entry_id, actor_id, action, detail, recorded_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            encode_uuid(row.entry_id),
            encode_uuid(row.actor_id),
            row.action.to_string(),
            row.detail,
            encode_dt(row.recorded_at),
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(entry)
  }

  async fn list_audit(&self, limit: usize) -> Result<Vec<AuditEntry>> {
    let limit = limit as i64;
    self
      .run(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT entry_id, actor_id, action, detail, recorded_at FROM audit_log
           ORDER BY recorded_at DESC, rowid DESC LIMIT ?1",
        )?;
        let raws = stmt
          .query_map([limit], |r| {
            Ok(RawAuditEntry {
              entry_id:    r.get(0)?,
              actor_id:    r.get(1)?,
              action:      r.get(2)?,
              detail:      r.get(3)?,
              recorded_at: r.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        raws.into_iter().map(RawAuditEntry::into_entry).collect()
      })
      .await
  }
}

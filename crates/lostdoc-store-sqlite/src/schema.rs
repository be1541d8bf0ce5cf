//! SQL schema for the registry's SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    full_name     TEXT NOT NULL,
    rank          TEXT,
    position      TEXT,
    role          TEXT NOT NULL,              -- 'admin' | 'operator'
    password_hash TEXT NOT NULL,
    active        INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS settings (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS residents (
    resident_id TEXT PRIMARY KEY,
    full_name   TEXT NOT NULL,
    birth_place TEXT NOT NULL,
    birth_date  TEXT NOT NULL,                -- YYYY-MM-DD
    gender      TEXT NOT NULL,
    religion    TEXT NOT NULL,
    occupation  TEXT NOT NULL,
    address     TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    deleted_at  TEXT
);

-- Dedup key; a lost race on first insert fails here.
CREATE UNIQUE INDEX IF NOT EXISTS residents_identity_idx
    ON residents(full_name, birth_date) WHERE deleted_at IS NULL;

-- Soft-deleted rows stay, so their numbers are never handed out again.
CREATE TABLE IF NOT EXISTS lost_documents (
    document_id           TEXT PRIMARY KEY,
    reference_number      TEXT NOT NULL UNIQUE,
    period                INTEGER NOT NULL,   -- year in the office timezone
    sequence              INTEGER NOT NULL,
    reported_at           TEXT NOT NULL,
    status                TEXT NOT NULL DEFAULT 'issued',
    loss_location         TEXT NOT NULL,
    resident_id           TEXT NOT NULL REFERENCES residents(resident_id),
    reporting_officer_id  TEXT NOT NULL REFERENCES users(user_id),
    approving_official_id TEXT REFERENCES users(user_id),
    operator_id           TEXT NOT NULL REFERENCES users(user_id),
    last_updated_by_id    TEXT REFERENCES users(user_id),
    approved_at           TEXT,
    created_at            TEXT NOT NULL,
    updated_at            TEXT NOT NULL,
    deleted_at            TEXT,
    UNIQUE (period, sequence)
);

-- Replaced wholesale on every update; never merged.
CREATE TABLE IF NOT EXISTS lost_items (
    item_id     TEXT PRIMARY KEY,
    document_id TEXT NOT NULL REFERENCES lost_documents(document_id) ON DELETE CASCADE,
    position    INTEGER NOT NULL,
    name        TEXT NOT NULL CHECK (length(trim(name)) > 0),
    description TEXT
);

-- Append-only. No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS audit_log (
    entry_id    TEXT PRIMARY KEY,
    actor_id    TEXT NOT NULL REFERENCES users(user_id),
    action      TEXT NOT NULL,
    detail      TEXT NOT NULL,
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS documents_reported_idx ON lost_documents(reported_at);
CREATE INDEX IF NOT EXISTS documents_operator_idx ON lost_documents(operator_id);
CREATE INDEX IF NOT EXISTS items_document_idx     ON lost_items(document_id);
CREATE INDEX IF NOT EXISTS audit_recorded_idx     ON audit_log(recorded_at);

PRAGMA user_version = 1;
";

//! SQL schema for the authorization SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- AUTOINCREMENT: ids are never handed out twice, even after a purge.
CREATE TABLE IF NOT EXISTS authorizations (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id       TEXT NOT NULL,
    resource_id   TEXT NOT NULL,
    resource_type TEXT NOT NULL,
    role          TEXT NOT NULL DEFAULT '',
    created_at    TEXT NOT NULL,   -- RFC 3339 UTC; set once
    updated_at    TEXT NOT NULL,   -- RFC 3339 UTC; every write
    deleted_at    TEXT             -- NULL while live
);

-- One live row per identity tuple. Soft-deleted rows are exempt.
CREATE UNIQUE INDEX IF NOT EXISTS authorizations_live_identity_idx
    ON authorizations(user_id, resource_id, resource_type)
    WHERE deleted_at IS NULL;

CREATE INDEX IF NOT EXISTS authorizations_resource_idx
    ON authorizations(resource_type, resource_id);
CREATE INDEX IF NOT EXISTS authorizations_deleted_idx
    ON authorizations(deleted_at);

PRAGMA user_version = 1;
";

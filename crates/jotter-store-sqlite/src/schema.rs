//! SQL schema for the Jotter SQLite store.
//!
//! The DDL runs on every connection and is idempotent. Attribute rows are
//! installed separately by `SqliteStore::install_schema`, so a database that
//! was never bootstrapped has tables but no attributes.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS attributes (
    attr_id     INTEGER PRIMARY KEY,
    ident       TEXT    NOT NULL UNIQUE,  -- 'namespace/name'
    value_type  TEXT    NOT NULL,         -- 'string' | 'instant' | 'ref'
    cardinality TEXT    NOT NULL,         -- 'one' | 'many'
    is_unique   INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS transactions (
    tx_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    recorded_at TEXT    NOT NULL          -- RFC 3339 UTC; server-assigned
);

-- One row per permanent entity id, recording the transaction that minted it.
CREATE TABLE IF NOT EXISTS entities (
    entity_id INTEGER PRIMARY KEY AUTOINCREMENT,
    tx_id     INTEGER NOT NULL REFERENCES transactions(tx_id)
);

-- Datoms are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS datoms (
    datom_id INTEGER PRIMARY KEY,
    e        INTEGER NOT NULL REFERENCES entities(entity_id),
    a        INTEGER NOT NULL REFERENCES attributes(attr_id),
    v_type   TEXT    NOT NULL,
    v        TEXT    NOT NULL,
    tx       INTEGER NOT NULL REFERENCES transactions(tx_id),
    added    INTEGER NOT NULL             -- 1 = assertion, 0 = retraction
);

CREATE INDEX IF NOT EXISTS datoms_eavt ON datoms(e, a, v_type, v, tx);
CREATE INDEX IF NOT EXISTS datoms_aevt ON datoms(a, e, v_type, v, tx);
CREATE INDEX IF NOT EXISTS datoms_avet ON datoms(a, v_type, v, e, tx);
CREATE INDEX IF NOT EXISTS datoms_vaet ON datoms(v_type, v, a, e, tx);

-- A datom is current when it is an assertion and nothing later touched the
-- same (e, a, v).
CREATE VIEW IF NOT EXISTS current_datoms AS
  SELECT d.e, d.a, d.v_type, d.v, d.tx
  FROM datoms d
  WHERE d.added = 1
    AND NOT EXISTS (
      SELECT 1 FROM datoms later
      WHERE later.e = d.e
        AND later.a = d.a
        AND later.v_type = d.v_type
        AND later.v = d.v
        AND later.datom_id > d.datom_id
    );

PRAGMA user_version = 1;
";

//! SQL schema for the outreach SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS encounters (
    seq              INTEGER PRIMARY KEY AUTOINCREMENT,  -- insertion order
    encounter_id     TEXT NOT NULL UNIQUE,
    description      TEXT NOT NULL,
    latitude         REAL NOT NULL CHECK (latitude  BETWEEN -90.0  AND 90.0),
    longitude        REAL NOT NULL CHECK (longitude BETWEEN -180.0 AND 180.0),
    gender           TEXT NOT NULL,   -- 'homme' | 'femme' | 'autre' | 'non-specifie'
    age_category     TEXT NOT NULL,   -- 'adulte' | 'enfant'
    date_encounter   TEXT NOT NULL,   -- ISO 8601 calendar date
    location_visited INTEGER NOT NULL DEFAULT 0,
    first_name       TEXT,
    last_name        TEXT,
    consent_given    INTEGER NOT NULL DEFAULT 0,
    signature        TEXT,
    photo            TEXT,            -- JSON-encoded Attachment or NULL
    document         TEXT,            -- JSON-encoded Attachment or NULL
    created_at       TEXT NOT NULL,   -- RFC 3339 UTC; server-assigned
    updated_at       TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS encounters_date_idx     ON encounters(date_encounter);
CREATE INDEX IF NOT EXISTS encounters_visited_idx  ON encounters(location_visited);
CREATE INDEX IF NOT EXISTS encounters_position_idx ON encounters(latitude, longitude);

PRAGMA user_version = 1;
";

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! SQLite backend for the record store.

use std::path::Path;

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};
use tracing::debug;

use super::{Mutation, Query, RecordStore, Value};
use crate::dns_errors::StoreError;

/// Tables used by the zone builder. Safe to run against an existing database.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS zones (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT    NOT NULL UNIQUE,
    pri_dns     TEXT    NOT NULL,
    sec_dns     TEXT    NOT NULL DEFAULT 'none',
    hostmaster  TEXT    NOT NULL,
    serial      INTEGER NOT NULL DEFAULT 0,
    refresh     INTEGER NOT NULL,
    retry       INTEGER NOT NULL,
    expire      INTEGER NOT NULL,
    ttl         INTEGER NOT NULL,
    valid       TEXT    NOT NULL DEFAULT 'unknown',
    updated     TEXT    NOT NULL DEFAULT 'yes',
    type        TEXT    NOT NULL DEFAULT 'master',
    master      TEXT
);
CREATE TABLE IF NOT EXISTS rev_zones (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    net_range   TEXT    NOT NULL UNIQUE,
    prefix      INTEGER NOT NULL,
    net_start   INTEGER NOT NULL,
    net_finish  INTEGER NOT NULL,
    pri_dns     TEXT    NOT NULL,
    sec_dns     TEXT    NOT NULL DEFAULT 'none',
    hostmaster  TEXT    NOT NULL,
    serial      INTEGER NOT NULL DEFAULT 0,
    refresh     INTEGER NOT NULL,
    retry       INTEGER NOT NULL,
    expire      INTEGER NOT NULL,
    ttl         INTEGER NOT NULL,
    valid       TEXT    NOT NULL DEFAULT 'unknown',
    updated     TEXT    NOT NULL DEFAULT 'yes',
    type        TEXT    NOT NULL DEFAULT 'master',
    master      TEXT
);
CREATE TABLE IF NOT EXISTS records (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    zone_id     INTEGER NOT NULL REFERENCES zones(id) ON DELETE CASCADE,
    host        TEXT    NOT NULL,
    type        TEXT    NOT NULL,
    destination TEXT    NOT NULL,
    pri         INTEGER,
    service     TEXT,
    protocol    TEXT
);
CREATE INDEX IF NOT EXISTS records_destination ON records (type, destination);
CREATE TABLE IF NOT EXISTS rev_records (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    rev_zone_id INTEGER NOT NULL REFERENCES rev_zones(id) ON DELETE CASCADE,
    block       INTEGER NOT NULL DEFAULT 0,
    host        TEXT    NOT NULL,
    destination TEXT    NOT NULL
);
CREATE TABLE IF NOT EXISTS glue_zones (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    zone_id     INTEGER NOT NULL REFERENCES zones(id) ON DELETE CASCADE,
    name        TEXT    NOT NULL,
    pri_ns      TEXT    NOT NULL,
    sec_ns      TEXT    NOT NULL DEFAULT 'none',
    pri_dns     TEXT,
    sec_dns     TEXT
);
CREATE TABLE IF NOT EXISTS preferred_a (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    ip          TEXT    NOT NULL UNIQUE,
    ip_numeric  INTEGER NOT NULL,
    record_id   INTEGER NOT NULL,
    fqdn        TEXT    NOT NULL
);
";

const FORWARD_ZONE_COLUMNS: &str = "id, name, pri_dns, sec_dns, hostmaster, serial, refresh, \
     retry, expire, ttl, valid, updated, type, master";

const REVERSE_ZONE_COLUMNS: &str = "id, net_range, prefix, net_start, net_finish, pri_dns, \
     sec_dns, hostmaster, serial, refresh, retry, expire, ttl, valid, updated, type, master";

const RECORD_COLUMNS: &str = "id, zone_id, host, type, destination, pri, service, protocol";

fn query_sql(query: Query) -> String {
    match query {
        Query::ForwardZones => format!("SELECT {FORWARD_ZONE_COLUMNS} FROM zones ORDER BY name"),
        Query::ForwardZoneByName => {
            format!("SELECT {FORWARD_ZONE_COLUMNS} FROM zones WHERE name = ?1")
        }
        Query::ReverseZones => format!(
            "SELECT {REVERSE_ZONE_COLUMNS} FROM rev_zones ORDER BY net_start, prefix"
        ),
        Query::ReverseZoneByRange => {
            format!("SELECT {REVERSE_ZONE_COLUMNS} FROM rev_zones WHERE net_range = ?1")
        }
        Query::HeaderRecords => format!(
            "SELECT {RECORD_COLUMNS} FROM records \
             WHERE zone_id = ?1 AND type IN ('NS', 'MX', 'SRV') \
             ORDER BY CASE type WHEN 'NS' THEN 0 WHEN 'MX' THEN 1 ELSE 2 END, pri, host, id"
        ),
        Query::PlainRecords => format!(
            "SELECT {RECORD_COLUMNS} FROM records \
             WHERE zone_id = ?1 AND type NOT IN ('NS', 'MX', 'SRV') \
             ORDER BY type, host, id"
        ),
        Query::GlueRecords => "SELECT id, zone_id, name, pri_ns, sec_ns, pri_dns, sec_dns \
             FROM glue_zones WHERE zone_id = ?1 ORDER BY name, id"
            .to_string(),
        Query::ReverseRecordsForBlock => "SELECT id, rev_zone_id, block, host, destination \
             FROM rev_records WHERE rev_zone_id = ?1 AND block = ?2 ORDER BY id"
            .to_string(),
        Query::ForwardARecordsLike => "SELECT r.destination, r.host, z.name, r.id \
             FROM records r JOIN zones z ON z.id = r.zone_id \
             WHERE r.type = 'A' AND r.destination LIKE ?1 \
             ORDER BY z.name, r.host, r.id"
            .to_string(),
        Query::PreferredAInRange => "SELECT id, ip, record_id, fqdn FROM preferred_a \
             WHERE ip_numeric BETWEEN ?1 AND ?2 ORDER BY ip_numeric"
            .to_string(),
        Query::PreferredAll => {
            "SELECT id, ip, record_id, fqdn FROM preferred_a ORDER BY ip_numeric".to_string()
        }
        Query::DuplicateARecords => "SELECT r.destination, r.host, z.name, r.id \
             FROM records r JOIN zones z ON z.id = r.zone_id \
             WHERE r.type = 'A' AND r.destination IN ( \
                 SELECT destination FROM records WHERE type = 'A' \
                 GROUP BY destination HAVING COUNT(*) > 1) \
             ORDER BY r.destination, z.name, r.host"
            .to_string(),
        Query::RecordIdsByHost => {
            "SELECT id FROM records WHERE zone_id = ?1 AND host = ?2 AND type = ?3 ORDER BY id"
                .to_string()
        }
    }
}

fn mutation_sql(mutation: Mutation) -> &'static str {
    match mutation {
        Mutation::InsertForwardZone => {
            "INSERT INTO zones (name, pri_dns, sec_dns, hostmaster, serial, refresh, retry, \
             expire, ttl, type, master) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
        }
        Mutation::InsertReverseZone => {
            "INSERT INTO rev_zones (net_range, prefix, net_start, net_finish, pri_dns, sec_dns, \
             hostmaster, serial, refresh, retry, expire, ttl, type, master) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
        }
        Mutation::SetForwardValidity => "UPDATE zones SET valid = ?1 WHERE id = ?2",
        Mutation::SetReverseValidity => "UPDATE rev_zones SET valid = ?1 WHERE id = ?2",
        Mutation::CommitForwardSerial => {
            "UPDATE zones SET serial = ?1, updated = 'no' WHERE id = ?2"
        }
        Mutation::CommitReverseSerial => {
            "UPDATE rev_zones SET serial = ?1, updated = 'no' WHERE id = ?2"
        }
        Mutation::MarkForwardUpdated => {
            "UPDATE zones SET updated = 'yes' WHERE id = ?1"
        }
        Mutation::MarkReverseUpdated => {
            "UPDATE rev_zones SET updated = 'yes' WHERE id = ?1"
        }
        Mutation::InsertRecord => {
            "INSERT INTO records (zone_id, host, type, destination, pri, service, protocol) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
        }
        Mutation::DeleteRecord => {
            "DELETE FROM records WHERE zone_id = ?1 AND host = ?2 AND type = ?3"
        }
        Mutation::DeletePreferredForRecord => {
            "DELETE FROM preferred_a WHERE record_id IN \
             (SELECT id FROM records WHERE zone_id = ?1 AND host = ?2 AND type = ?3)"
        }
        Mutation::InsertReverseRecord => {
            "INSERT INTO rev_records (rev_zone_id, block, host, destination) \
             VALUES (?1, ?2, ?3, ?4)"
        }
        Mutation::DeleteReverseRecord => "DELETE FROM rev_records WHERE id = ?1",
        Mutation::InsertPreferredA => {
            "INSERT INTO preferred_a (ip, ip_numeric, record_id, fqdn) VALUES (?1, ?2, ?3, ?4)"
        }
        Mutation::DeletePreferredA => "DELETE FROM preferred_a WHERE ip = ?1",
        Mutation::InsertGlue => {
            "INSERT INTO glue_zones (zone_id, name, pri_ns, sec_ns, pri_dns, sec_dns) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
            Value::Number(n) => ToSqlOutput::from(*n),
            Value::Null => ToSqlOutput::from(rusqlite::types::Null),
        })
    }
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::Number(n),
        #[allow(clippy::cast_possible_truncation)]
        ValueRef::Real(f) => Value::Number(f as i64),
        ValueRef::Text(t) | ValueRef::Blob(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
    }
}

/// Record store backed by a SQLite database file.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Open`] if the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Opened record store");
        Self::with_connection(conn)
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Open`] if SQLite cannot allocate the database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: ":memory:".into(),
            source,
        })?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|source| StoreError::Backend {
                query: "EnableForeignKeys",
                source,
            })?;
        Ok(Self { conn })
    }

    /// Create any missing tables.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the schema cannot be applied.
    pub fn init_schema(&self) -> Result<(), StoreError> {
        self.conn
            .execute_batch(SCHEMA)
            .map_err(|source| StoreError::Backend {
                query: "InitSchema",
                source,
            })
    }
}

impl RecordStore for SqliteStore {
    fn query(&self, query: Query, args: &[Value]) -> Result<Vec<Value>, StoreError> {
        let backend = |source| StoreError::Backend {
            query: query.name(),
            source,
        };
        let sql = query_sql(query);
        let mut stmt = self.conn.prepare_cached(&sql).map_err(backend)?;
        let columns = stmt.column_count();
        let mut rows = stmt.query(params_from_iter(args.iter())).map_err(backend)?;

        let mut values = Vec::new();
        while let Some(row) = rows.next().map_err(backend)? {
            for column in 0..columns {
                values.push(from_sql(row.get_ref(column).map_err(backend)?));
            }
        }
        debug!(query = %query, values = values.len(), "Store query");
        Ok(values)
    }

    fn execute(&self, mutation: Mutation, args: &[Value]) -> Result<usize, StoreError> {
        let affected = self
            .conn
            .prepare_cached(mutation_sql(mutation))
            .and_then(|mut stmt| stmt.execute(params_from_iter(args.iter())))
            .map_err(|source| StoreError::Backend {
                query: mutation.name(),
                source,
            })?;
        debug!(mutation = %mutation, affected, "Store mutation");
        Ok(affected)
    }
}

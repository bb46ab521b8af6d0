// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Record store adapter.
//!
//! The zone builder reads and writes the CMDB's relational store through the
//! small [`RecordStore`] interface:
//!
//! - [`RecordStore::query`] takes a [`Query`] from the catalog plus ordered
//!   arguments and returns a flat list of values whose length is a multiple of
//!   [`Query::width`].
//! - [`RecordStore::execute`] takes a [`Mutation`] plus ordered arguments and
//!   returns the number of affected rows.
//!
//! Each catalog entry owns its SQL text, so backends never see positional
//! lookup tables. [`catalog`] turns the flat lists into model types and is the
//! only place that checks tuple shape.
//!
//! # Example
//!
//! ```rust,no_run
//! use dnsa::store::{catalog, sqlite::SqliteStore};
//!
//! # fn example() -> dnsa::dns_errors::Result<()> {
//! let store = SqliteStore::open_in_memory()?;
//! store.init_schema()?;
//! let zones = catalog::forward_zones(&store)?;
//! assert!(zones.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod sqlite;

use std::fmt;

use crate::dns_errors::StoreError;

/// A single column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Number(i64),
    Null,
}

impl Value {
    /// Text content, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer content; numeric text is accepted too.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Null => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        // Serials are YYYYMMDDnn and stay far below i64::MAX
        Self::Number(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Read-only statements in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    /// Every forward zone, by name
    ForwardZones,
    /// One forward zone; args: name
    ForwardZoneByName,
    /// Every reverse zone, by start address
    ReverseZones,
    /// One reverse zone; args: network range
    ReverseZoneByRange,
    /// NS, MX and SRV records of a zone; args: zone id
    HeaderRecords,
    /// All other records of a zone; args: zone id
    PlainRecords,
    /// Glue for children of a zone; args: zone id
    GlueRecords,
    /// PTR records of one block; args: reverse zone id, block
    ReverseRecordsForBlock,
    /// Every A record whose destination matches; args: LIKE pattern.
    /// Tuple: destination, host, zone name, record id
    ForwardARecordsLike,
    /// Preferred A entries in an address range; args: start, finish
    PreferredAInRange,
    /// Every preferred A entry
    PreferredAll,
    /// A records sharing a destination with another A record.
    /// Tuple: destination, host, zone name, record id
    DuplicateARecords,
    /// Id of a record; args: zone id, host, type
    RecordIdsByHost,
}

impl Query {
    /// Number of values per result tuple.
    #[must_use]
    pub fn width(self) -> usize {
        match self {
            Self::ForwardZones | Self::ForwardZoneByName => 14,
            Self::ReverseZones | Self::ReverseZoneByRange => 17,
            Self::HeaderRecords | Self::PlainRecords => 8,
            Self::GlueRecords => 7,
            Self::ReverseRecordsForBlock => 5,
            Self::ForwardARecordsLike | Self::DuplicateARecords => 4,
            Self::PreferredAInRange | Self::PreferredAll => 4,
            Self::RecordIdsByHost => 1,
        }
    }

    /// Stable name for logs and errors.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::ForwardZones => "ForwardZones",
            Self::ForwardZoneByName => "ForwardZoneByName",
            Self::ReverseZones => "ReverseZones",
            Self::ReverseZoneByRange => "ReverseZoneByRange",
            Self::HeaderRecords => "HeaderRecords",
            Self::PlainRecords => "PlainRecords",
            Self::GlueRecords => "GlueRecords",
            Self::ReverseRecordsForBlock => "ReverseRecordsForBlock",
            Self::ForwardARecordsLike => "ForwardARecordsLike",
            Self::PreferredAInRange => "PreferredAInRange",
            Self::PreferredAll => "PreferredAll",
            Self::DuplicateARecords => "DuplicateARecords",
            Self::RecordIdsByHost => "RecordIdsByHost",
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Write statements in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// args: name, primary ns, secondary ns, hostmaster, serial, refresh,
    /// retry, expire, ttl, type, master
    InsertForwardZone,
    /// args: net range, prefix, start, finish, primary ns, secondary ns,
    /// hostmaster, serial, refresh, retry, expire, ttl, type, master
    InsertReverseZone,
    /// args: validity, zone id
    SetForwardValidity,
    /// args: validity, zone id
    SetReverseValidity,
    /// Store a new serial and clear `updated`; args: serial, zone id
    CommitForwardSerial,
    /// Store a new serial and clear `updated`; args: serial, zone id
    CommitReverseSerial,
    /// args: zone id
    MarkForwardUpdated,
    /// args: zone id
    MarkReverseUpdated,
    /// args: zone id, host, type, destination, priority, service, protocol
    InsertRecord,
    /// args: zone id, host, type
    DeleteRecord,
    /// Drop preferences pointing at records about to go; args: zone id, host, type
    DeletePreferredForRecord,
    /// args: reverse zone id, block, host, destination
    InsertReverseRecord,
    /// args: reverse record id
    DeleteReverseRecord,
    /// args: ip, ip as integer, record id, fqdn
    InsertPreferredA,
    /// args: ip
    DeletePreferredA,
    /// args: zone id, child, primary ns, secondary ns, primary ip, secondary ip
    InsertGlue,
}

impl Mutation {
    /// Stable name for logs and errors.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::InsertForwardZone => "InsertForwardZone",
            Self::InsertReverseZone => "InsertReverseZone",
            Self::SetForwardValidity => "SetForwardValidity",
            Self::SetReverseValidity => "SetReverseValidity",
            Self::CommitForwardSerial => "CommitForwardSerial",
            Self::CommitReverseSerial => "CommitReverseSerial",
            Self::MarkForwardUpdated => "MarkForwardUpdated",
            Self::MarkReverseUpdated => "MarkReverseUpdated",
            Self::InsertRecord => "InsertRecord",
            Self::DeleteRecord => "DeleteRecord",
            Self::DeletePreferredForRecord => "DeletePreferredForRecord",
            Self::InsertReverseRecord => "InsertReverseRecord",
            Self::DeleteReverseRecord => "DeleteReverseRecord",
            Self::InsertPreferredA => "InsertPreferredA",
            Self::DeletePreferredA => "DeletePreferredA",
            Self::InsertGlue => "InsertGlue",
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Query/execute interface over the relational store.
pub trait RecordStore {
    /// Run a catalog query, returning a flat list of values.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend fails.
    fn query(&self, query: Query, args: &[Value]) -> Result<Vec<Value>, StoreError>;

    /// Run a catalog mutation, returning the affected row count.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend fails.
    fn execute(&self, mutation: Mutation, args: &[Value]) -> Result<usize, StoreError>;
}

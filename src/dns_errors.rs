// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for zone building and reverse-zone reconciliation.
//!
//! This module provides specialized error types for:
//! - CIDR range arithmetic on reverse zones
//! - Zone lookups and record-set decoding
//! - The relational record store
//! - External processes (`named-checkzone`, `named-checkconf`, `rndc`)
//!
//! Every error maps to a stable reason key via [`DnsaError::status_reason`], which is
//! what gets logged when a build fails.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by reverse-zone range arithmetic (`ErrRangeInvalid`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// Prefix length outside {8, 16, 24, 25..=32}
    #[error("Illegal reverse zone prefix /{prefix}: only /8, /16, /24 and /25-/32 are supported")]
    IllegalPrefix {
        /// The rejected prefix length
        prefix: u8,
    },

    /// Network string missing
    #[error("Network address is empty")]
    EmptyNetwork,

    /// Network string is not a dotted IPv4 address
    #[error("Invalid IPv4 network address '{network}'")]
    InvalidNetwork {
        /// The rejected network string
        network: String,
    },

    /// Network address has host bits set for the given prefix
    #[error("Network {network}/{prefix} is not aligned to its prefix")]
    Misaligned {
        /// The network string
        network: String,
        /// The prefix length
        prefix: u8,
    },

    /// Block index beyond the number of blocks the prefix defines
    #[error("Block {block} out of range for /{prefix} ({blocks} blocks)")]
    BlockOutOfRange {
        /// Requested block
        block: u32,
        /// Prefix length
        prefix: u8,
        /// Number of blocks for the prefix
        blocks: u32,
    },

    /// Name is not a reverse zone this tool would produce
    #[error("'{name}' is not a recognised in-addr.arpa zone name")]
    InvalidArpaName {
        /// The rejected name
        name: String,
    },
}

/// Errors related to zone lookup and record-set shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ZoneError {
    /// No zone with this name or range in the store
    #[error("Zone '{zone}' not found")]
    ZoneNotFound {
        /// Zone name or network range
        zone: String,
    },

    /// A master-only operation was requested on a slave zone
    #[error("Zone '{zone}' is not a master zone")]
    NotMaster {
        /// Zone name or network range
        zone: String,
    },

    /// A result list was not a whole number of tuples
    #[error("Malformed record set from {query}: {len} values is not a multiple of {width}")]
    MalformedRecordSet {
        /// The query that produced the list
        query: &'static str,
        /// Number of values returned
        len: usize,
        /// Expected tuple width
        width: usize,
    },

    /// A value in a tuple had the wrong type or an unparsable content
    #[error("Bad value in {query} column {column}: {reason}")]
    BadValue {
        /// The query that produced the value
        query: &'static str,
        /// Zero-based column within the tuple
        column: usize,
        /// What was wrong
        reason: String,
    },

    /// An SRV record names a service/protocol pair with no known port
    #[error("No port known for service '{service}/{protocol}'")]
    UnknownService {
        /// Service name (e.g. "sip")
        service: String,
        /// Protocol name (e.g. "tcp")
        protocol: String,
    },
}

/// Errors from the record store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend rejected or failed a statement
    #[error("Record store query {query} failed: {source}")]
    Backend {
        /// The catalog entry being executed
        query: &'static str,
        /// Underlying database error
        #[source]
        source: rusqlite::Error,
    },

    /// A database file could not be opened
    #[error("Cannot open record store at {path}: {source}")]
    Open {
        /// Database path
        path: PathBuf,
        /// Underlying database error
        #[source]
        source: rusqlite::Error,
    },

    /// A statement affected a different number of rows than required
    #[error("Record store mutation {query} affected {got} rows, expected {expect}")]
    WrongRowCount {
        /// The catalog entry being executed
        query: &'static str,
        /// Rows actually affected
        got: usize,
        /// Rows expected
        expect: usize,
    },
}

/// Errors from external processes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    /// The checker binary could not be executed at all
    #[error("Zone checker '{program}' unavailable: {reason}")]
    CheckerUnavailable {
        /// Program path
        program: String,
        /// OS error text
        reason: String,
    },

    /// The configuration checker rejected a named.conf fragment
    #[error("Configuration check of {path} failed: {output}")]
    ConfigRejected {
        /// Fragment path
        path: String,
        /// Checker output
        output: String,
    },

    /// The reload command could not be run or exited non-zero
    #[error("Reload via '{program}' failed: {reason}")]
    ReloadFailed {
        /// Program path
        program: String,
        /// Exit status or OS error text
        reason: String,
    },
}

/// Composite error type for every dnsa operation.
///
/// This is the error returned by the build, reconcile and emit functions. It
/// provides a single place to classify failures for logging and exit codes.
#[derive(Error, Debug)]
pub enum DnsaError {
    /// CIDR range error
    #[error(transparent)]
    Range(#[from] RangeError),

    /// Zone lookup or record-set error
    #[error(transparent)]
    Zone(#[from] ZoneError),

    /// Record store error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// External process error
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// File could not be created, written or renamed
    #[error("Cannot write {path}: {source}")]
    File {
        /// File path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl DnsaError {
    /// Wrap an I/O error with the path it happened on.
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    /// Returns true for failures that are logged but never abort the caller.
    ///
    /// A failed reload leaves already-written files in place, and an unavailable
    /// checker still records the zone as invalid.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Process(
                ProcessError::ReloadFailed { .. } | ProcessError::CheckerUnavailable { .. }
            )
        )
    }

    /// Returns the stable reason key for this error, used in log lines.
    #[must_use]
    pub fn status_reason(&self) -> &'static str {
        match self {
            Self::Range(RangeError::IllegalPrefix { .. }) => "IllegalPrefix",
            Self::Range(RangeError::EmptyNetwork) => "EmptyNetwork",
            Self::Range(RangeError::InvalidNetwork { .. }) => "InvalidNetwork",
            Self::Range(RangeError::Misaligned { .. }) => "MisalignedNetwork",
            Self::Range(RangeError::BlockOutOfRange { .. }) => "BlockOutOfRange",
            Self::Range(RangeError::InvalidArpaName { .. }) => "InvalidArpaName",

            Self::Zone(ZoneError::ZoneNotFound { .. }) => "ZoneNotFound",
            Self::Zone(ZoneError::NotMaster { .. }) => "ZoneNotMaster",
            Self::Zone(ZoneError::MalformedRecordSet { .. }) => "MalformedRecordSet",
            Self::Zone(ZoneError::BadValue { .. }) => "BadRecordValue",
            Self::Zone(ZoneError::UnknownService { .. }) => "UnknownService",

            Self::Store(StoreError::Backend { .. }) => "StoreQueryFailed",
            Self::Store(StoreError::Open { .. }) => "StoreOpenFailed",
            Self::Store(StoreError::WrongRowCount { .. }) => "StoreRowCountMismatch",

            Self::Process(ProcessError::CheckerUnavailable { .. }) => "CheckerUnavailable",
            Self::Process(ProcessError::ConfigRejected { .. }) => "ConfigRejected",
            Self::Process(ProcessError::ReloadFailed { .. }) => "ReloadFailed",

            Self::File { .. } => "FileWriteFailed",
        }
    }
}

/// Result alias used across the library.
pub type Result<T, E = DnsaError> = std::result::Result<T, E>;

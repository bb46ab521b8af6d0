// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone and record types read from the record store.
//!
//! These types live for a single build invocation. They are decoded from the
//! store's result tuples by [`crate::store::catalog`], handed to the renderer and
//! reconciler, and dropped when the build finishes.

use hickory_proto::rr::RecordType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

use crate::constants::{NO_SECONDARY_NS, ZONE_APEX};
use crate::dns_errors::RangeError;
use crate::net_range::NetRange;

/// Result of the last zone check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Validity {
    /// Never checked, or changed since the last check
    #[default]
    Unknown,
    /// Accepted by the zone checker
    Valid,
    /// Rejected by the zone checker, or the checker could not run
    Invalid,
}

impl Validity {
    /// Store representation (`"unknown"`, `"yes"`, `"no"`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Valid => "yes",
            Self::Invalid => "no",
        }
    }

    /// Parse the store representation. Anything unrecognised is `Unknown`.
    #[must_use]
    pub fn from_store(value: &str) -> Self {
        match value {
            "yes" => Self::Valid,
            "no" => Self::Invalid,
            _ => Self::Unknown,
        }
    }

    /// Map a checker verdict.
    #[must_use]
    pub fn from_check(valid: bool) -> Self {
        if valid {
            Self::Valid
        } else {
            Self::Invalid
        }
    }
}

impl fmt::Display for Validity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether this server is authoritative master or a slave for a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    #[default]
    Master,
    Slave,
}

impl ZoneKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::Slave => "slave",
        }
    }

    #[must_use]
    pub fn from_store(value: &str) -> Self {
        if value.eq_ignore_ascii_case("slave") {
            Self::Slave
        } else {
            Self::Master
        }
    }
}

/// SOA timer fields, all in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoaTimers {
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    /// Default TTL, also written as the negative-cache TTL
    pub ttl: u32,
}

/// A forward zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForwardZone {
    pub id: i64,
    /// Zone name without a trailing dot
    pub name: String,
    pub primary_ns: String,
    pub secondary_ns: Option<String>,
    pub hostmaster: String,
    /// `YYYYMMDDnn`
    pub serial: u64,
    #[serde(flatten)]
    pub timers: SoaTimers,
    pub validity: Validity,
    /// Set when records changed since the last successful build
    pub updated: bool,
    pub kind: ZoneKind,
    /// Master server address for slave zones
    pub master: Option<String>,
}

/// A reverse zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReverseZone {
    pub id: i64,
    /// Dotted network address
    pub net_range: String,
    pub prefix: u8,
    pub net_start: u32,
    pub net_finish: u32,
    pub primary_ns: String,
    pub secondary_ns: Option<String>,
    pub hostmaster: String,
    pub serial: u64,
    #[serde(flatten)]
    pub timers: SoaTimers,
    pub validity: Validity,
    pub updated: bool,
    pub kind: ZoneKind,
    pub master: Option<String>,
}

impl ReverseZone {
    /// Validated network range of this zone.
    ///
    /// # Errors
    ///
    /// Returns a [`RangeError`] if the stored range or prefix is illegal.
    pub fn range(&self) -> Result<NetRange, RangeError> {
        NetRange::new(&self.net_range, self.prefix)
    }

    /// The zone's `in-addr.arpa` name.
    ///
    /// # Errors
    ///
    /// See [`ReverseZone::range`].
    pub fn arpa_name(&self) -> Result<String, RangeError> {
        Ok(self.range()?.arpa_name())
    }
}

/// A forward record (NS, MX, SRV, A, CNAME, TXT, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: i64,
    pub zone_id: i64,
    pub host: String,
    pub rtype: RecordType,
    pub destination: String,
    /// MX and SRV priority
    pub priority: Option<u16>,
    /// SRV service name, without the leading underscore
    pub service: Option<String>,
    /// SRV protocol name, without the leading underscore
    pub protocol: Option<String>,
}

impl Record {
    /// True for record types rendered in the zone header (NS, MX, SRV).
    #[must_use]
    pub fn is_header(&self) -> bool {
        matches!(
            self.rtype,
            RecordType::NS | RecordType::MX | RecordType::SRV
        )
    }
}

/// A PTR record in a reverse zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseRecord {
    pub id: i64,
    pub rev_zone_id: i64,
    /// Classless block the record belongs to (0 for octet-aligned zones)
    pub block: u32,
    /// Owner label relative to the zone origin
    pub host: String,
    /// Target FQDN with trailing dot
    pub destination: String,
}

/// Delegation of a child zone, rendered into its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlueRecord {
    pub id: i64,
    pub zone_id: i64,
    /// Child zone name, relative label or FQDN
    pub child: String,
    pub primary_ns: String,
    pub secondary_ns: Option<String>,
    pub primary_ip: Option<Ipv4Addr>,
    pub secondary_ip: Option<Ipv4Addr>,
}

/// Which A record owns the PTR for an address shared by several A records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreferredA {
    pub id: i64,
    pub ip: Ipv4Addr,
    pub record_id: i64,
    pub fqdn: String,
}

/// Append the root dot unless the name already carries one.
#[must_use]
pub fn fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{name}.")
    }
}

/// Fully qualified owner name of a record; `@` expands to the zone itself.
#[must_use]
pub fn record_fqdn(host: &str, zone: &str) -> String {
    let zone = zone.strip_suffix('.').unwrap_or(zone);
    if host == ZONE_APEX || host.is_empty() {
        format!("{zone}.")
    } else {
        format!("{host}.{zone}.")
    }
}

/// Normalise a stored secondary nameserver; empty and `none` mean absent.
#[must_use]
pub fn optional_ns(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case(NO_SECONDARY_NS) {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod model_tests;

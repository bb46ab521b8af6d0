// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Typed access to the record store.
//!
//! Every read goes through [`rows`], which rejects a result list whose length is
//! not a whole number of tuples before a single value is decoded. Nothing
//! downstream of this module ever sees a partial tuple.

use hickory_proto::rr::RecordType;
use std::net::Ipv4Addr;
use std::str::FromStr;

use super::{Mutation, Query, RecordStore, Value};
use crate::dns_errors::{Result, StoreError, ZoneError};
use crate::model::{
    optional_ns, ForwardZone, GlueRecord, PreferredA, Record, ReverseRecord, ReverseZone,
    SoaTimers, Validity, ZoneKind,
};
use crate::net_range::NetRange;

/// One result tuple.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    query: &'static str,
    values: &'a [Value],
}

impl<'a> Row<'a> {
    fn bad(&self, column: usize, reason: impl Into<String>) -> ZoneError {
        ZoneError::BadValue {
            query: self.query,
            column,
            reason: reason.into(),
        }
    }

    /// Required text column.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::BadValue`] for a null or numeric value.
    pub fn text(&self, column: usize) -> Result<&'a str, ZoneError> {
        self.values[column]
            .as_text()
            .ok_or_else(|| self.bad(column, "expected text"))
    }

    /// Optional text column; null and empty text are `None`.
    #[must_use]
    pub fn opt_text(&self, column: usize) -> Option<String> {
        self.values[column]
            .as_text()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Required integer column converted to `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::BadValue`] if the value is missing or out of range.
    pub fn int<T: TryFrom<i64>>(&self, column: usize) -> Result<T, ZoneError> {
        let raw = self.values[column]
            .as_i64()
            .ok_or_else(|| self.bad(column, "expected a number"))?;
        T::try_from(raw).map_err(|_| self.bad(column, format!("{raw} out of range")))
    }

    /// Optional integer column.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::BadValue`] if a present value is out of range.
    pub fn opt_int<T: TryFrom<i64>>(&self, column: usize) -> Result<Option<T>, ZoneError> {
        match self.values[column] {
            Value::Null => Ok(None),
            _ => self.int(column).map(Some),
        }
    }

    /// Required IPv4 address column.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::BadValue`] if the text is not a dotted quad.
    pub fn ipv4(&self, column: usize) -> Result<Ipv4Addr, ZoneError> {
        let text = self.text(column)?;
        Ipv4Addr::from_str(text.trim()).map_err(|_| self.bad(column, format!("'{text}' is not IPv4")))
    }

    fn opt_ipv4(&self, column: usize) -> Result<Option<Ipv4Addr>, ZoneError> {
        match self.opt_text(column) {
            Some(_) => self.ipv4(column).map(Some),
            None => Ok(None),
        }
    }

    fn flag(&self, column: usize) -> Result<bool, ZoneError> {
        Ok(self.text(column)? == "yes")
    }
}

/// Split a flat result list into tuples of the query's width.
///
/// # Errors
///
/// Returns [`ZoneError::MalformedRecordSet`] when the list length is not a
/// multiple of [`Query::width`].
pub fn rows(query: Query, values: &[Value]) -> Result<Vec<Row<'_>>, ZoneError> {
    let width = query.width();
    if values.len() % width != 0 {
        return Err(ZoneError::MalformedRecordSet {
            query: query.name(),
            len: values.len(),
            width,
        });
    }
    Ok(values
        .chunks_exact(width)
        .map(|values| Row {
            query: query.name(),
            values,
        })
        .collect())
}

fn fetch<T>(
    store: &dyn RecordStore,
    query: Query,
    args: &[Value],
    decode: impl Fn(&Row<'_>) -> Result<T, ZoneError>,
) -> Result<Vec<T>> {
    let values = store.query(query, args)?;
    let decoded = rows(query, &values)?
        .iter()
        .map(decode)
        .collect::<Result<Vec<T>, ZoneError>>()?;
    Ok(decoded)
}

fn timers(row: &Row<'_>, first: usize) -> Result<SoaTimers, ZoneError> {
    Ok(SoaTimers {
        refresh: row.int(first)?,
        retry: row.int(first + 1)?,
        expire: row.int(first + 2)?,
        ttl: row.int(first + 3)?,
    })
}

fn decode_forward_zone(row: &Row<'_>) -> Result<ForwardZone, ZoneError> {
    Ok(ForwardZone {
        id: row.int(0)?,
        name: row.text(1)?.to_string(),
        primary_ns: row.text(2)?.to_string(),
        secondary_ns: row.opt_text(3).as_deref().and_then(optional_ns),
        hostmaster: row.text(4)?.to_string(),
        serial: row.int(5)?,
        timers: timers(row, 6)?,
        validity: Validity::from_store(row.text(10)?),
        updated: row.flag(11)?,
        kind: ZoneKind::from_store(row.text(12)?),
        master: row.opt_text(13),
    })
}

fn decode_reverse_zone(row: &Row<'_>) -> Result<ReverseZone, ZoneError> {
    Ok(ReverseZone {
        id: row.int(0)?,
        net_range: row.text(1)?.to_string(),
        prefix: row.int(2)?,
        net_start: row.int(3)?,
        net_finish: row.int(4)?,
        primary_ns: row.text(5)?.to_string(),
        secondary_ns: row.opt_text(6).as_deref().and_then(optional_ns),
        hostmaster: row.text(7)?.to_string(),
        serial: row.int(8)?,
        timers: timers(row, 9)?,
        validity: Validity::from_store(row.text(13)?),
        updated: row.flag(14)?,
        kind: ZoneKind::from_store(row.text(15)?),
        master: row.opt_text(16),
    })
}

fn decode_record(row: &Row<'_>) -> Result<Record, ZoneError> {
    let rtype = row.text(3)?;
    Ok(Record {
        id: row.int(0)?,
        zone_id: row.int(1)?,
        host: row.text(2)?.to_string(),
        rtype: RecordType::from_str(rtype)
            .map_err(|_| row.bad(3, format!("unknown record type '{rtype}'")))?,
        destination: row.text(4)?.to_string(),
        priority: row.opt_int(5)?,
        service: row.opt_text(6),
        protocol: row.opt_text(7),
    })
}

fn decode_glue(row: &Row<'_>) -> Result<GlueRecord, ZoneError> {
    Ok(GlueRecord {
        id: row.int(0)?,
        zone_id: row.int(1)?,
        child: row.text(2)?.to_string(),
        primary_ns: row.text(3)?.to_string(),
        secondary_ns: row.opt_text(4).as_deref().and_then(optional_ns),
        primary_ip: row.opt_ipv4(5)?,
        secondary_ip: row.opt_ipv4(6)?,
    })
}

fn decode_reverse_record(row: &Row<'_>) -> Result<ReverseRecord, ZoneError> {
    Ok(ReverseRecord {
        id: row.int(0)?,
        rev_zone_id: row.int(1)?,
        block: row.int(2)?,
        host: row.text(3)?.to_string(),
        destination: row.text(4)?.to_string(),
    })
}

fn decode_preferred(row: &Row<'_>) -> Result<PreferredA, ZoneError> {
    Ok(PreferredA {
        id: row.int(0)?,
        ip: row.ipv4(1)?,
        record_id: row.int(2)?,
        fqdn: row.text(3)?.to_string(),
    })
}

/// An A record that may own a PTR record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardCandidate {
    pub ip: Ipv4Addr,
    pub host: String,
    pub zone: String,
    pub record_id: i64,
}

fn decode_candidate(row: &Row<'_>) -> Result<ForwardCandidate, ZoneError> {
    Ok(ForwardCandidate {
        ip: row.ipv4(0)?,
        host: row.text(1)?.to_string(),
        zone: row.text(2)?.to_string(),
        record_id: row.int(3)?,
    })
}

// ===== Reads =====

/// Every forward zone.
///
/// # Errors
///
/// Returns a store error or [`ZoneError::MalformedRecordSet`].
pub fn forward_zones(store: &dyn RecordStore) -> Result<Vec<ForwardZone>> {
    fetch(store, Query::ForwardZones, &[], decode_forward_zone)
}

/// One forward zone by name.
///
/// # Errors
///
/// Returns [`ZoneError::ZoneNotFound`] if no zone has that name.
pub fn forward_zone(store: &dyn RecordStore, name: &str) -> Result<ForwardZone> {
    let name = name.strip_suffix('.').unwrap_or(name);
    fetch(
        store,
        Query::ForwardZoneByName,
        &[name.into()],
        decode_forward_zone,
    )?
    .into_iter()
    .next()
    .ok_or_else(|| {
        ZoneError::ZoneNotFound {
            zone: name.to_string(),
        }
        .into()
    })
}

/// Every reverse zone.
///
/// # Errors
///
/// Returns a store error or [`ZoneError::MalformedRecordSet`].
pub fn reverse_zones(store: &dyn RecordStore) -> Result<Vec<ReverseZone>> {
    fetch(store, Query::ReverseZones, &[], decode_reverse_zone)
}

/// One reverse zone by its network address.
///
/// # Errors
///
/// Returns [`ZoneError::ZoneNotFound`] if no zone covers that range.
pub fn reverse_zone(store: &dyn RecordStore, net_range: &str) -> Result<ReverseZone> {
    fetch(
        store,
        Query::ReverseZoneByRange,
        &[net_range.into()],
        decode_reverse_zone,
    )?
    .into_iter()
    .next()
    .ok_or_else(|| {
        ZoneError::ZoneNotFound {
            zone: net_range.to_string(),
        }
        .into()
    })
}

/// NS, MX and SRV records of a zone, grouped in that order.
///
/// # Errors
///
/// Returns a store error or a record-set shape error.
pub fn header_records(store: &dyn RecordStore, zone_id: i64) -> Result<Vec<Record>> {
    fetch(store, Query::HeaderRecords, &[zone_id.into()], decode_record)
}

/// A, CNAME, TXT and any other non-header records of a zone.
///
/// # Errors
///
/// Returns a store error or a record-set shape error.
pub fn plain_records(store: &dyn RecordStore, zone_id: i64) -> Result<Vec<Record>> {
    fetch(store, Query::PlainRecords, &[zone_id.into()], decode_record)
}

/// Glue for children delegated from a zone.
///
/// # Errors
///
/// Returns a store error or a record-set shape error.
pub fn glue_records(store: &dyn RecordStore, zone_id: i64) -> Result<Vec<GlueRecord>> {
    fetch(store, Query::GlueRecords, &[zone_id.into()], decode_glue)
}

/// PTR records in one block of a reverse zone.
///
/// # Errors
///
/// Returns a store error or a record-set shape error.
pub fn reverse_records(
    store: &dyn RecordStore,
    rev_zone_id: i64,
    block: u32,
) -> Result<Vec<ReverseRecord>> {
    fetch(
        store,
        Query::ReverseRecordsForBlock,
        &[rev_zone_id.into(), block.into()],
        decode_reverse_record,
    )
}

/// A records whose destination falls inside `range`, across all forward zones.
///
/// # Errors
///
/// Returns a store error or a record-set shape error.
pub fn forward_candidates(
    store: &dyn RecordStore,
    range: &NetRange,
) -> Result<Vec<ForwardCandidate>> {
    let search = range.search_range();
    let mut candidates = fetch(
        store,
        Query::ForwardARecordsLike,
        &[search.pattern.clone().into()],
        decode_candidate,
    )?;
    candidates.retain(|c| search.contains(c.ip));
    Ok(candidates)
}

/// Preferred A entries whose address is inside `range`.
///
/// # Errors
///
/// Returns a store error or a record-set shape error.
pub fn preferred_in_range(store: &dyn RecordStore, range: &NetRange) -> Result<Vec<PreferredA>> {
    fetch(
        store,
        Query::PreferredAInRange,
        &[range.start().into(), range.finish().into()],
        decode_preferred,
    )
}

/// Every preferred A entry.
///
/// # Errors
///
/// Returns a store error or a record-set shape error.
pub fn preferred_all(store: &dyn RecordStore) -> Result<Vec<PreferredA>> {
    fetch(store, Query::PreferredAll, &[], decode_preferred)
}

/// A records that share their address with at least one other A record.
///
/// # Errors
///
/// Returns a store error or a record-set shape error.
pub fn duplicate_a_records(store: &dyn RecordStore) -> Result<Vec<ForwardCandidate>> {
    fetch(store, Query::DuplicateARecords, &[], decode_candidate)
}

/// Ids of the records with this owner and type in a zone.
///
/// # Errors
///
/// Returns a store error or a record-set shape error.
pub fn record_ids(
    store: &dyn RecordStore,
    zone_id: i64,
    host: &str,
    rtype: RecordType,
) -> Result<Vec<i64>> {
    fetch(
        store,
        Query::RecordIdsByHost,
        &[zone_id.into(), host.into(), rtype.to_string().into()],
        |row| row.int(0),
    )
}

// ===== Writes =====

fn expect_one(mutation: Mutation, got: usize) -> Result<(), StoreError> {
    if got == 1 {
        Ok(())
    } else {
        Err(StoreError::WrongRowCount {
            query: mutation.name(),
            got,
            expect: 1,
        })
    }
}

fn execute_one(store: &dyn RecordStore, mutation: Mutation, args: &[Value]) -> Result<()> {
    let got = store.execute(mutation, args)?;
    expect_one(mutation, got)?;
    Ok(())
}

/// Record the checker verdict for a forward zone.
///
/// # Errors
///
/// Returns a store error if the zone row was not updated.
pub fn set_forward_validity(store: &dyn RecordStore, zone_id: i64, validity: Validity) -> Result<()> {
    execute_one(
        store,
        Mutation::SetForwardValidity,
        &[validity.as_str().into(), zone_id.into()],
    )
}

/// Record the checker verdict for a reverse zone.
///
/// # Errors
///
/// Returns a store error if the zone row was not updated.
pub fn set_reverse_validity(store: &dyn RecordStore, zone_id: i64, validity: Validity) -> Result<()> {
    execute_one(
        store,
        Mutation::SetReverseValidity,
        &[validity.as_str().into(), zone_id.into()],
    )
}

/// Persist a published serial and clear the updated flag.
///
/// # Errors
///
/// Returns a store error if the zone row was not updated.
pub fn commit_forward_serial(store: &dyn RecordStore, zone_id: i64, serial: u64) -> Result<()> {
    execute_one(
        store,
        Mutation::CommitForwardSerial,
        &[serial.into(), zone_id.into()],
    )
}

/// Persist a published serial and clear the updated flag.
///
/// # Errors
///
/// Returns a store error if the zone row was not updated.
pub fn commit_reverse_serial(store: &dyn RecordStore, zone_id: i64, serial: u64) -> Result<()> {
    execute_one(
        store,
        Mutation::CommitReverseSerial,
        &[serial.into(), zone_id.into()],
    )
}

/// Flag a forward zone as changed since its last build.
///
/// The stored validity stands until the next check replaces it, so a live zone
/// stays listed in named.conf while its edit is pending.
///
/// # Errors
///
/// Returns a store error if the zone row was not updated.
pub fn mark_forward_updated(store: &dyn RecordStore, zone_id: i64) -> Result<()> {
    execute_one(store, Mutation::MarkForwardUpdated, &[zone_id.into()])
}

/// Flag a reverse zone as changed since its last build. The stored validity
/// is kept.
///
/// # Errors
///
/// Returns a store error if the zone row was not updated.
pub fn mark_reverse_updated(store: &dyn RecordStore, zone_id: i64) -> Result<()> {
    execute_one(store, Mutation::MarkReverseUpdated, &[zone_id.into()])
}

/// Insert a PTR record.
///
/// # Errors
///
/// Returns a store error if the row was not inserted.
pub fn insert_reverse_record(
    store: &dyn RecordStore,
    rev_zone_id: i64,
    block: u32,
    host: &str,
    destination: &str,
) -> Result<()> {
    execute_one(
        store,
        Mutation::InsertReverseRecord,
        &[
            rev_zone_id.into(),
            block.into(),
            host.into(),
            destination.into(),
        ],
    )
}

/// Delete a PTR record by id.
///
/// # Errors
///
/// Returns a store error if the row was not deleted.
pub fn delete_reverse_record(store: &dyn RecordStore, id: i64) -> Result<()> {
    execute_one(store, Mutation::DeleteReverseRecord, &[id.into()])
}

/// New forward zone definition.
#[derive(Debug, Clone)]
pub struct NewForwardZone<'a> {
    pub name: &'a str,
    pub primary_ns: &'a str,
    pub secondary_ns: Option<&'a str>,
    pub hostmaster: &'a str,
    pub timers: SoaTimers,
    pub kind: ZoneKind,
    pub master: Option<&'a str>,
}

/// Insert a forward zone with serial 0, marked updated.
///
/// # Errors
///
/// Returns a store error, e.g. when the name already exists.
pub fn insert_forward_zone(store: &dyn RecordStore, zone: &NewForwardZone<'_>) -> Result<()> {
    let name = zone.name.strip_suffix('.').unwrap_or(zone.name);
    execute_one(
        store,
        Mutation::InsertForwardZone,
        &[
            name.into(),
            zone.primary_ns.into(),
            zone.secondary_ns.unwrap_or(crate::constants::NO_SECONDARY_NS).into(),
            zone.hostmaster.into(),
            0i64.into(),
            zone.timers.refresh.into(),
            zone.timers.retry.into(),
            zone.timers.expire.into(),
            zone.timers.ttl.into(),
            zone.kind.as_str().into(),
            zone.master.into(),
        ],
    )
}

/// New reverse zone definition.
#[derive(Debug, Clone)]
pub struct NewReverseZone<'a> {
    pub range: NetRange,
    pub primary_ns: &'a str,
    pub secondary_ns: Option<&'a str>,
    pub hostmaster: &'a str,
    pub timers: SoaTimers,
    pub kind: ZoneKind,
    pub master: Option<&'a str>,
}

/// Insert a reverse zone with serial 0, marked updated.
///
/// # Errors
///
/// Returns a store error, e.g. when the range already exists.
pub fn insert_reverse_zone(store: &dyn RecordStore, zone: &NewReverseZone<'_>) -> Result<()> {
    execute_one(
        store,
        Mutation::InsertReverseZone,
        &[
            zone.range.network().to_string().into(),
            zone.range.prefix().into(),
            zone.range.start().into(),
            zone.range.finish().into(),
            zone.primary_ns.into(),
            zone.secondary_ns.unwrap_or(crate::constants::NO_SECONDARY_NS).into(),
            zone.hostmaster.into(),
            0i64.into(),
            zone.timers.refresh.into(),
            zone.timers.retry.into(),
            zone.timers.expire.into(),
            zone.timers.ttl.into(),
            zone.kind.as_str().into(),
            zone.master.into(),
        ],
    )
}

/// New forward record.
#[derive(Debug, Clone)]
pub struct NewRecord<'a> {
    pub zone_id: i64,
    pub host: &'a str,
    pub rtype: RecordType,
    pub destination: &'a str,
    pub priority: Option<u16>,
    pub service: Option<&'a str>,
    pub protocol: Option<&'a str>,
}

/// Insert a forward record and flag its zone as updated.
///
/// # Errors
///
/// Returns a store error if either statement fails.
pub fn insert_record(store: &dyn RecordStore, record: &NewRecord<'_>) -> Result<()> {
    execute_one(
        store,
        Mutation::InsertRecord,
        &[
            record.zone_id.into(),
            record.host.into(),
            record.rtype.to_string().into(),
            record.destination.into(),
            record.priority.into(),
            record.service.into(),
            record.protocol.into(),
        ],
    )?;
    mark_forward_updated(store, record.zone_id)
}

/// Delete records by owner and type, along with any preferences pointing at
/// them. Returns the number of records removed.
///
/// # Errors
///
/// Returns a store error if a statement fails.
pub fn delete_records(
    store: &dyn RecordStore,
    zone_id: i64,
    host: &str,
    rtype: RecordType,
) -> Result<usize> {
    let args: [Value; 3] = [zone_id.into(), host.into(), rtype.to_string().into()];
    store.execute(Mutation::DeletePreferredForRecord, &args)?;
    let removed = store.execute(Mutation::DeleteRecord, &args)?;
    if removed > 0 {
        mark_forward_updated(store, zone_id)?;
    }
    Ok(removed)
}

/// Mark `record_id` as the owner of the PTR record for `ip`.
///
/// # Errors
///
/// Returns a store error, e.g. when `ip` already has a preference.
pub fn insert_preferred(
    store: &dyn RecordStore,
    ip: Ipv4Addr,
    record_id: i64,
    fqdn: &str,
) -> Result<()> {
    execute_one(
        store,
        Mutation::InsertPreferredA,
        &[
            ip.to_string().into(),
            u32::from(ip).into(),
            record_id.into(),
            fqdn.into(),
        ],
    )
}

/// Remove the preference for `ip`. Returns the number of rows removed.
///
/// # Errors
///
/// Returns a store error if the statement fails.
pub fn delete_preferred(store: &dyn RecordStore, ip: Ipv4Addr) -> Result<usize> {
    Ok(store.execute(Mutation::DeletePreferredA, &[ip.to_string().into()])?)
}

/// New glue entry.
#[derive(Debug, Clone)]
pub struct NewGlue<'a> {
    pub zone_id: i64,
    pub child: &'a str,
    pub primary_ns: &'a str,
    pub secondary_ns: Option<&'a str>,
    pub primary_ip: Option<Ipv4Addr>,
    pub secondary_ip: Option<Ipv4Addr>,
}

/// Insert a glue entry and flag the parent zone as updated.
///
/// # Errors
///
/// Returns a store error if either statement fails.
pub fn insert_glue(store: &dyn RecordStore, glue: &NewGlue<'_>) -> Result<()> {
    execute_one(
        store,
        Mutation::InsertGlue,
        &[
            glue.zone_id.into(),
            glue.child.into(),
            glue.primary_ns.into(),
            glue.secondary_ns.unwrap_or(crate::constants::NO_SECONDARY_NS).into(),
            glue.primary_ip.map(|ip| ip.to_string()).into(),
            glue.secondary_ip.map(|ip| ip.to_string()).into(),
        ],
    )?;
    mark_forward_updated(store, glue.zone_id)
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod catalog_tests;

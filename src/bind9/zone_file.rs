// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! BIND master-file rendering for forward and reverse zones.
//!
//! Output is tab separated and fully determined by its inputs: the same zone,
//! records and serial always render to the same bytes.
//!
//! ```text
//! $TTL	86400
//! @	IN	SOA	ns1.example.com.	hostmaster.example.com. (
//! 			2024010201	; Serial
//! 			604800	; Refresh
//! 			86400	; Retry
//! 			2419200	; Expire
//! 			86400 )	; Negative Cache TTL
//! ;
//! 	IN	NS	ns1.example.com.
//! www	IN	A	10.0.0.5
//! ```

use hickory_proto::rr::RecordType;
use std::fmt::Write as _;

use crate::constants::{SRV_DEFAULT_WEIGHT, ZONE_APEX};
use crate::dns_errors::ZoneError;
use crate::model::{fqdn, ForwardZone, GlueRecord, Record, ReverseRecord, ReverseZone, SoaTimers};
use crate::serial::SERIAL_COMMENT;
use crate::services::ServiceTable;

/// Records that make up a forward zone, as read from the store.
#[derive(Debug, Clone, Copy)]
pub struct ForwardZoneRecords<'a> {
    /// NS, MX and SRV records
    pub header: &'a [Record],
    /// A, AAAA, CNAME, TXT and others
    pub plain: &'a [Record],
    pub glue: &'a [GlueRecord],
}

/// Qualify a target that names a host in another label tree.
///
/// Single labels stay relative to the zone origin; anything with a dot is
/// treated as absolute.
fn target(name: &str) -> String {
    if name.contains('.') {
        fqdn(name)
    } else {
        name.to_string()
    }
}

fn owner(host: &str) -> &str {
    if host.is_empty() {
        ZONE_APEX
    } else {
        host
    }
}

fn write_soa(
    out: &mut String,
    primary_ns: &str,
    hostmaster: &str,
    serial: u64,
    timers: &SoaTimers,
) {
    let _ = writeln!(out, "$TTL\t{}", timers.ttl);
    let _ = writeln!(
        out,
        "@\tIN\tSOA\t{}\t{} (",
        fqdn(primary_ns),
        fqdn(hostmaster)
    );
    let _ = writeln!(out, "\t\t\t{serial}\t{SERIAL_COMMENT}");
    let _ = writeln!(out, "\t\t\t{}\t; Refresh", timers.refresh);
    let _ = writeln!(out, "\t\t\t{}\t; Retry", timers.retry);
    let _ = writeln!(out, "\t\t\t{}\t; Expire", timers.expire);
    let _ = writeln!(out, "\t\t\t{} )\t; Negative Cache TTL", timers.ttl);
    out.push_str(";\n");
}

fn write_nameservers(out: &mut String, primary_ns: &str, secondary_ns: Option<&str>) {
    let _ = writeln!(out, "\tIN\tNS\t{}", fqdn(primary_ns));
    if let Some(secondary) = secondary_ns {
        let _ = writeln!(out, "\tIN\tNS\t{}", fqdn(secondary));
    }
}

fn srv_label(record: &Record, part: Option<&String>, column: usize) -> Result<String, ZoneError> {
    part.map(|p| p.trim_start_matches('_').to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ZoneError::BadValue {
            query: "HeaderRecords",
            column,
            reason: format!("SRV record {} has no service or protocol", record.id),
        })
}

fn write_header_record(
    out: &mut String,
    zone: &str,
    record: &Record,
    services: &ServiceTable,
) -> Result<(), ZoneError> {
    let priority = record.priority.unwrap_or(0);
    match record.rtype {
        RecordType::NS => {
            let _ = writeln!(
                out,
                "{}\tIN\tNS\t{}",
                owner(&record.host),
                target(&record.destination)
            );
        }
        RecordType::MX => {
            let _ = writeln!(
                out,
                "{}\tIN\tMX\t{priority}\t{}",
                owner(&record.host),
                target(&record.destination)
            );
        }
        RecordType::SRV => {
            let service = srv_label(record, record.service.as_ref(), 6)?;
            let protocol = srv_label(record, record.protocol.as_ref(), 7)?;
            let port = services.port(&service, &protocol)?;
            // SRV owners are always `_service._proto.zone.`; the host column is unused.
            let _ = writeln!(
                out,
                "_{service}._{protocol}.{zone}.\tIN\tSRV\t{priority}\t{SRV_DEFAULT_WEIGHT}\t{port}\t{}",
                target(&record.destination)
            );
        }
        _ => write_plain_record(out, record),
    }
    Ok(())
}

fn write_plain_record(out: &mut String, record: &Record) {
    let rdata = match record.rtype {
        RecordType::TXT if !record.destination.starts_with('"') => {
            format!("\"{}\"", record.destination.replace('"', "\\\""))
        }
        RecordType::CNAME | RecordType::NS | RecordType::PTR => target(&record.destination),
        RecordType::MX => format!(
            "{}\t{}",
            record.priority.unwrap_or(0),
            target(&record.destination)
        ),
        _ => record.destination.clone(),
    };
    let _ = writeln!(
        out,
        "{}\tIN\t{}\t{rdata}",
        owner(&record.host),
        record.rtype
    );
}

/// True when `ns` lives inside `zone`, so resolvers need an address for it.
fn in_zone(ns: &str, zone: &str) -> bool {
    let ns = ns.trim_end_matches('.').to_ascii_lowercase();
    let zone = zone.trim_end_matches('.').to_ascii_lowercase();
    ns.ends_with(&format!(".{zone}"))
}

fn write_glue(out: &mut String, zone: &str, glue: &GlueRecord) {
    let child = target(&glue.child);
    let servers = [
        (Some(&glue.primary_ns), glue.primary_ip),
        (glue.secondary_ns.as_ref(), glue.secondary_ip),
    ];
    for (ns, ip) in servers {
        let Some(ns) = ns else { continue };
        let _ = writeln!(out, "{child}\tIN\tNS\t{}", fqdn(ns));
        if let Some(ip) = ip.filter(|_| in_zone(ns, zone)) {
            let _ = writeln!(out, "{}\tIN\tA\t{ip}", fqdn(ns));
        }
    }
}

/// Render a forward zone with the given serial.
///
/// Order: SOA, zone nameservers, NS/MX/SRV records grouped by type, plain
/// records, then glue for delegated children.
///
/// # Errors
///
/// Returns [`ZoneError::UnknownService`] when an SRV record's port cannot be
/// resolved, or [`ZoneError::BadValue`] when it lacks a service or protocol.
pub fn render_forward_zone(
    zone: &ForwardZone,
    serial: u64,
    records: ForwardZoneRecords<'_>,
    services: &ServiceTable,
) -> Result<String, ZoneError> {
    let mut out = String::new();
    write_soa(&mut out, &zone.primary_ns, &zone.hostmaster, serial, &zone.timers);
    write_nameservers(&mut out, &zone.primary_ns, zone.secondary_ns.as_deref());

    for rtype in [RecordType::NS, RecordType::MX, RecordType::SRV] {
        for record in records.header.iter().filter(|r| r.rtype == rtype) {
            write_header_record(&mut out, &zone.name, record, services)?;
        }
    }
    for record in records.plain {
        if record.is_header() {
            write_header_record(&mut out, &zone.name, record, services)?;
        } else {
            write_plain_record(&mut out, record);
        }
    }
    for glue in records.glue {
        write_glue(&mut out, &zone.name, glue);
    }
    Ok(out)
}

/// Render a reverse zone with the given serial. PTR lines keep list order.
#[must_use]
pub fn render_reverse_zone(zone: &ReverseZone, serial: u64, ptrs: &[ReverseRecord]) -> String {
    let mut out = String::new();
    write_soa(&mut out, &zone.primary_ns, &zone.hostmaster, serial, &zone.timers);
    write_nameservers(&mut out, &zone.primary_ns, zone.secondary_ns.as_deref());
    for ptr in ptrs {
        let _ = writeln!(out, "{}\tPTR\t{}", ptr.host, fqdn(&ptr.destination));
    }
    out
}

#[cfg(test)]
#[path = "zone_file_tests.rs"]
mod zone_file_tests;

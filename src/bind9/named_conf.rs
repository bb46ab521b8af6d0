// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! named.conf zone stanzas.
//!
//! Master zones are listed only once they have passed a zone check. Slave
//! zones are never built locally, so they are always listed.
//!
//! ```text
//! zone "example.com" {
//! 	type master;
//! 	file "/var/named/example.com";
//! 	notify-source 192.0.2.53;
//! };
//! ```

use std::fmt::Write as _;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, ToSocketAddrs};
use tracing::{debug, warn};

use crate::config::Settings;
use crate::model::{ForwardZone, ReverseZone, Validity, ZoneKind};

/// Address family of a nameserver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    V4,
    V6,
}

/// Family of `host`: taken from the literal if it is an address, otherwise
/// from the first address it resolves to.
#[must_use]
pub fn address_family(host: &str) -> Option<AddressFamily> {
    let host = host.trim_end_matches('.');
    let addr = match host.parse::<IpAddr>() {
        Ok(addr) => addr,
        Err(_) => match (host, 53).to_socket_addrs() {
            Ok(mut addrs) => addrs.next()?.ip(),
            Err(e) => {
                warn!(host, error = %e, "Cannot resolve secondary nameserver");
                return None;
            }
        },
    };
    Some(match addr {
        IpAddr::V4(_) => AddressFamily::V4,
        IpAddr::V6(_) => AddressFamily::V6,
    })
}

/// Configured `notify-source` addresses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifySources {
    pub v4: Option<Ipv4Addr>,
    pub v6: Option<Ipv6Addr>,
}

impl NotifySources {
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            v4: settings.notify_source_v4,
            v6: settings.notify_source_v6,
        }
    }

    /// The `notify-source` line for a zone whose secondary is `secondary_ns`.
    #[must_use]
    pub fn line_for(&self, secondary_ns: Option<&str>) -> Option<String> {
        if self.v4.is_none() && self.v6.is_none() {
            return None;
        }
        match address_family(secondary_ns?)? {
            AddressFamily::V4 => self.v4.map(|ip| format!("notify-source {ip};")),
            AddressFamily::V6 => self.v6.map(|ip| format!("notify-source-v6 {ip};")),
        }
    }
}

/// Inputs common to every stanza.
#[derive(Debug, Clone, Copy)]
pub struct StanzaContext<'a> {
    pub zone_dir: &'a str,
    pub slave_dir: &'a str,
    pub notify: NotifySources,
}

impl<'a> StanzaContext<'a> {
    #[must_use]
    pub fn from_settings(settings: &'a Settings) -> Self {
        Self {
            zone_dir: &settings.zone_dir,
            slave_dir: &settings.slave_dir,
            notify: NotifySources::from_settings(settings),
        }
    }
}

struct StanzaFields<'a> {
    name: &'a str,
    file_name: &'a str,
    kind: ZoneKind,
    validity: Validity,
    secondary_ns: Option<&'a str>,
    master: Option<&'a str>,
}

fn write_stanza(out: &mut String, ctx: &StanzaContext<'_>, zone: &StanzaFields<'_>) {
    match zone.kind {
        ZoneKind::Master => {
            if zone.validity != Validity::Valid {
                debug!(zone = zone.name, validity = %zone.validity, "Not listing unchecked zone");
                return;
            }
            let _ = writeln!(out, "zone \"{}\" {{", zone.name);
            out.push_str("\ttype master;\n");
            let _ = writeln!(out, "\tfile \"{}{}\";", ctx.zone_dir, zone.file_name);
            if let Some(line) = ctx.notify.line_for(zone.secondary_ns) {
                let _ = writeln!(out, "\t{line}");
            }
        }
        ZoneKind::Slave => {
            let Some(master) = zone.master else {
                warn!(zone = zone.name, "Slave zone has no master address, skipping");
                return;
            };
            let _ = writeln!(out, "zone \"{}\" {{", zone.name);
            out.push_str("\ttype slave;\n");
            let _ = writeln!(out, "\tmasters {{ {master}; }};");
            let _ = writeln!(out, "\tfile \"{}{}\";", ctx.slave_dir, zone.file_name);
        }
    }
    out.push_str("};\n\n");
}

/// named.conf fragment for forward zones.
#[must_use]
pub fn emit_forward_config(zones: &[ForwardZone], ctx: &StanzaContext<'_>) -> String {
    let mut out = String::new();
    for zone in zones {
        write_stanza(
            &mut out,
            ctx,
            &StanzaFields {
                name: &zone.name,
                file_name: &zone.name,
                kind: zone.kind,
                validity: zone.validity,
                secondary_ns: zone.secondary_ns.as_deref(),
                master: zone.master.as_deref(),
            },
        );
    }
    out
}

/// named.conf fragment for reverse zones. Zones with an unusable range are
/// skipped with a warning.
#[must_use]
pub fn emit_reverse_config(zones: &[ReverseZone], ctx: &StanzaContext<'_>) -> String {
    let mut out = String::new();
    for zone in zones {
        let name = match zone.arpa_name() {
            Ok(name) => name,
            Err(e) => {
                warn!(range = %zone.net_range, prefix = zone.prefix, error = %e, "Skipping reverse zone");
                continue;
            }
        };
        write_stanza(
            &mut out,
            ctx,
            &StanzaFields {
                name: &name,
                file_name: &zone.net_range,
                kind: zone.kind,
                validity: zone.validity,
                secondary_ns: zone.secondary_ns.as_deref(),
                master: zone.master.as_deref(),
            },
        );
    }
    out
}

#[cfg(test)]
#[path = "named_conf_tests.rs"]
mod named_conf_tests;

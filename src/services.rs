// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Service name to port lookup for SRV records.
//!
//! SRV records are stored as `service`/`protocol` pairs and rendered with the
//! numeric port. Ports come from an `/etc/services` style file; when that file
//! is missing a small built-in table of common services is used instead.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::dns_errors::ZoneError;

/// Services known without a services file.
const BUILTIN_SERVICES: &[(&str, &str, u16)] = &[
    ("ftp", "tcp", 21),
    ("ssh", "tcp", 22),
    ("telnet", "tcp", 23),
    ("smtp", "tcp", 25),
    ("domain", "tcp", 53),
    ("domain", "udp", 53),
    ("http", "tcp", 80),
    ("kerberos", "tcp", 88),
    ("kerberos", "udp", 88),
    ("pop3", "tcp", 110),
    ("ntp", "udp", 123),
    ("imap", "tcp", 143),
    ("ldap", "tcp", 389),
    ("ldap", "udp", 389),
    ("https", "tcp", 443),
    ("kpasswd", "tcp", 464),
    ("kpasswd", "udp", 464),
    ("submission", "tcp", 587),
    ("ldaps", "tcp", 636),
    ("imaps", "tcp", 993),
    ("pop3s", "tcp", 995),
    ("xmpp-client", "tcp", 5222),
    ("xmpp-server", "tcp", 5269),
    ("sip", "tcp", 5060),
    ("sip", "udp", 5060),
    ("sips", "tcp", 5061),
];

/// Lookup table keyed by `(service, protocol)`, both lowercase.
#[derive(Debug, Clone, Default)]
pub struct ServiceTable {
    ports: HashMap<(String, String), u16>,
}

impl ServiceTable {
    /// Table of common services.
    #[must_use]
    pub fn builtin() -> Self {
        let mut table = Self::default();
        for (service, protocol, port) in BUILTIN_SERVICES {
            table.insert(service, protocol, *port);
        }
        table
    }

    /// Parse `/etc/services` syntax: `name port/protocol [aliases...] [# comment]`.
    ///
    /// Lines that do not parse are skipped. The first entry for a pair wins.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut table = Self::default();
        for line in text.lines() {
            let line = line.split('#').next().unwrap_or_default();
            let mut fields = line.split_whitespace();
            let (Some(name), Some(port_proto)) = (fields.next(), fields.next()) else {
                continue;
            };
            let Some((port, protocol)) = port_proto.split_once('/') else {
                continue;
            };
            let Ok(port) = port.parse::<u16>() else {
                continue;
            };
            table.insert(name, protocol, port);
            for alias in fields {
                table.insert(alias, protocol, port);
            }
        }
        table
    }

    /// Load a services file, falling back to [`ServiceTable::builtin`] if it
    /// cannot be read.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => {
                let table = Self::parse(&text);
                debug!(path = %path.display(), entries = table.len(), "Loaded services file");
                table
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Cannot read services file, using built-in service table"
                );
                Self::builtin()
            }
        }
    }

    fn insert(&mut self, service: &str, protocol: &str, port: u16) {
        self.ports
            .entry((service.to_ascii_lowercase(), protocol.to_ascii_lowercase()))
            .or_insert(port);
    }

    /// Number of `(service, protocol)` pairs known.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Port for a service; leading underscores are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::UnknownService`] if the pair is not in the table.
    pub fn port(&self, service: &str, protocol: &str) -> Result<u16, ZoneError> {
        let service = service.trim_start_matches('_').to_ascii_lowercase();
        let protocol = protocol.trim_start_matches('_').to_ascii_lowercase();
        self.ports
            .get(&(service.clone(), protocol.clone()))
            .copied()
            .ok_or(ZoneError::UnknownService { service, protocol })
    }
}

#[cfg(test)]
#[path = "services_tests.rs"]
mod services_tests;

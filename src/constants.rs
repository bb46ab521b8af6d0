// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for dnsa.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Configuration File Constants
// ============================================================================

/// Default location of the YAML configuration file
pub const DEFAULT_CONFIG_PATH: &str = "/etc/dnsa/dnsa.yaml";

/// Environment variable naming an alternative configuration file
pub const CONFIG_PATH_ENV: &str = "DNSA_CONFIG";

/// Default SQLite database backing the record store
pub const DEFAULT_DATABASE_PATH: &str = "/var/lib/cmdb/cmdb.sqlite";

/// Default directory holding master zone files
pub const DEFAULT_ZONE_DIR: &str = "/var/named/";

/// Default directory holding slave zone files
pub const DEFAULT_SLAVE_DIR: &str = "/var/named/slaves/";

/// Default named.conf fragment listing forward zones
pub const DEFAULT_FORWARD_CONFIG: &str = "/etc/bind/named.conf.dnsa.zones";

/// Default named.conf fragment listing reverse zones
pub const DEFAULT_REVERSE_CONFIG: &str = "/etc/bind/named.conf.dnsa.rev";

/// Default services database used to resolve SRV ports
pub const DEFAULT_SERVICES_FILE: &str = "/etc/services";

// ============================================================================
// External Command Constants
// ============================================================================

/// Default zone checker binary
pub const DEFAULT_CHECKZONE_PATH: &str = "/usr/sbin/named-checkzone";

/// Default configuration checker binary
pub const DEFAULT_CHECKCONF_PATH: &str = "/usr/sbin/named-checkconf";

/// Default rndc binary
pub const DEFAULT_RNDC_PATH: &str = "/usr/sbin/rndc";

/// Argument passed to rndc to reload every zone
pub const RNDC_RELOAD_COMMAND: &str = "reload";

// ============================================================================
// DNS Protocol Constants
// ============================================================================

/// Default SOA hostmaster mailbox
pub const DEFAULT_HOSTMASTER: &str = "hostmaster.localhost";

/// Default primary nameserver for new zones
pub const DEFAULT_PRIMARY_NS: &str = "ns1.localhost";

/// Default TTL for zone files (1 day)
pub const DEFAULT_ZONE_TTL_SECS: u32 = 86_400;

/// Default SOA refresh interval (7 days)
pub const DEFAULT_SOA_REFRESH_SECS: u32 = 604_800;

/// Default SOA retry interval (1 day)
pub const DEFAULT_SOA_RETRY_SECS: u32 = 86_400;

/// Default SOA expire time (28 days)
pub const DEFAULT_SOA_EXPIRE_SECS: u32 = 2_419_200;

/// Suffix of the IPv4 reverse-lookup namespace
pub const IN_ADDR_ARPA_SUFFIX: &str = "in-addr.arpa";

/// Marker for the zone apex in a record's host field
pub const ZONE_APEX: &str = "@";

/// Placeholder stored when a zone has no secondary nameserver
pub const NO_SECONDARY_NS: &str = "none";

/// SRV weight written for every service record
pub const SRV_DEFAULT_WEIGHT: u16 = 0;

// ============================================================================
// Serial Number Constants
// ============================================================================

/// Multiplier placing the date ahead of the two-digit daily revision
pub const SERIAL_DATE_MULTIPLIER: u64 = 100;

/// First revision number issued on a given day
pub const SERIAL_FIRST_REVISION: u64 = 1;

// ============================================================================
// File Constants
// ============================================================================

/// Mode of written zone and config files (`rw-rw-r--`)
pub const ZONE_FILE_MODE: u32 = 0o664;

/// Prefix for staged files in the zone directory
pub const STAGING_FILE_PREFIX: &str = ".dnsa-";

// ============================================================================
// Metrics Constants
// ============================================================================

/// Namespace prefix for all dnsa metrics
pub const METRICS_NAMESPACE: &str = "cmdb_dnsa";

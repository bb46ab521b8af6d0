// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # dnsa - BIND9 zone builder for the CMDB suite
//!
//! dnsa turns the DNS records kept in a relational store into BIND9 zone
//! files, checks them with the BIND utilities, installs the ones that pass,
//! and keeps reverse (`in-addr.arpa`) zones in step with the A records of the
//! forward zones.
//!
//! ## Overview
//!
//! - Forward zones are rendered from their NS, MX, SRV and plain records plus
//!   glue for delegated children
//! - Reverse zones hold PTR records derived from forward A records; a
//!   reconciliation pass adds the missing ones and removes the stale ones
//! - Every file is staged, checked, and renamed into place only if it is valid
//! - Serials follow the `YYYYMMDDnn` convention and only move when the zone
//!   body changed
//!
//! ## Modules
//!
//! - [`net_range`] - CIDR arithmetic and `in-addr.arpa` naming, RFC 2317 included
//! - [`serial`] - Serial numbers and change detection
//! - [`store`] - Record store interface, typed query catalog and SQLite backend
//! - [`bind9`] - Zone file rendering, named.conf emission, checker and rndc
//! - [`reconcilers`] - Zone builds and reverse-zone reconciliation
//! - [`context`] - The [`BuildContext`](context::BuildContext) threaded through every operation
//! - [`config`] - YAML settings
//!
//! ## Example
//!
//! ```rust,no_run
//! use dnsa::net_range::NetRange;
//!
//! let range = NetRange::new("192.168.1.0", 26).unwrap();
//! assert_eq!(range.arpa_name(), "0/26.1.168.192.in-addr.arpa");
//! ```

pub mod bind9;
pub mod config;
pub mod constants;
pub mod context;
pub mod dns_errors;
pub mod metrics;
pub mod model;
pub mod net_range;
pub mod reconcilers;
pub mod serial;
pub mod services;
pub mod store;

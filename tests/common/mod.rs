// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common test utilities for integration tests

#![allow(dead_code)]

use chrono::NaiveDate;
use dnsa::config::Settings;
use dnsa::context::BuildContext;
use dnsa::model::{SoaTimers, ZoneKind};
use dnsa::net_range::NetRange;
use dnsa::store::catalog::{self, NewForwardZone, NewRecord, NewReverseZone};
use dnsa::store::sqlite::SqliteStore;
use hickory_proto::rr::RecordType;
use std::path::PathBuf;
use tempfile::TempDir;

pub const TIMERS: SoaTimers = SoaTimers {
    refresh: 604_800,
    retry: 86_400,
    expire: 2_419_200,
    ttl: 86_400,
};

/// A scratch installation: database file, zone directories and config paths.
///
/// The BIND utilities are replaced by `true`/`false` so the tests exercise the
/// real subprocess plumbing without needing BIND installed.
pub struct Install {
    pub dir: TempDir,
    pub settings: Settings,
}

impl Install {
    /// Checker and reload commands that always succeed.
    pub fn new() -> Self {
        Self::with_tools("true", "true", "true")
    }

    pub fn with_tools(checkzone: &str, checkconf: &str, rndc: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let zones = dir.path().join("zones");
        let slaves = dir.path().join("slaves");
        std::fs::create_dir_all(&zones).expect("zone dir");
        std::fs::create_dir_all(&slaves).expect("slave dir");

        let settings = Settings {
            database: dir.path().join("dnsa.db"),
            zone_dir: zones.display().to_string(),
            slave_dir: slaves.display().to_string(),
            forward_config: dir.path().join("named.conf.zones"),
            reverse_config: dir.path().join("named.conf.rev"),
            checkzone: PathBuf::from(checkzone),
            checkconf: PathBuf::from(checkconf),
            rndc: PathBuf::from(rndc),
            services_file: dir.path().join("no-such-services"),
            ..Settings::default()
        }
        .normalized();

        let store = SqliteStore::open(&settings.database).expect("open database");
        store.init_schema().expect("schema");

        Self { dir, settings }
    }

    /// A fresh context over the installation, with the date pinned.
    pub fn context(&self) -> BuildContext {
        BuildContext::from_settings(self.settings.clone())
            .expect("context")
            .with_today(NaiveDate::from_ymd_opt(2024, 1, 2).expect("date"))
    }

    pub fn read(&self, file: &str) -> Option<String> {
        std::fs::read_to_string(self.settings.zone_path(file)).ok()
    }
}

pub fn add_zone(ctx: &BuildContext, name: &str) -> i64 {
    catalog::insert_forward_zone(
        ctx.store(),
        &NewForwardZone {
            name,
            primary_ns: "ns1.example.com",
            secondary_ns: None,
            hostmaster: "hostmaster.example.com",
            timers: TIMERS,
            kind: ZoneKind::Master,
            master: None,
        },
    )
    .expect("insert zone");
    catalog::forward_zone(ctx.store(), name).expect("zone").id
}

pub fn add_a(ctx: &BuildContext, zone_id: i64, host: &str, ip: &str) -> i64 {
    catalog::insert_record(
        ctx.store(),
        &NewRecord {
            zone_id,
            host,
            rtype: RecordType::A,
            destination: ip,
            priority: None,
            service: None,
            protocol: None,
        },
    )
    .expect("insert record");
    *catalog::record_ids(ctx.store(), zone_id, host, RecordType::A)
        .expect("ids")
        .last()
        .expect("id")
}

pub fn add_reverse(ctx: &BuildContext, net: &str, prefix: u8) {
    catalog::insert_reverse_zone(
        ctx.store(),
        &NewReverseZone {
            range: NetRange::new(net, prefix).expect("range"),
            primary_ns: "ns1.example.com",
            secondary_ns: None,
            hostmaster: "hostmaster.example.com",
            timers: TIMERS,
            kind: ZoneKind::Master,
            master: None,
        },
    )
    .expect("insert reverse zone");
}

/// PTR lines of a zone file, in file order.
pub fn ptr_lines(zone_text: &str) -> Vec<&str> {
    zone_text.lines().filter(|l| l.contains("\tPTR\t")).collect()
}

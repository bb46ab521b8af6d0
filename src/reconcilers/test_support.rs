// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared fixtures for reconciler tests.

use chrono::NaiveDate;
use hickory_proto::rr::RecordType;
use std::cell::{Cell, RefCell};
use std::fs;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

use crate::bind9::{CheckVerdict, Reloader, ZoneChecker};
use crate::config::Settings;
use crate::context::BuildContext;
use crate::dns_errors::{ProcessError, StoreError};
use crate::model::{SoaTimers, ZoneKind};
use crate::net_range::NetRange;
use crate::store::catalog::{self, NewForwardZone, NewRecord, NewReverseZone};
use crate::store::sqlite::SqliteStore;
use crate::store::{Mutation, Query, RecordStore, Value};

pub const TIMERS: SoaTimers = SoaTimers {
    refresh: 604_800,
    retry: 86_400,
    expire: 2_419_200,
    ttl: 86_400,
};

/// Knobs and call log shared between a test and its fake checker.
#[derive(Debug, Default)]
pub struct CheckerState {
    pub reject_zones: Cell<bool>,
    pub unavailable: Cell<bool>,
    pub reject_config: Cell<bool>,
    pub zone_checks: RefCell<Vec<(String, PathBuf)>>,
    pub config_checks: Cell<usize>,
}

pub struct FakeChecker(pub Rc<CheckerState>);

impl ZoneChecker for FakeChecker {
    fn check_zone(&self, zone: &str, file: &Path) -> Result<CheckVerdict, ProcessError> {
        self.0
            .zone_checks
            .borrow_mut()
            .push((zone.to_string(), file.to_path_buf()));
        if self.0.unavailable.get() {
            return Err(ProcessError::CheckerUnavailable {
                program: "named-checkzone".into(),
                reason: "not installed".into(),
            });
        }
        Ok(CheckVerdict {
            valid: !self.0.reject_zones.get(),
            output: String::new(),
        })
    }

    fn check_config(&self, file: &Path) -> Result<(), ProcessError> {
        self.0.config_checks.set(self.0.config_checks.get() + 1);
        if self.0.reject_config.get() {
            return Err(ProcessError::ConfigRejected {
                path: file.display().to_string(),
                output: "syntax error".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ReloaderState {
    pub fail: Cell<bool>,
    pub reloads: Cell<usize>,
}

pub struct FakeReloader(pub Rc<ReloaderState>);

impl Reloader for FakeReloader {
    fn reload(&self) -> Result<(), ProcessError> {
        self.0.reloads.set(self.0.reloads.get() + 1);
        if self.0.fail.get() {
            return Err(ProcessError::ReloadFailed {
                program: "rndc".into(),
                reason: "exited with 1".into(),
            });
        }
        Ok(())
    }
}

/// Wraps a store, drops the last value of every result for one query and
/// counts writes.
pub struct TruncatingStore {
    inner: Box<dyn RecordStore>,
    query: Query,
    writes: Rc<Cell<usize>>,
}

impl RecordStore for TruncatingStore {
    fn query(&self, query: Query, args: &[Value]) -> Result<Vec<Value>, StoreError> {
        let mut values = self.inner.query(query, args)?;
        if query == self.query {
            values.pop();
        }
        Ok(values)
    }

    fn execute(&self, mutation: Mutation, args: &[Value]) -> Result<usize, StoreError> {
        self.writes.set(self.writes.get() + 1);
        self.inner.execute(mutation, args)
    }
}

/// Wraps a store and fails the next execution of one mutation.
pub struct FailOnceStore {
    inner: Box<dyn RecordStore>,
    mutation: Mutation,
    armed: Cell<bool>,
}

impl RecordStore for FailOnceStore {
    fn query(&self, query: Query, args: &[Value]) -> Result<Vec<Value>, StoreError> {
        self.inner.query(query, args)
    }

    fn execute(&self, mutation: Mutation, args: &[Value]) -> Result<usize, StoreError> {
        if mutation == self.mutation && self.armed.replace(false) {
            return Err(StoreError::WrongRowCount {
                query: mutation.name(),
                got: 0,
                expect: 1,
            });
        }
        self.inner.execute(mutation, args)
    }
}

struct EmptyStore;

impl RecordStore for EmptyStore {
    fn query(&self, _query: Query, _args: &[Value]) -> Result<Vec<Value>, StoreError> {
        Ok(Vec::new())
    }

    fn execute(&self, _mutation: Mutation, _args: &[Value]) -> Result<usize, StoreError> {
        Ok(0)
    }
}

/// A build context over an in-memory store and a scratch directory.
pub struct Harness {
    pub ctx: BuildContext,
    pub checker: Rc<CheckerState>,
    pub reloader: Rc<ReloaderState>,
    _dir: TempDir,
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

impl Harness {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let zones = dir.path().join("zones");
        let slaves = dir.path().join("slaves");
        fs::create_dir_all(&zones).unwrap();
        fs::create_dir_all(&slaves).unwrap();

        let settings = Settings {
            zone_dir: zones.display().to_string(),
            slave_dir: slaves.display().to_string(),
            forward_config: dir.path().join("named.conf.zones"),
            reverse_config: dir.path().join("named.conf.rev"),
            ..Settings::default()
        }
        .normalized();

        let store = SqliteStore::open_in_memory().unwrap();
        store.init_schema().unwrap();

        let checker = Rc::new(CheckerState::default());
        let reloader = Rc::new(ReloaderState::default());
        let ctx = BuildContext::new(
            Box::new(store),
            settings,
            Box::new(FakeChecker(Rc::clone(&checker))),
            Box::new(FakeReloader(Rc::clone(&reloader))),
        )
        .with_today(day(2024, 1, 2));

        Self {
            ctx,
            checker,
            reloader,
            _dir: dir,
        }
    }

    /// Route the store through a [`TruncatingStore`]; returns its write count.
    pub fn truncate(&mut self, query: Query) -> Rc<Cell<usize>> {
        let writes = Rc::new(Cell::new(0));
        let inner = std::mem::replace(&mut self.ctx.store, Box::new(EmptyStore));
        self.ctx.store = Box::new(TruncatingStore {
            inner,
            query,
            writes: Rc::clone(&writes),
        });
        writes
    }

    /// Route the store through a [`FailOnceStore`] for `mutation`.
    pub fn fail_once(&mut self, mutation: Mutation) {
        let inner = std::mem::replace(&mut self.ctx.store, Box::new(EmptyStore));
        self.ctx.store = Box::new(FailOnceStore {
            inner,
            mutation,
            armed: Cell::new(true),
        });
    }

    pub fn add_zone(&self, name: &str) -> i64 {
        catalog::insert_forward_zone(
            self.ctx.store(),
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
        .unwrap();
        catalog::forward_zone(self.ctx.store(), name).unwrap().id
    }

    pub fn add_slave_zone(&self, name: &str, master: &str) -> i64 {
        catalog::insert_forward_zone(
            self.ctx.store(),
            &NewForwardZone {
                name,
                primary_ns: "ns1.example.com",
                secondary_ns: None,
                hostmaster: "hostmaster.example.com",
                timers: TIMERS,
                kind: ZoneKind::Slave,
                master: Some(master),
            },
        )
        .unwrap();
        catalog::forward_zone(self.ctx.store(), name).unwrap().id
    }

    pub fn add_record(&self, zone_id: i64, host: &str, rtype: RecordType, dest: &str) -> i64 {
        catalog::insert_record(
            self.ctx.store(),
            &NewRecord {
                zone_id,
                host,
                rtype,
                destination: dest,
                priority: None,
                service: None,
                protocol: None,
            },
        )
        .unwrap();
        *catalog::record_ids(self.ctx.store(), zone_id, host, rtype)
            .unwrap()
            .last()
            .unwrap()
    }

    pub fn add_a(&self, zone_id: i64, host: &str, ip: &str) -> i64 {
        self.add_record(zone_id, host, RecordType::A, ip)
    }

    pub fn add_reverse(&self, net: &str, prefix: u8) -> i64 {
        catalog::insert_reverse_zone(
            self.ctx.store(),
            &NewReverseZone {
                range: NetRange::new(net, prefix).unwrap(),
                primary_ns: "ns1.example.com",
                secondary_ns: None,
                hostmaster: "hostmaster.example.com",
                timers: TIMERS,
                kind: ZoneKind::Master,
                master: None,
            },
        )
        .unwrap();
        catalog::reverse_zone(self.ctx.store(), net).unwrap().id
    }

    pub fn prefer(&self, ip: &str, record_id: i64, fqdn: &str) {
        let ip: Ipv4Addr = ip.parse().unwrap();
        catalog::insert_preferred(self.ctx.store(), ip, record_id, fqdn).unwrap();
    }

    pub fn zone_file(&self, name: &str) -> Option<String> {
        fs::read_to_string(self.ctx.settings.zone_path(name)).ok()
    }

    pub fn ptrs(&self, net: &str) -> Vec<(String, String)> {
        let zone = catalog::reverse_zone(self.ctx.store(), net).unwrap();
        let range = zone.range().unwrap();
        catalog::reverse_records(self.ctx.store(), zone.id, range.block_index())
            .unwrap()
            .into_iter()
            .map(|r| (r.host, r.destination))
            .collect()
    }
}

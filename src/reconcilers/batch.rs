// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Operations over every zone in the store.
//!
//! Zones are processed one at a time in store order. A failing zone is logged
//! and counted, and the batch moves on; the first failure is kept so the
//! caller can report it once the batch is done.

use tracing::{error, info, warn};

use super::{forward, publish, reverse, BuildOutcome};
use crate::context::BuildContext;
use crate::dns_errors::{DnsaError, Result};
use crate::model::ZoneKind;
use crate::store::catalog;

/// Tally of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub built: usize,
    pub unchanged: usize,
    pub invalid: usize,
    pub failed: usize,
    /// First error seen, if any
    pub first_error: Option<DnsaError>,
}

impl BatchReport {
    fn count(&mut self, zone: &str, result: Result<BuildOutcome>) {
        match result {
            Ok(BuildOutcome::Built { .. }) => self.built += 1,
            Ok(BuildOutcome::Unchanged { .. }) => self.unchanged += 1,
            Ok(BuildOutcome::Invalid) => self.invalid += 1,
            Err(e) => self.fail(zone, e),
        }
    }

    fn fail(&mut self, zone: &str, e: DnsaError) {
        if e.is_recoverable() {
            warn!(zone, reason = e.status_reason(), error = %e, "Zone build skipped");
        } else {
            error!(zone, reason = e.status_reason(), error = %e, "Zone build failed");
        }
        self.failed += 1;
        self.first_error.get_or_insert(e);
    }

    /// Convert into the first error, if any.
    ///
    /// # Errors
    ///
    /// Returns the first error recorded during the batch.
    pub fn into_result(self) -> Result<Self> {
        match self.first_error {
            Some(e) => Err(e),
            None => Ok(self),
        }
    }
}

fn finish(ctx: &BuildContext, report: &mut BatchReport, write: fn(&BuildContext) -> Result<()>) {
    if report.built == 0 {
        return;
    }
    match write(ctx) {
        Ok(()) => {
            publish::reload(ctx);
        }
        Err(e) => report.fail("named.conf", e),
    }
}

fn build_forward_masters(ctx: &BuildContext, report: &mut BatchReport) {
    let zones = match catalog::forward_zones(ctx.store()) {
        Ok(zones) => zones,
        Err(e) => return report.fail("*", e),
    };
    for zone in zones.iter().filter(|z| z.kind == ZoneKind::Master) {
        report.count(&zone.name, forward::build_forward_zone(ctx, &zone.name));
    }
}

fn build_reverse_masters(ctx: &BuildContext, report: &mut BatchReport, reconcile: bool) {
    let zones = match catalog::reverse_zones(ctx.store()) {
        Ok(zones) => zones,
        Err(e) => return report.fail("*", e),
    };
    for zone in zones.iter().filter(|z| z.kind == ZoneKind::Master) {
        let result = if reconcile {
            reverse::reconcile_reverse_zone(ctx, &zone.net_range).map(|o| o.build)
        } else {
            reverse::build_reverse_zone(ctx, &zone.net_range)
        };
        report.count(&zone.net_range, result);
    }
}

fn log_report(side: &str, report: &BatchReport) {
    info!(
        side,
        built = report.built,
        unchanged = report.unchanged,
        invalid = report.invalid,
        failed = report.failed,
        "Zones processed"
    );
}

/// Build every master forward zone, then rewrite the forward zone list and
/// reload if any zone was installed.
pub fn validate_all(ctx: &BuildContext) -> BatchReport {
    let mut report = BatchReport::default();
    build_forward_masters(ctx, &mut report);
    finish(ctx, &mut report, publish::write_forward_config);
    log_report("forward", &report);
    report
}

/// Build every master reverse zone file without reconciling PTR records.
pub fn validate_all_reverse(ctx: &BuildContext) -> BatchReport {
    let mut report = BatchReport::default();
    build_reverse_masters(ctx, &mut report, false);
    finish(ctx, &mut report, publish::write_reverse_config);
    log_report("reverse", &report);
    report
}

/// Build every master forward and reverse zone, then rewrite both zone lists
/// and reload once if anything was installed.
///
/// Reverse zones are not reconciled. A config error is reported on the
/// forward tally.
pub fn validate_every_zone(ctx: &BuildContext) -> (BatchReport, BatchReport) {
    let mut forward = BatchReport::default();
    let mut reverse = BatchReport::default();
    build_forward_masters(ctx, &mut forward);
    build_reverse_masters(ctx, &mut reverse, false);
    if forward.built + reverse.built > 0 {
        if let Err(e) = publish::commit(ctx) {
            forward.fail("named.conf", e);
        }
    }
    log_report("forward", &forward);
    log_report("reverse", &reverse);
    (forward, reverse)
}

/// Reconcile every master reverse zone, then rewrite the reverse zone list and
/// reload if any zone file was reinstalled.
pub fn build_all_reverse(ctx: &BuildContext) -> BatchReport {
    let mut report = BatchReport::default();
    build_reverse_masters(ctx, &mut report, true);
    finish(ctx, &mut report, publish::write_reverse_config);
    log_report("reverse", &report);
    report
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod batch_tests;

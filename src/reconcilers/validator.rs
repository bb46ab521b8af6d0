// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone validation and installation.
//!
//! A zone is rendered, staged next to its live file, checked, and only then
//! moved into place. The checker verdict is written back to the store on every
//! path, including when the checker could not be run at all, so the stored
//! validity is never stale.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::BuildOutcome;
use crate::bind9::writer;
use crate::context::BuildContext;
use crate::dns_errors::Result;
use crate::metrics::{self, ZoneSide};
use crate::model::Validity;
use crate::serial::{next_serial, ChangeCheck};
use crate::store::catalog;

/// Identifies one zone for checking and bookkeeping.
#[derive(Debug, Clone)]
pub struct ZoneTarget {
    pub side: ZoneSide,
    /// Store id of the zone row
    pub id: i64,
    /// Name passed to the zone checker (the origin)
    pub name: String,
    /// Live zone file
    pub path: PathBuf,
}

/// Store state the change check starts from.
#[derive(Debug, Clone, Copy)]
pub struct StoredState {
    pub serial: u64,
    pub validity: Validity,
    pub updated: bool,
}

fn store_validity(ctx: &BuildContext, target: &ZoneTarget, validity: Validity) -> Result<()> {
    match target.side {
        ZoneSide::Forward => catalog::set_forward_validity(ctx.store(), target.id, validity),
        ZoneSide::Reverse => catalog::set_reverse_validity(ctx.store(), target.id, validity),
    }
}

fn commit_serial(ctx: &BuildContext, target: &ZoneTarget, serial: u64) -> Result<()> {
    match target.side {
        ZoneSide::Forward => catalog::commit_forward_serial(ctx.store(), target.id, serial),
        ZoneSide::Reverse => catalog::commit_reverse_serial(ctx.store(), target.id, serial),
    }
}

/// Check `file` as `target` and record the verdict in the store.
///
/// # Errors
///
/// Returns the store error if the verdict cannot be recorded, or
/// `CheckerUnavailable` (after recording `Invalid`) when the checker cannot
/// be run.
pub fn validate_zone(ctx: &BuildContext, target: &ZoneTarget, file: &Path) -> Result<Validity> {
    match ctx.checker.check_zone(&target.name, file) {
        Ok(verdict) => {
            let validity = Validity::from_check(verdict.valid);
            if verdict.valid {
                metrics::record_checker_verdict("valid");
                debug!(zone = %target.name, "Zone check passed");
            } else {
                metrics::record_checker_verdict("invalid");
                warn!(zone = %target.name, output = %verdict.output, "Zone check failed");
            }
            store_validity(ctx, target, validity)?;
            Ok(validity)
        }
        Err(e) => {
            metrics::record_checker_verdict("unavailable");
            warn!(zone = %target.name, error = %e, "Zone checker unavailable, marking zone invalid");
            store_validity(ctx, target, Validity::Invalid)?;
            Err(e.into())
        }
    }
}

/// Rebuild a zone if it changed, install it if it checks out.
///
/// `render` produces the zone text for a given serial. It is called once with
/// the stored serial for the change check, and again with the new serial.
///
/// # Errors
///
/// Returns render, file, store or checker errors. No live file is touched on
/// any error path. The new serial is stored before the file is renamed into
/// place, so the stored serial is never behind the live one.
pub fn install_zone(
    ctx: &BuildContext,
    target: &ZoneTarget,
    stored: StoredState,
    render: impl Fn(u64) -> Result<String>,
) -> Result<BuildOutcome> {
    let current = render(stored.serial)?;
    let live = writer::read_live(&target.path);
    let check = ChangeCheck {
        validity: stored.validity,
        updated: stored.updated,
        rendered: &current,
        existing: live.as_deref(),
    };
    if !check.changed() {
        debug!(zone = %target.name, serial = stored.serial, "Zone unchanged");
        return Ok(BuildOutcome::Unchanged {
            serial: stored.serial,
        });
    }

    let serial = next_serial(stored.serial, ctx.today);
    let text = render(serial)?;
    let staged = writer::stage(&target.path, &text)?;

    match validate_zone(ctx, target, staged.path())? {
        Validity::Valid => {
            // Serial first: a failed rename skips a number, never reuses one.
            commit_serial(ctx, target, serial)?;
            staged.commit()?;
            info!(zone = %target.name, serial, path = %target.path.display(), "Zone installed");
            Ok(BuildOutcome::Built { serial })
        }
        _ => {
            warn!(zone = %target.name, path = %target.path.display(), "Rejected zone not installed");
            Ok(BuildOutcome::Invalid)
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod validator_tests;

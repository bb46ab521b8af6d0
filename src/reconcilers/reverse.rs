// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reverse-zone reconciliation.
//!
//! The PTR records of a reverse zone are derived data: they should mirror the
//! A records of every forward zone whose addresses fall inside the reverse
//! zone's range. Reconciliation computes the difference between the two sets
//! and applies it as a batch of removals followed by insertions.
//!
//! # Algorithm
//!
//! 1. Load the existing PTR records of the zone's block(s)
//! 2. Load every A record whose address lies in the range, across all zones
//! 3. Trim: where an address has a preferred-A entry, keep only the
//!    preferred record
//! 4. Desired set: one `(host label, fqdn)` pair per surviving A record
//! 5. Removals: existing PTRs whose pair is not desired (or duplicated)
//! 6. Additions: desired pairs with no existing PTR
//!
//! Steps 1-6 are pure once the data is loaded ([`compute_plan`]). Every read
//! happens before any write, so a malformed record set aborts the whole
//! reconciliation with nothing applied.
//!
//! Matching is exact on the pair; there is no fuzzy matching.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::net::Ipv4Addr;
use std::time::Instant;
use tracing::{debug, info};

use super::validator::{install_zone, StoredState, ZoneTarget};
use super::{publish, record_build, BuildOutcome};
use crate::bind9::render_reverse_zone;
use crate::context::BuildContext;
use crate::dns_errors::{Result, ZoneError};
use crate::metrics::{self, ZoneSide};
use crate::model::{fqdn, record_fqdn, PreferredA, ReverseRecord, ReverseZone, ZoneKind};
use crate::net_range::NetRange;
use crate::store::catalog::{self, ForwardCandidate};

/// A PTR record to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PtrAddition {
    /// Address the record maps
    pub ip: Ipv4Addr,
    pub block: u32,
    /// Owner label relative to the zone origin
    pub host: String,
    /// Target FQDN with trailing dot
    pub destination: String,
}

/// Changes needed to bring a reverse zone in line with the forward zones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReversePlan {
    pub removals: Vec<ReverseRecord>,
    pub additions: Vec<PtrAddition>,
}

impl ReversePlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.additions.is_empty()
    }
}

type PtrKey = (String, String);

/// Compute the changes for a reverse zone.
///
/// Candidates outside `range` are ignored. Additions come out ordered by
/// address, then zone, then host.
#[must_use]
pub fn compute_plan(
    range: &NetRange,
    existing: &[ReverseRecord],
    candidates: &[ForwardCandidate],
    preferred: &[PreferredA],
) -> ReversePlan {
    let preferred: HashMap<Ipv4Addr, i64> =
        preferred.iter().map(|p| (p.ip, p.record_id)).collect();

    let mut survivors: Vec<&ForwardCandidate> = candidates
        .iter()
        .filter(|c| range.contains(c.ip))
        .filter(|c| preferred.get(&c.ip).map_or(true, |id| *id == c.record_id))
        .collect();
    survivors.sort_by(|a, b| {
        u32::from(a.ip)
            .cmp(&u32::from(b.ip))
            .then_with(|| a.zone.cmp(&b.zone))
            .then_with(|| a.host.cmp(&b.host))
    });

    let block = range.block_index();
    let mut wanted: HashSet<PtrKey> = HashSet::new();
    let mut desired = Vec::new();
    for candidate in survivors {
        let Some(host) = range.ptr_host(candidate.ip) else {
            continue;
        };
        let destination = record_fqdn(&candidate.host, &candidate.zone);
        if wanted.insert((host.clone(), destination.clone())) {
            desired.push(PtrAddition {
                ip: candidate.ip,
                block,
                host,
                destination,
            });
        }
    }

    let mut present: HashSet<PtrKey> = HashSet::new();
    let removals = existing
        .iter()
        .filter(|record| {
            let key = (record.host.clone(), fqdn(&record.destination));
            !(wanted.contains(&key) && present.insert(key))
        })
        .cloned()
        .collect();

    let additions = desired
        .into_iter()
        .filter(|a| !present.contains(&(a.host.clone(), a.destination.clone())))
        .collect();

    ReversePlan {
        removals,
        additions,
    }
}

fn existing_ptrs(ctx: &BuildContext, zone: &ReverseZone, range: &NetRange) -> Result<Vec<ReverseRecord>> {
    let mut ptrs = Vec::new();
    for block in range.blocks() {
        ptrs.extend(catalog::reverse_records(ctx.store(), zone.id, block)?);
    }
    Ok(ptrs)
}

fn load_master(ctx: &BuildContext, net_range: &str) -> Result<(ReverseZone, NetRange)> {
    let zone = catalog::reverse_zone(ctx.store(), net_range)?;
    if zone.kind == ZoneKind::Slave {
        return Err(ZoneError::NotMaster {
            zone: zone.net_range,
        }
        .into());
    }
    let range = zone.range()?;
    Ok((zone, range))
}

/// Load the zone's current state and compute its plan. Performs no writes.
///
/// # Errors
///
/// Returns store or record-set shape errors.
pub fn plan_reverse_zone(ctx: &BuildContext, zone: &ReverseZone, range: &NetRange) -> Result<ReversePlan> {
    let existing = existing_ptrs(ctx, zone, range)?;
    let candidates = catalog::forward_candidates(ctx.store(), range)?;
    let preferred = catalog::preferred_in_range(ctx.store(), range)?;
    let plan = compute_plan(range, &existing, &candidates, &preferred);
    debug!(
        zone = %range,
        existing = existing.len(),
        candidates = candidates.len(),
        preferred = preferred.len(),
        additions = plan.additions.len(),
        removals = plan.removals.len(),
        "Computed reverse zone plan"
    );
    Ok(plan)
}

/// Apply a plan: all removals, then all insertions, then flag the zone as
/// updated.
///
/// # Errors
///
/// Returns the first store error; earlier statements stay applied.
pub fn apply_plan(ctx: &BuildContext, zone: &ReverseZone, plan: &ReversePlan) -> Result<()> {
    for record in &plan.removals {
        catalog::delete_reverse_record(ctx.store(), record.id)?;
    }
    for addition in &plan.additions {
        catalog::insert_reverse_record(
            ctx.store(),
            zone.id,
            addition.block,
            &addition.host,
            &addition.destination,
        )?;
    }
    catalog::mark_reverse_updated(ctx.store(), zone.id)?;
    metrics::record_ptr_changes(plan.additions.len(), plan.removals.len());
    info!(
        zone = %zone.net_range,
        added = plan.additions.len(),
        removed = plan.removals.len(),
        "Applied reverse zone changes"
    );
    Ok(())
}

fn build_file(ctx: &BuildContext, zone: &ReverseZone, range: &NetRange) -> Result<BuildOutcome> {
    let ptrs = existing_ptrs(ctx, zone, range)?;
    let target = ZoneTarget {
        side: ZoneSide::Reverse,
        id: zone.id,
        name: range.arpa_name(),
        path: ctx.settings.zone_path(&zone.net_range),
    };
    let stored = StoredState {
        serial: zone.serial,
        validity: zone.validity,
        updated: zone.updated,
    };
    install_zone(ctx, &target, stored, |serial| {
        Ok(render_reverse_zone(zone, serial, &ptrs))
    })
}

/// Render, check and install a reverse zone from its current PTR records,
/// without reconciling them.
///
/// # Errors
///
/// Returns `ZoneNotFound`, `NotMaster`, range errors, or build errors.
pub fn build_reverse_zone(ctx: &BuildContext, net_range: &str) -> Result<BuildOutcome> {
    let started = Instant::now();
    let result = load_master(ctx, net_range).and_then(|(zone, range)| build_file(ctx, &zone, &range));
    record_build(ZoneSide::Reverse, &result, started.elapsed());
    result
}

/// Result of reconciling one reverse zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReverseOutcome {
    pub added: usize,
    pub removed: usize,
    pub build: BuildOutcome,
}

impl fmt::Display for ReverseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{} -{} {}", self.added, self.removed, self.build)
    }
}

/// Reconcile a reverse zone's PTR records and rebuild its zone file if
/// anything changed. Does not touch named.conf.
///
/// # Errors
///
/// Returns lookup, range, store, shape or build errors.
pub fn reconcile_reverse_zone(ctx: &BuildContext, net_range: &str) -> Result<ReverseOutcome> {
    let started = Instant::now();
    let result = reconcile(ctx, net_range);
    record_build(
        ZoneSide::Reverse,
        &result.as_ref().map(|o| o.build),
        started.elapsed(),
    );
    result
}

fn reconcile(ctx: &BuildContext, net_range: &str) -> Result<ReverseOutcome> {
    let (mut zone, range) = load_master(ctx, net_range)?;
    let plan = plan_reverse_zone(ctx, &zone, &range)?;
    if !plan.is_empty() {
        apply_plan(ctx, &zone, &plan)?;
        zone = catalog::reverse_zone(ctx.store(), &zone.net_range)?;
    }
    let build = build_file(ctx, &zone, &range)?;
    Ok(ReverseOutcome {
        added: plan.additions.len(),
        removed: plan.removals.len(),
        build,
    })
}

/// Reconcile one reverse zone and, if its file was reinstalled, rewrite the
/// reverse zone list and reload the nameserver.
///
/// # Errors
///
/// See [`reconcile_reverse_zone`]. A failed reload is logged only.
pub fn build_reverse(ctx: &BuildContext, net_range: &str) -> Result<ReverseOutcome> {
    let outcome = reconcile_reverse_zone(ctx, net_range)?;
    info!(zone = net_range, outcome = %outcome, "Reverse zone processed");
    if outcome.build.is_built() {
        publish::write_reverse_config(ctx)?;
        publish::reload(ctx);
    }
    Ok(outcome)
}

/// Build one reverse zone file and, if it was installed, rewrite the reverse
/// zone list and reload.
///
/// # Errors
///
/// See [`build_reverse_zone`].
pub fn validate_reverse_zone(ctx: &BuildContext, net_range: &str) -> Result<BuildOutcome> {
    let outcome = build_reverse_zone(ctx, net_range)?;
    info!(zone = net_range, outcome = %outcome, "Reverse zone processed");
    if outcome.is_built() {
        publish::write_reverse_config(ctx)?;
        publish::reload(ctx);
    }
    Ok(outcome)
}

/// Render a reverse zone with its stored serial, without side effects.
///
/// # Errors
///
/// See [`build_reverse_zone`].
pub fn display_reverse_zone(ctx: &BuildContext, net_range: &str) -> Result<String> {
    let (zone, range) = load_master(ctx, net_range)?;
    let ptrs = existing_ptrs(ctx, &zone, &range)?;
    Ok(render_reverse_zone(&zone, zone.serial, &ptrs))
}

#[cfg(test)]
#[path = "reverse_tests.rs"]
mod reverse_tests;

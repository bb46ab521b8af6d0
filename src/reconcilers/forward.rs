// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Forward zone builds.

use std::time::Instant;
use tracing::{debug, info};

use super::validator::{install_zone, StoredState, ZoneTarget};
use super::{publish, record_build, BuildOutcome};
use crate::bind9::{render_forward_zone, ForwardZoneRecords};
use crate::context::BuildContext;
use crate::dns_errors::{Result, ZoneError};
use crate::metrics::ZoneSide;
use crate::model::{ForwardZone, GlueRecord, Record, ZoneKind};
use crate::store::catalog;

/// Everything rendered into one forward zone.
#[derive(Debug, Clone)]
pub struct ForwardZoneData {
    pub zone: ForwardZone,
    pub header: Vec<Record>,
    pub plain: Vec<Record>,
    pub glue: Vec<GlueRecord>,
}

impl ForwardZoneData {
    /// Load a master zone and its records.
    ///
    /// # Errors
    ///
    /// Returns `ZoneNotFound`, `NotMaster` for slave zones, or any store or
    /// record-set shape error.
    pub fn load(ctx: &BuildContext, name: &str) -> Result<Self> {
        let zone = catalog::forward_zone(ctx.store(), name)?;
        if zone.kind == ZoneKind::Slave {
            return Err(ZoneError::NotMaster { zone: zone.name }.into());
        }
        let header = catalog::header_records(ctx.store(), zone.id)?;
        let plain = catalog::plain_records(ctx.store(), zone.id)?;
        let glue = catalog::glue_records(ctx.store(), zone.id)?;
        debug!(
            zone = %zone.name,
            header = header.len(),
            plain = plain.len(),
            glue = glue.len(),
            "Loaded forward zone"
        );
        Ok(Self {
            zone,
            header,
            plain,
            glue,
        })
    }

    /// Zone text with the given serial.
    ///
    /// # Errors
    ///
    /// Returns an SRV lookup error.
    pub fn render(&self, ctx: &BuildContext, serial: u64) -> Result<String> {
        let records = ForwardZoneRecords {
            header: &self.header,
            plain: &self.plain,
            glue: &self.glue,
        };
        Ok(render_forward_zone(&self.zone, serial, records, &ctx.services)?)
    }
}

fn build(ctx: &BuildContext, name: &str) -> Result<BuildOutcome> {
    let data = ForwardZoneData::load(ctx, name)?;
    let target = ZoneTarget {
        side: ZoneSide::Forward,
        id: data.zone.id,
        name: data.zone.name.clone(),
        path: ctx.settings.zone_path(&data.zone.name),
    };
    let stored = StoredState {
        serial: data.zone.serial,
        validity: data.zone.validity,
        updated: data.zone.updated,
    };
    install_zone(ctx, &target, stored, |serial| data.render(ctx, serial))
}

/// Render, check and install one forward zone.
///
/// Does not touch named.conf; see [`validate_forward_zone`].
///
/// # Errors
///
/// See [`ForwardZoneData::load`] and [`install_zone`].
pub fn build_forward_zone(ctx: &BuildContext, name: &str) -> Result<BuildOutcome> {
    let started = Instant::now();
    let result = build(ctx, name);
    record_build(ZoneSide::Forward, &result, started.elapsed());
    result
}

/// Build one forward zone and, if it was installed, rewrite the forward zone
/// list and reload the nameserver.
///
/// # Errors
///
/// Returns build or config errors. A failed reload is logged only.
pub fn validate_forward_zone(ctx: &BuildContext, name: &str) -> Result<BuildOutcome> {
    let outcome = build_forward_zone(ctx, name)?;
    info!(zone = name, outcome = %outcome, "Forward zone processed");
    if outcome.is_built() {
        publish::write_forward_config(ctx)?;
        publish::reload(ctx);
    }
    Ok(outcome)
}

/// Render a forward zone with its stored serial, without side effects.
///
/// # Errors
///
/// See [`ForwardZoneData::load`].
pub fn display_forward_zone(ctx: &BuildContext, name: &str) -> Result<String> {
    let data = ForwardZoneData::load(ctx, name)?;
    data.render(ctx, data.zone.serial)
}

#[cfg(test)]
#[path = "forward_tests.rs"]
mod forward_tests;

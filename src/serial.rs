// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone serial numbers and change detection.
//!
//! Serials use the `YYYYMMDDnn` convention. The first build of a day gets
//! revision `01`; further builds on the same day (or any build whose stored
//! serial is already ahead of today) increment the stored value by one, so the
//! serial never goes backwards.
//!
//! Whether a zone needs a new serial at all is decided by comparing a digest of
//! the rendered zone body, with the serial line masked out, against the file
//! already on disk.

use chrono::{Datelike, Local, NaiveDate};
use sha2::{Digest, Sha256};

use crate::constants::{SERIAL_DATE_MULTIPLIER, SERIAL_FIRST_REVISION};
use crate::model::Validity;

/// Marker the renderer puts after the serial in the SOA block.
pub const SERIAL_COMMENT: &str = "; Serial";

/// First serial of `date`, e.g. `2024010101`.
#[must_use]
pub fn serial_for_date(date: NaiveDate) -> u64 {
    let ymd = u64::from(date.year().unsigned_abs()) * 10_000
        + u64::from(date.month()) * 100
        + u64::from(date.day());
    ymd * SERIAL_DATE_MULTIPLIER + SERIAL_FIRST_REVISION
}

/// Today's date in local time, as the serial is based on it.
#[must_use]
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Serial to publish next, given the stored serial and today's date.
///
/// Always strictly greater than `stored`.
#[must_use]
pub fn next_serial(stored: u64, today: NaiveDate) -> u64 {
    let candidate = serial_for_date(today);
    if candidate <= stored {
        stored + 1
    } else {
        candidate
    }
}

/// SHA-256 of zone text with the serial line masked.
///
/// Two renders of the same records produce the same digest whatever serial
/// they carry.
#[must_use]
pub fn body_digest(zone_text: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for line in zone_text.lines() {
        if line.trim_end().ends_with(SERIAL_COMMENT) {
            hasher.update(SERIAL_COMMENT.as_bytes());
        } else {
            hasher.update(line.as_bytes());
        }
        hasher.update(b"\n");
    }
    hasher.finalize().into()
}

/// Inputs to the "did this zone change" decision.
#[derive(Debug, Clone, Copy)]
pub struct ChangeCheck<'a> {
    /// Validity recorded in the store
    pub validity: Validity,
    /// `updated` flag recorded in the store
    pub updated: bool,
    /// Fresh render of the zone
    pub rendered: &'a str,
    /// Current live zone file, if any
    pub existing: Option<&'a str>,
}

impl ChangeCheck<'_> {
    /// True when the zone must be rebuilt with a new serial.
    ///
    /// A zone is unchanged only if it is marked valid, not flagged as updated,
    /// and its live file carries the same body as the fresh render.
    #[must_use]
    pub fn changed(&self) -> bool {
        if self.updated || self.validity != Validity::Valid {
            return true;
        }
        match self.existing {
            Some(existing) => body_digest(existing) != body_digest(self.rendered),
            None => true,
        }
    }
}

#[cfg(test)]
#[path = "serial_tests.rs"]
mod serial_tests;

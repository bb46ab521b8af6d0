// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone builds and reverse-zone reconciliation.
//!
//! Every operation here takes a [`BuildContext`](crate::context::BuildContext)
//! and runs synchronously: store round trips, file writes and subprocesses
//! all block, and zones are processed one after another.
//!
//! # Build pipeline
//!
//! 1. **Load** - fetch the zone and its records from the store
//! 2. **Compare** - render with the stored serial and compare with the live file
//! 3. **Render** - if anything changed, render again with the next serial
//! 4. **Check** - stage the file and run the zone checker on it
//! 5. **Install** - rename over the live file only if the check passed
//! 6. **Publish** - rewrite the named.conf zone list and reload
//!
//! # Available Operations
//!
//! ## Forward zones
//!
//! - [`build_forward_zone`] - Render, check and install one forward zone
//! - [`validate_forward_zone`] - Build, then publish and reload
//! - [`display_forward_zone`] - Render without side effects
//!
//! ## Reverse zones
//!
//! - [`compute_plan`] - Pure PTR difference between forward and reverse data
//! - [`reconcile_reverse_zone`] - Apply the plan and rebuild the zone
//! - [`build_reverse`] - Reconcile, then publish and reload
//! - [`build_reverse_zone`] / [`validate_reverse_zone`] - Rebuild without reconciling
//!
//! ## Batches
//!
//! - [`validate_all`], [`validate_all_reverse`], [`validate_every_zone`], [`build_all_reverse`]
//! - [`publish::commit`] - Rewrite both zone lists and reload once
//!
//! # Example
//!
//! ```rust,no_run
//! use dnsa::config::Settings;
//! use dnsa::context::BuildContext;
//! use dnsa::reconcilers::build_reverse;
//!
//! # fn example() -> dnsa::dns_errors::Result<()> {
//! let ctx = BuildContext::from_settings(Settings::default())?;
//! let outcome = build_reverse(&ctx, "192.168.1.0")?;
//! println!("{outcome}");
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod forward;
pub mod publish;
pub mod reverse;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_support;

pub use batch::{
    build_all_reverse, validate_all, validate_all_reverse, validate_every_zone, BatchReport,
};
pub use forward::{build_forward_zone, display_forward_zone, validate_forward_zone};
pub use reverse::{
    build_reverse, build_reverse_zone, compute_plan, display_reverse_zone, reconcile_reverse_zone,
    validate_reverse_zone, PtrAddition, ReverseOutcome, ReversePlan,
};

use std::fmt;
use std::time::Duration;

use crate::metrics::{self, BuildResult, ZoneSide};

/// How a single zone build ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// A new file was installed with this serial
    Built { serial: u64 },
    /// Nothing changed; the stored serial stands
    Unchanged { serial: u64 },
    /// The checker rejected the new file; the live file was kept
    Invalid,
}

impl BuildOutcome {
    #[must_use]
    pub fn is_built(self) -> bool {
        matches!(self, Self::Built { .. })
    }

    fn metric(self) -> BuildResult {
        match self {
            Self::Built { .. } => BuildResult::Built,
            Self::Unchanged { .. } => BuildResult::Unchanged,
            Self::Invalid => BuildResult::Invalid,
        }
    }
}

impl fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Built { serial } => write!(f, "built (serial {serial})"),
            Self::Unchanged { serial } => write!(f, "unchanged (serial {serial})"),
            Self::Invalid => f.write_str("invalid"),
        }
    }
}

fn record_build<E>(side: ZoneSide, result: &Result<BuildOutcome, E>, elapsed: Duration) {
    let outcome = match result {
        Ok(outcome) => outcome.metric(),
        Err(_) => BuildResult::Error,
    };
    metrics::record_zone_build(side, outcome, elapsed);
}

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Nameserver reload through `rndc`.

use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};

use crate::constants::RNDC_RELOAD_COMMAND;
use crate::dns_errors::ProcessError;

/// Asks the running nameserver to pick up new zone files and configuration.
pub trait Reloader {
    /// Reload everything.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::ReloadFailed`] if the command cannot run or
    /// exits non-zero.
    fn reload(&self) -> Result<(), ProcessError>;
}

/// The failure line rndc prints, e.g. `rndc: 'reload' failed: permission denied`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RndcFailure {
    pub command: String,
    pub error: String,
}

impl RndcFailure {
    /// Find the failure line in rndc output.
    #[must_use]
    pub fn parse(output: &str) -> Option<Self> {
        output.lines().find_map(|line| {
            let rest = line.trim().strip_prefix("rndc:")?.trim_start();
            let (quoted, error) = rest.split_once(" failed:")?;
            Some(Self {
                command: quoted.trim_matches('\'').to_string(),
                error: error.trim().to_string(),
            })
        })
    }
}

/// [`Reloader`] that runs `<rndc> reload`.
#[derive(Debug, Clone)]
pub struct Rndc {
    program: PathBuf,
}

impl Rndc {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Reloader for Rndc {
    fn reload(&self) -> Result<(), ProcessError> {
        let program = self.program.display().to_string();
        debug!(program = %program, "Reloading nameserver");

        let output = Command::new(&self.program)
            .arg(RNDC_RELOAD_COMMAND)
            .output()
            .map_err(|e| ProcessError::ReloadFailed {
                program: program.clone(),
                reason: e.to_string(),
            })?;

        if output.status.success() {
            info!(program = %program, "Nameserver reloaded");
            return Ok(());
        }

        let text = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let reason = match RndcFailure::parse(&text) {
            Some(failure) => format!("{} failed: {}", failure.command, failure.error),
            None => format!("exited with {}", output.status),
        };
        Err(ProcessError::ReloadFailed { program, reason })
    }
}

#[cfg(test)]
#[path = "rndc_tests.rs"]
mod rndc_tests;

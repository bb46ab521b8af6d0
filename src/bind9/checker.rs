// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone and configuration checking with `named-checkzone` / `named-checkconf`.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

use crate::dns_errors::ProcessError;

/// Outcome of a zone check that managed to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckVerdict {
    /// Checker exited with status 0
    pub valid: bool,
    /// Combined stdout and stderr, trimmed
    pub output: String,
}

/// Validates rendered zone files and named.conf fragments.
pub trait ZoneChecker {
    /// Check `file` as the zone `zone`.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::CheckerUnavailable`] if the checker cannot be
    /// run at all. A rejected zone is an `Ok` verdict with `valid == false`.
    fn check_zone(&self, zone: &str, file: &Path) -> Result<CheckVerdict, ProcessError>;

    /// Check a named.conf fragment.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::ConfigRejected`] when the checker rejects the
    /// file, or [`ProcessError::CheckerUnavailable`] when it cannot be run.
    fn check_config(&self, file: &Path) -> Result<(), ProcessError>;
}

fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text.trim().to_string()
}

/// [`ZoneChecker`] backed by the BIND utilities.
#[derive(Debug, Clone)]
pub struct NamedChecker {
    checkzone: PathBuf,
    checkconf: PathBuf,
}

impl NamedChecker {
    #[must_use]
    pub fn new(checkzone: impl Into<PathBuf>, checkconf: impl Into<PathBuf>) -> Self {
        Self {
            checkzone: checkzone.into(),
            checkconf: checkconf.into(),
        }
    }

    fn run(program: &Path, args: &[&OsStr]) -> Result<Output, ProcessError> {
        debug!(program = %program.display(), ?args, "Running checker");
        Command::new(program)
            .args(args)
            .output()
            .map_err(|e| ProcessError::CheckerUnavailable {
                program: program.display().to_string(),
                reason: e.to_string(),
            })
    }
}

impl ZoneChecker for NamedChecker {
    fn check_zone(&self, zone: &str, file: &Path) -> Result<CheckVerdict, ProcessError> {
        let output = Self::run(&self.checkzone, &[OsStr::new(zone), file.as_os_str()])?;
        Ok(CheckVerdict {
            valid: output.status.success(),
            output: combined_output(&output),
        })
    }

    fn check_config(&self, file: &Path) -> Result<(), ProcessError> {
        let output = Self::run(&self.checkconf, &[file.as_os_str()])?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ProcessError::ConfigRejected {
                path: file.display().to_string(),
                output: combined_output(&output),
            })
        }
    }
}

#[cfg(test)]
#[path = "checker_tests.rs"]
mod checker_tests;

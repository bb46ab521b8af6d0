// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Staged file writes.
//!
//! Files are written to a temporary file in the destination directory and
//! renamed over the live path only when the caller commits. Dropping a
//! [`StagedFile`] removes the temporary file, so nothing half-written or
//! rejected ever replaces a live zone file.

use std::fs::{self, Permissions};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::constants::{STAGING_FILE_PREFIX, ZONE_FILE_MODE};
use crate::dns_errors::{DnsaError, Result};

/// File contents waiting to replace `target`.
#[derive(Debug)]
pub struct StagedFile {
    temp: NamedTempFile,
    target: PathBuf,
}

impl StagedFile {
    /// Temporary path, for checking before commit.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Final destination.
    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Atomically move the staged contents over the target.
    ///
    /// # Errors
    ///
    /// Returns [`DnsaError::File`] if the rename fails.
    pub fn commit(self) -> Result<()> {
        let target = self.target;
        self.temp
            .persist(&target)
            .map_err(|e| DnsaError::file(&target, e.error))?;
        debug!(path = %target.display(), "Installed file");
        Ok(())
    }
}

/// Write `contents` to a temporary file next to `target`, mode `0664`.
///
/// # Errors
///
/// Returns [`DnsaError::File`] if the directory is missing or not writable.
pub fn stage(target: &Path, contents: &str) -> Result<StagedFile> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = tempfile::Builder::new()
        .prefix(STAGING_FILE_PREFIX)
        .tempfile_in(dir)
        .map_err(|e| DnsaError::file(target, e))?;
    temp.write_all(contents.as_bytes())
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| DnsaError::file(temp.path(), e))?;
    fs::set_permissions(temp.path(), Permissions::from_mode(ZONE_FILE_MODE))
        .map_err(|e| DnsaError::file(temp.path(), e))?;
    Ok(StagedFile {
        temp,
        target: target.to_path_buf(),
    })
}

/// Stage and commit in one step.
///
/// # Errors
///
/// See [`stage`] and [`StagedFile::commit`].
pub fn write_atomic(target: &Path, contents: &str) -> Result<()> {
    stage(target, contents)?.commit()
}

/// Current contents of a live file, or `None` if it does not exist or cannot
/// be read.
#[must_use]
pub fn read_live(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok()
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod writer_tests;

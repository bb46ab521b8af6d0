// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! named.conf emission and nameserver reload.

use std::path::Path;
use tracing::{info, warn};

use crate::bind9::{emit_forward_config, emit_reverse_config, writer};
use crate::context::BuildContext;
use crate::dns_errors::{DnsaError, ProcessError, Result};
use crate::metrics;
use crate::store::catalog;

/// Stage `text`, check it with the configuration checker, then install it.
///
/// A rejected fragment is discarded and the live file is left alone. If the
/// checker cannot run, the fragment is installed with a warning: every zone in
/// it has already passed its own zone check.
fn install_config(ctx: &BuildContext, path: &Path, text: &str) -> Result<()> {
    let staged = writer::stage(path, text)?;
    match ctx.checker.check_config(staged.path()) {
        Ok(()) => {}
        Err(e @ ProcessError::CheckerUnavailable { .. }) => {
            warn!(path = %path.display(), error = %e, "Configuration checker unavailable, installing unchecked");
        }
        Err(e) => return Err(e.into()),
    }
    staged.commit()?;
    info!(path = %path.display(), "Zone configuration written");
    Ok(())
}

/// Rewrite the forward zone list from the store.
///
/// # Errors
///
/// Returns store, file or `ConfigRejected` errors.
pub fn write_forward_config(ctx: &BuildContext) -> Result<()> {
    let zones = catalog::forward_zones(ctx.store())?;
    let text = emit_forward_config(&zones, &ctx.stanza_context());
    install_config(ctx, &ctx.settings.forward_config, &text)
}

/// Rewrite the reverse zone list from the store.
///
/// # Errors
///
/// Returns store, file or `ConfigRejected` errors.
pub fn write_reverse_config(ctx: &BuildContext) -> Result<()> {
    let zones = catalog::reverse_zones(ctx.store())?;
    let text = emit_reverse_config(&zones, &ctx.stanza_context());
    install_config(ctx, &ctx.settings.reverse_config, &text)
}

/// Reload the nameserver. Failures are logged and counted, never returned.
///
/// Returns true if the reload succeeded.
pub fn reload(ctx: &BuildContext) -> bool {
    match ctx.reloader.reload() {
        Ok(()) => {
            metrics::record_reload("success");
            true
        }
        Err(e) => {
            let e = DnsaError::from(e);
            metrics::record_reload("failure");
            warn!(reason = e.status_reason(), error = %e, "Reload failed, zone files left in place");
            false
        }
    }
}

/// Rewrite both zone lists and reload once.
///
/// # Errors
///
/// Returns the first config error; the reload is skipped in that case.
pub fn commit(ctx: &BuildContext) -> Result<bool> {
    let written = write_forward_config(ctx).and_then(|()| write_reverse_config(ctx));
    if let Err(e) = written {
        metrics::record_reload("skipped");
        return Err(e);
    }
    Ok(reload(ctx))
}

#[cfg(test)]
#[path = "publish_tests.rs"]
mod publish_tests;

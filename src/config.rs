// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! YAML configuration for the zone builder.
//!
//! The configuration file is looked up in this order:
//!
//! 1. An explicit path (the `--config` flag)
//! 2. The path in the `DNSA_CONFIG` environment variable
//! 3. `/etc/dnsa/dnsa.yaml`
//!
//! A missing file at the default location is not an error: every setting has a
//! default. A missing file that was asked for explicitly is.
//!
//! # Example
//!
//! ```yaml
//! database: /var/lib/cmdb/cmdb.sqlite
//! zone_dir: /var/named
//! forward_config: /etc/bind/named.conf.dnsa.zones
//! reverse_config: /etc/bind/named.conf.dnsa.rev
//! primary_ns: ns1.example.com
//! secondary_ns: ns2.example.com
//! hostmaster: hostmaster.example.com
//! notify_source_v4: 192.0.2.53
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::{
    CONFIG_PATH_ENV, DEFAULT_CHECKCONF_PATH, DEFAULT_CHECKZONE_PATH, DEFAULT_CONFIG_PATH,
    DEFAULT_DATABASE_PATH, DEFAULT_FORWARD_CONFIG, DEFAULT_HOSTMASTER, DEFAULT_PRIMARY_NS,
    DEFAULT_REVERSE_CONFIG, DEFAULT_RNDC_PATH, DEFAULT_SERVICES_FILE, DEFAULT_SLAVE_DIR,
    DEFAULT_SOA_EXPIRE_SECS, DEFAULT_SOA_REFRESH_SECS, DEFAULT_SOA_RETRY_SECS, DEFAULT_ZONE_DIR,
    DEFAULT_ZONE_TTL_SECS,
};
use crate::model::SoaTimers;

/// Runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// SQLite database file
    pub database: PathBuf,
    /// Directory of master zone files, always ending in `/`
    pub zone_dir: String,
    /// Directory of slave zone files, always ending in `/`
    pub slave_dir: String,
    /// named.conf fragment for forward zones
    pub forward_config: PathBuf,
    /// named.conf fragment for reverse zones
    pub reverse_config: PathBuf,
    pub checkzone: PathBuf,
    pub checkconf: PathBuf,
    pub rndc: PathBuf,
    /// Defaults for zones created from the command line
    pub hostmaster: String,
    pub primary_ns: String,
    pub secondary_ns: Option<String>,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub ttl: u32,
    /// Written as `notify-source` for master zones with an IPv4 secondary
    pub notify_source_v4: Option<Ipv4Addr>,
    /// Written as `notify-source-v6` for master zones with an IPv6 secondary
    pub notify_source_v6: Option<Ipv6Addr>,
    pub services_file: PathBuf,
    /// Prometheus textfile written at exit, if set
    pub metrics_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE_PATH),
            zone_dir: DEFAULT_ZONE_DIR.to_string(),
            slave_dir: DEFAULT_SLAVE_DIR.to_string(),
            forward_config: PathBuf::from(DEFAULT_FORWARD_CONFIG),
            reverse_config: PathBuf::from(DEFAULT_REVERSE_CONFIG),
            checkzone: PathBuf::from(DEFAULT_CHECKZONE_PATH),
            checkconf: PathBuf::from(DEFAULT_CHECKCONF_PATH),
            rndc: PathBuf::from(DEFAULT_RNDC_PATH),
            hostmaster: DEFAULT_HOSTMASTER.to_string(),
            primary_ns: DEFAULT_PRIMARY_NS.to_string(),
            secondary_ns: None,
            refresh: DEFAULT_SOA_REFRESH_SECS,
            retry: DEFAULT_SOA_RETRY_SECS,
            expire: DEFAULT_SOA_EXPIRE_SECS,
            ttl: DEFAULT_ZONE_TTL_SECS,
            notify_source_v4: None,
            notify_source_v6: None,
            services_file: PathBuf::from(DEFAULT_SERVICES_FILE),
            metrics_file: None,
        }
    }
}

fn with_trailing_slash(dir: &str) -> String {
    if dir.ends_with('/') {
        dir.to_string()
    } else {
        format!("{dir}/")
    }
}

impl Settings {
    /// Parse settings from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid YAML or unknown keys.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let settings: Self = serde_yaml::from_str(text).context("Invalid dnsa configuration")?;
        Ok(settings.normalized())
    }

    /// Load settings following the lookup order in the module docs.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file is missing or any file
    /// fails to parse.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        match explicit.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::from_file(&path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::from_file(default)
                } else {
                    debug!(path = DEFAULT_CONFIG_PATH, "No configuration file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    /// Read and parse one file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration {}", path.display()))?;
        let settings = Self::from_yaml(&text)
            .with_context(|| format!("Failed to parse configuration {}", path.display()))?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(settings)
    }

    /// Apply the trailing-slash rule to directory settings.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.zone_dir = with_trailing_slash(&self.zone_dir);
        self.slave_dir = with_trailing_slash(&self.slave_dir);
        self
    }

    /// Default SOA timers for new zones.
    #[must_use]
    pub fn timers(&self) -> SoaTimers {
        SoaTimers {
            refresh: self.refresh,
            retry: self.retry,
            expire: self.expire,
            ttl: self.ttl,
        }
    }

    /// Live path of a master zone file.
    #[must_use]
    pub fn zone_path(&self, file_name: &str) -> PathBuf {
        PathBuf::from(format!("{}{file_name}", self.zone_dir))
    }

    /// Path of a slave zone file.
    #[must_use]
    pub fn slave_path(&self, file_name: &str) -> PathBuf {
        PathBuf::from(format!("{}{file_name}", self.slave_dir))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;

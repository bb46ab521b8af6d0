// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Build context threaded through every zone operation.
//!
//! A [`BuildContext`] owns everything a build needs from the outside world:
//! the record store, the settings, the zone checker and reloader, the SRV
//! service table, and the date serials are based on. Nothing in the library
//! reaches for global state.

use chrono::NaiveDate;

use crate::bind9::{NamedChecker, Reloader, Rndc, StanzaContext, ZoneChecker};
use crate::config::Settings;
use crate::dns_errors::Result;
use crate::serial;
use crate::services::ServiceTable;
use crate::store::sqlite::SqliteStore;
use crate::store::RecordStore;

/// Shared state for one CLI invocation.
pub struct BuildContext {
    /// Record store all zone data comes from
    pub store: Box<dyn RecordStore>,

    pub settings: Settings,

    /// Zone and configuration checker
    pub checker: Box<dyn ZoneChecker>,

    /// Nameserver reload capability
    pub reloader: Box<dyn Reloader>,

    /// SRV port lookup
    pub services: ServiceTable,

    /// Date new serials are derived from
    pub today: NaiveDate,
}

impl BuildContext {
    /// Assemble a context from explicit parts.
    #[must_use]
    pub fn new(
        store: Box<dyn RecordStore>,
        settings: Settings,
        checker: Box<dyn ZoneChecker>,
        reloader: Box<dyn Reloader>,
    ) -> Self {
        Self {
            store,
            settings,
            checker,
            reloader,
            services: ServiceTable::builtin(),
            today: serial::today(),
        }
    }

    /// Production context: SQLite store, BIND utilities and the services file
    /// named in `settings`.
    ///
    /// # Errors
    ///
    /// Returns a store error if the database cannot be opened.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let store = SqliteStore::open(&settings.database)?;
        let checker = NamedChecker::new(&settings.checkzone, &settings.checkconf);
        let reloader = Rndc::new(&settings.rndc);
        let services = ServiceTable::load(&settings.services_file);
        Ok(Self {
            services,
            ..Self::new(
                Box::new(store),
                settings,
                Box::new(checker),
                Box::new(reloader),
            )
        })
    }

    /// Replace the service table.
    #[must_use]
    pub fn with_services(mut self, services: ServiceTable) -> Self {
        self.services = services;
        self
    }

    /// Pin the serial date.
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// The record store as a trait object.
    #[must_use]
    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    /// Directories and notify sources for config stanzas.
    #[must_use]
    pub fn stanza_context(&self) -> StanzaContext<'_> {
        StanzaContext::from_settings(&self.settings)
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod context_tests;

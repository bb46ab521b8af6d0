// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Everything that touches the nameserver side of a build.
//!
//! - [`zone_file`] renders BIND master files from store records
//! - [`writer`] stages files next to their destination and installs them atomically
//! - [`checker`] runs `named-checkzone` and `named-checkconf`
//! - [`named_conf`] produces the zone stanzas included from named.conf
//! - [`rndc`] reloads the running server
//!
//! The checker and reloader are traits so builds can run against fakes.
//!
//! # Example
//!
//! ```rust,no_run
//! use dnsa::bind9::{NamedChecker, Reloader, Rndc, ZoneChecker};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), dnsa::dns_errors::ProcessError> {
//! let checker = NamedChecker::new("/usr/sbin/named-checkzone", "/usr/sbin/named-checkconf");
//! let verdict = checker.check_zone("example.com", Path::new("/var/named/example.com"))?;
//! if verdict.valid {
//!     Rndc::new("/usr/sbin/rndc").reload()?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod checker;
pub mod named_conf;
pub mod rndc;
pub mod writer;
pub mod zone_file;

pub use checker::{CheckVerdict, NamedChecker, ZoneChecker};
pub use named_conf::{emit_forward_config, emit_reverse_config, NotifySources, StanzaContext};
pub use rndc::{Reloader, Rndc};
pub use zone_file::{render_forward_zone, render_reverse_zone, ForwardZoneRecords};

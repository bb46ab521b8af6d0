// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! IPv4 range arithmetic for reverse zones.
//!
//! A reverse zone is identified by a network address and a prefix length. Only
//! octet-aligned prefixes (/8, /16, /24) and the RFC 2317 classless range
//! (/25 to /32) are accepted; everything else is rejected with a
//! [`RangeError`] rather than guessed at.
//!
//! # Naming
//!
//! ```text
//! 10.0.0.0/8        -> 10.in-addr.arpa
//! 172.16.0.0/16     -> 16.172.in-addr.arpa
//! 192.168.1.0/24    -> 1.168.192.in-addr.arpa
//! 192.168.1.64/26   -> 64/26.1.168.192.in-addr.arpa
//! 192.168.1.7/32    -> 7.1.168.192.in-addr.arpa
//! ```
//!
//! # Membership
//!
//! Forward A records are selected with a SQL `LIKE` pattern that fixes the
//! octets the prefix retains (`"192.168.%"`). Classless blocks share the
//! pattern of their enclosing /24, so a [`SearchRange`] also carries the
//! numeric bounds that pin the high bits of the last octet.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::constants::{IN_ADDR_ARPA_SUFFIX, ZONE_APEX};
use crate::dns_errors::RangeError;

/// Number of addresses covered by a prefix, `2^(32 - prefix)`.
///
/// # Errors
///
/// Returns [`RangeError::IllegalPrefix`] when `prefix` is 0 or greater than 32.
pub fn net_range_size(prefix: u8) -> Result<u32, RangeError> {
    match prefix {
        1..=32 => Ok(1u32 << (32 - u32::from(prefix))),
        _ => Err(RangeError::IllegalPrefix { prefix }),
    }
}

/// Check that `prefix` is one of /8, /16, /24 or /25-/32.
///
/// # Errors
///
/// Returns [`RangeError::IllegalPrefix`] for every other length.
pub fn check_prefix(prefix: u8) -> Result<(), RangeError> {
    match prefix {
        8 | 16 | 24..=32 => Ok(()),
        _ => Err(RangeError::IllegalPrefix { prefix }),
    }
}

/// Number of reverse-zone blocks a prefix divides its /24 into.
///
/// Octet-aligned prefixes own a single block. Each classless bit beyond /24
/// doubles the number of sibling blocks in the enclosing /24, one per RFC 2317
/// delegation, so /25 yields 2 and /26 yields 4.
///
/// # Errors
///
/// Returns [`RangeError::IllegalPrefix`] for prefixes outside the legal set.
pub fn reverse_zone_index(prefix: u8) -> Result<u32, RangeError> {
    check_prefix(prefix)?;
    if prefix > 24 {
        Ok(1u32 << (u32::from(prefix) - 24))
    } else {
        Ok(1)
    }
}

/// Build the `in-addr.arpa` zone name for a network.
///
/// # Errors
///
/// Returns a [`RangeError`] if the prefix is illegal or the network is empty,
/// unparsable, or has host bits set.
pub fn in_addr_arpa_name(network: &str, prefix: u8) -> Result<String, RangeError> {
    Ok(NetRange::new(network, prefix)?.arpa_name())
}

/// Recover `(network, prefix)` from a name produced by [`in_addr_arpa_name`].
///
/// A trailing root dot is accepted.
///
/// # Errors
///
/// Returns [`RangeError::InvalidArpaName`] if the name does not have the shape
/// of an IPv4 reverse zone.
pub fn parse_in_addr_arpa_name(name: &str) -> Result<NetRange, RangeError> {
    let invalid = || RangeError::InvalidArpaName {
        name: name.to_string(),
    };
    let trimmed = name.strip_suffix('.').unwrap_or(name);
    let labels = trimmed
        .strip_suffix(IN_ADDR_ARPA_SUFFIX)
        .and_then(|rest| rest.strip_suffix('.'))
        .ok_or_else(invalid)?;

    let mut parts: Vec<&str> = labels.split('.').collect();
    let mut prefix: Option<u8> = None;
    if let Some((octet, bits)) = parts[0].split_once('/') {
        prefix = Some(bits.parse().map_err(|_| invalid())?);
        parts[0] = octet;
        if parts.len() != 4 {
            return Err(invalid());
        }
    }

    let mut octets = parts
        .iter()
        .rev()
        .map(|p| p.parse::<u8>().map_err(|_| invalid()))
        .collect::<Result<Vec<u8>, RangeError>>()?;
    let prefix = match (prefix, octets.len()) {
        (Some(p), 4) if (25..32).contains(&p) => p,
        (None, 1) => 8,
        (None, 2) => 16,
        (None, 3) => 24,
        (None, 4) => 32,
        _ => return Err(invalid()),
    };
    octets.resize(4, 0);
    let network = Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3]);

    NetRange::from_addr(network, prefix).map_err(|_| invalid())
}

/// `LIKE` pattern selecting forward destinations inside block `block` of a range.
///
/// # Errors
///
/// Returns a [`RangeError`] for an illegal range or a block index outside
/// `0..reverse_zone_index(prefix)`.
pub fn search_range_string(network: &str, prefix: u8, block: u32) -> Result<String, RangeError> {
    let range = NetRange::new(network, prefix)?;
    Ok(range.search_block(block)?.pattern)
}

/// A membership test for forward destinations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRange {
    /// SQL `LIKE` pattern with the retained octets fixed
    pub pattern: String,
    /// First address (inclusive) of the block
    pub start: u32,
    /// Last address (inclusive) of the block
    pub finish: u32,
}

impl SearchRange {
    /// True if `ip` lies inside this block.
    #[must_use]
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        (self.start..=self.finish).contains(&u32::from(ip))
    }
}

/// A validated reverse-zone network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetRange {
    network: Ipv4Addr,
    prefix: u8,
}

impl NetRange {
    /// Parse and validate a dotted network plus prefix.
    ///
    /// # Errors
    ///
    /// Returns a [`RangeError`] if the prefix is illegal, the network is empty
    /// or not a dotted quad, or the network has host bits set.
    pub fn new(network: &str, prefix: u8) -> Result<Self, RangeError> {
        let network = network.trim();
        if network.is_empty() {
            return Err(RangeError::EmptyNetwork);
        }
        let addr = Ipv4Addr::from_str(network).map_err(|_| RangeError::InvalidNetwork {
            network: network.to_string(),
        })?;
        Self::from_addr(addr, prefix)
    }

    /// Validate an already-parsed network address.
    ///
    /// # Errors
    ///
    /// See [`NetRange::new`].
    pub fn from_addr(network: Ipv4Addr, prefix: u8) -> Result<Self, RangeError> {
        check_prefix(prefix)?;
        let size = net_range_size(prefix)?;
        if u32::from(network) & (size - 1) != 0 {
            return Err(RangeError::Misaligned {
                network: network.to_string(),
                prefix,
            });
        }
        Ok(Self { network, prefix })
    }

    /// Network address
    #[must_use]
    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    /// Prefix length
    #[must_use]
    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// First address of the range as an integer
    #[must_use]
    pub fn start(&self) -> u32 {
        u32::from(self.network)
    }

    /// Last address of the range as an integer
    #[must_use]
    pub fn finish(&self) -> u32 {
        self.start() + (self.size() - 1)
    }

    /// Number of addresses in the range
    #[must_use]
    pub fn size(&self) -> u32 {
        1u32 << (32 - u32::from(self.prefix))
    }

    /// True for prefixes longer than /24.
    #[must_use]
    pub fn is_classless(&self) -> bool {
        self.prefix > 24
    }

    #[must_use]
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        (self.start()..=self.finish()).contains(&u32::from(ip))
    }

    /// Position of this range among the classless blocks of its /24.
    ///
    /// Always 0 for octet-aligned prefixes.
    #[must_use]
    pub fn block_index(&self) -> u32 {
        if self.is_classless() {
            u32::from(self.network.octets()[3]) >> (32 - u32::from(self.prefix))
        } else {
            0
        }
    }

    /// The block indices this zone owns, used to tag its PTR rows.
    #[must_use]
    pub fn blocks(&self) -> Vec<u32> {
        vec![self.block_index()]
    }

    /// The `in-addr.arpa` zone name for this range.
    #[must_use]
    pub fn arpa_name(&self) -> String {
        let [a, b, c, d] = self.network.octets();
        match self.prefix {
            8 => format!("{a}.{IN_ADDR_ARPA_SUFFIX}"),
            16 => format!("{b}.{a}.{IN_ADDR_ARPA_SUFFIX}"),
            24 => format!("{c}.{b}.{a}.{IN_ADDR_ARPA_SUFFIX}"),
            32 => format!("{d}.{c}.{b}.{a}.{IN_ADDR_ARPA_SUFFIX}"),
            p => format!("{d}/{p}.{c}.{b}.{a}.{IN_ADDR_ARPA_SUFFIX}"),
        }
    }

    /// Membership test for one block of this range.
    ///
    /// `block` is the position among the sibling blocks of the enclosing /24
    /// for classless prefixes, and must be 0 otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::BlockOutOfRange`] when `block` is not below
    /// [`reverse_zone_index`] for the prefix.
    pub fn search_block(&self, block: u32) -> Result<SearchRange, RangeError> {
        let blocks = reverse_zone_index(self.prefix)?;
        if block >= blocks {
            return Err(RangeError::BlockOutOfRange {
                block,
                prefix: self.prefix,
                blocks,
            });
        }
        let (start, finish) = if self.is_classless() {
            let base = self.start() & 0xffff_ff00;
            let start = base + block * self.size();
            (start, start + (self.size() - 1))
        } else {
            (self.start(), self.finish())
        };
        Ok(SearchRange {
            pattern: self.like_pattern(),
            start,
            finish,
        })
    }

    /// Membership test for the block this zone owns.
    #[must_use]
    pub fn search_range(&self) -> SearchRange {
        SearchRange {
            pattern: self.like_pattern(),
            start: self.start(),
            finish: self.finish(),
        }
    }

    fn like_pattern(&self) -> String {
        let [a, b, c, _] = self.network.octets();
        match self.prefix {
            8 => format!("{a}.%"),
            16 => format!("{a}.{b}.%"),
            _ => format!("{a}.{b}.{c}.%"),
        }
    }

    /// PTR owner label for `ip` relative to this zone's origin.
    ///
    /// Returns `None` when `ip` is outside the range.
    #[must_use]
    pub fn ptr_host(&self, ip: Ipv4Addr) -> Option<String> {
        if !self.contains(ip) {
            return None;
        }
        let [_, b, c, d] = ip.octets();
        Some(match self.prefix {
            8 => format!("{d}.{c}.{b}"),
            16 => format!("{d}.{c}"),
            32 => ZONE_APEX.to_string(),
            _ => d.to_string(),
        })
    }
}

impl fmt::Display for NetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

#[cfg(test)]
#[path = "net_range_tests.rs"]
mod net_range_tests;

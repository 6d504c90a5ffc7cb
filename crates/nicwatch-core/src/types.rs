//! Device record and identity types.
//!
//! A `Device` is the aggregated identity state for one hardware address. All
//! attribute sets are grow-only: nothing in this crate ever removes a value.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 48-bit link-layer address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HardwareAddr(pub [u8; 6]);

impl HardwareAddr {
    pub const ZERO: HardwareAddr = HardwareAddr([0; 6]);

    /// Build from a slice; `None` unless it is exactly six bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; 6]>::try_from(bytes).ok().map(HardwareAddr)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Multicast/broadcast group bit (I/G bit of the first octet).
    pub fn is_group(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; 6]
    }
}

impl fmt::Display for HardwareAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

/// Error returned when a hardware address string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid hardware address: {0}")]
pub struct ParseHardwareAddrError(pub String);

impl FromStr for HardwareAddr {
    type Err = ParseHardwareAddrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseHardwareAddrError(s.to_string());

        let parts: Vec<&str> = s.split(|c| c == ':' || c == '-').collect();
        if parts.len() != 6 {
            return Err(invalid());
        }

        let mut octets = [0u8; 6];
        for (slot, part) in octets.iter_mut().zip(parts) {
            if part.len() != 2 {
                return Err(invalid());
            }
            *slot = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }

        Ok(HardwareAddr(octets))
    }
}

impl Serialize for HardwareAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HardwareAddr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Which attribute set of a device record an update targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeKind {
    IpAddress,
    Hostname,
    VendorHint,
    UserAgent,
}

impl AttributeKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            AttributeKind::IpAddress => "IP address",
            AttributeKind::Hostname => "Hostname",
            AttributeKind::VendorHint => "Vendor hint",
            AttributeKind::UserAgent => "User agent",
        }
    }
}

/// A single observed attribute value, produced by an extractor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeUpdate {
    pub kind: AttributeKind,
    pub value: String,
}

impl AttributeUpdate {
    pub fn new(kind: AttributeKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    pub fn ip(value: impl Into<String>) -> Self {
        Self::new(AttributeKind::IpAddress, value)
    }

    pub fn hostname(value: impl Into<String>) -> Self {
        Self::new(AttributeKind::Hostname, value)
    }

    pub fn vendor_hint(value: impl Into<String>) -> Self {
        Self::new(AttributeKind::VendorHint, value)
    }

    pub fn user_agent(value: impl Into<String>) -> Self {
        Self::new(AttributeKind::UserAgent, value)
    }
}

/// Aggregated identity state for one hardware address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Identity key, never changes after creation
    pub hardware_address: HardwareAddr,
    /// IPv4 and IPv6 addresses in textual form
    pub ip_addresses: BTreeSet<String>,
    /// Hostnames announced over DHCP
    pub hostnames: BTreeSet<String>,
    /// Raw DHCP class-identifier values
    pub vendor_hints: BTreeSet<String>,
    /// Raw HTTP User-Agent values seen in SSDP requests
    pub user_agents: BTreeSet<String>,
    /// Timestamp of the most recent frame from this address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
    /// Number of frames attributed to this address
    pub frame_count: u64,
}

impl Device {
    /// Zero-valued record for a newly seen address.
    pub fn new(hardware_address: HardwareAddr) -> Self {
        Self {
            hardware_address,
            ip_addresses: BTreeSet::new(),
            hostnames: BTreeSet::new(),
            vendor_hints: BTreeSet::new(),
            user_agents: BTreeSet::new(),
            last_seen: None,
            frame_count: 0,
        }
    }

    pub fn attribute(&self, kind: AttributeKind) -> &BTreeSet<String> {
        match kind {
            AttributeKind::IpAddress => &self.ip_addresses,
            AttributeKind::Hostname => &self.hostnames,
            AttributeKind::VendorHint => &self.vendor_hints,
            AttributeKind::UserAgent => &self.user_agents,
        }
    }

    fn attribute_mut(&mut self, kind: AttributeKind) -> &mut BTreeSet<String> {
        match kind {
            AttributeKind::IpAddress => &mut self.ip_addresses,
            AttributeKind::Hostname => &mut self.hostnames,
            AttributeKind::VendorHint => &mut self.vendor_hints,
            AttributeKind::UserAgent => &mut self.user_agents,
        }
    }

    /// Add the value to the set named by the update.
    ///
    /// Returns `true` if the set did not already contain the value.
    pub fn apply(&mut self, update: &AttributeUpdate) -> bool {
        let set = self.attribute_mut(update.kind);
        if set.contains(&update.value) {
            return false;
        }
        set.insert(update.value.clone());
        true
    }

    /// Count one frame and advance `last_seen`.
    ///
    /// An older timestamp than the stored one (out-of-order replay) still
    /// counts the frame but leaves `last_seen` where it is.
    pub fn observe(&mut self, timestamp: DateTime<Utc>) {
        self.frame_count += 1;
        self.last_seen = Some(match self.last_seen {
            Some(prev) if prev > timestamp => prev,
            _ => timestamp,
        });
    }
}

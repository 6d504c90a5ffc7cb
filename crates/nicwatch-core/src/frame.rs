//! Decoded frame model.
//!
//! A `DecodedFrame` is what the decoding layer hands to the pipeline: a
//! capture timestamp plus the protocol layers that were recognised, each
//! already parsed into a typed struct.

use std::net::{Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, Utc};

use crate::types::HardwareAddr;

/// Protocol layer tag used as the multiplexer key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerTag {
    Ethernet,
    Arp,
    Dhcpv4,
    Ipv4,
    Ipv6,
    Udp,
}

impl LayerTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerTag::Ethernet => "Ethernet",
            LayerTag::Arp => "ARP",
            LayerTag::Dhcpv4 => "DHCPv4",
            LayerTag::Ipv4 => "IPv4",
            LayerTag::Ipv6 => "IPv6",
            LayerTag::Udp => "UDP",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetLayer {
    pub source: HardwareAddr,
    pub destination: HardwareAddr,
}

/// ARP header. Address fields keep the lengths announced by the packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpLayer {
    pub operation: u16,
    pub sender_hw_address: Vec<u8>,
    pub sender_proto_address: Vec<u8>,
    pub target_hw_address: Vec<u8>,
    pub target_proto_address: Vec<u8>,
}

/// BOOTP operation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhcpOperation {
    Request,
    Reply,
    Other(u8),
}

impl From<u8> for DhcpOperation {
    fn from(op: u8) -> Self {
        match op {
            1 => DhcpOperation::Request,
            2 => DhcpOperation::Reply,
            other => DhcpOperation::Other(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhcpOption {
    pub code: u8,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dhcpv4Layer {
    pub operation: DhcpOperation,
    pub client_hw_address: Vec<u8>,
    pub options: Vec<DhcpOption>,
}

impl Dhcpv4Layer {
    pub fn option(&self, code: u8) -> Option<&DhcpOption> {
        self.options.iter().find(|o| o.code == code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Layer {
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv6Layer {
    pub source: Ipv6Addr,
    pub destination: Ipv6Addr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpLayer {
    pub source_port: u16,
    pub destination_port: u16,
    pub payload: Vec<u8>,
}

/// One decoded protocol layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layer {
    Ethernet(EthernetLayer),
    Arp(ArpLayer),
    Dhcpv4(Dhcpv4Layer),
    Ipv4(Ipv4Layer),
    Ipv6(Ipv6Layer),
    Udp(UdpLayer),
}

impl Layer {
    pub fn tag(&self) -> LayerTag {
        match self {
            Layer::Ethernet(_) => LayerTag::Ethernet,
            Layer::Arp(_) => LayerTag::Arp,
            Layer::Dhcpv4(_) => LayerTag::Dhcpv4,
            Layer::Ipv4(_) => LayerTag::Ipv4,
            Layer::Ipv6(_) => LayerTag::Ipv6,
            Layer::Udp(_) => LayerTag::Udp,
        }
    }
}

/// A link-layer frame already parsed into typed layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub timestamp: DateTime<Utc>,
    pub layers: Vec<Layer>,
}

impl DecodedFrame {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            layers: Vec::new(),
        }
    }

    /// Builder-style layer append, outermost layer first.
    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn push(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    /// First layer carrying the given tag.
    pub fn layer(&self, tag: LayerTag) -> Option<&Layer> {
        self.layers.iter().find(|l| l.tag() == tag)
    }

    pub fn has_layer(&self, tag: LayerTag) -> bool {
        self.layer(tag).is_some()
    }

    pub fn ethernet(&self) -> Option<&EthernetLayer> {
        match self.layer(LayerTag::Ethernet) {
            Some(Layer::Ethernet(eth)) => Some(eth),
            _ => None,
        }
    }

    /// Source hardware address, or `None` when the frame has no link-layer header.
    pub fn source(&self) -> Option<HardwareAddr> {
        self.ethernet().map(|eth| eth.source)
    }
}

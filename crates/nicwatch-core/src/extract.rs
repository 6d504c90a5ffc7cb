//! Protocol-specific extractors.
//!
//! Each extractor reads one decoded layer and reports the identity signals it
//! leaks: addresses from ARP/IPv4/IPv6, hostname and vendor class from DHCP
//! requests, client software from SSDP. Content that fails a check yields no
//! updates; nothing here returns an error.

use crate::frame::{DhcpOperation, Layer, LayerTag};
use crate::mux::ProtocolMux;
use crate::types::{AttributeUpdate, HardwareAddr};

/// UDP destination port for SSDP discovery traffic
pub const SSDP_PORT: u16 = 1900;

/// DHCP option 12
pub const DHCP_OPT_HOSTNAME: u8 = 12;

/// DHCP option 60 (vendor class identifier)
pub const DHCP_OPT_CLASS_ID: u8 = 60;

/// Header slots tried first when parsing an SSDP request
const SSDP_HEADERS_INITIAL: usize = 32;

/// Requests with more headers than this are treated as unparseable.
pub const MAX_SSDP_HEADERS: usize = 256;

/// Build a multiplexer with every built-in extractor registered.
pub fn default_mux() -> ProtocolMux {
    let mut mux = ProtocolMux::new();
    mux.register(LayerTag::Arp, arp)
        .register(LayerTag::Dhcpv4, dhcpv4)
        .register(LayerTag::Ipv4, ipv4)
        .register(LayerTag::Ipv6, ipv6)
        .register(LayerTag::Udp, ssdp);
    mux
}

/// ARP sender protocol address, when it is a non-zero IPv4 address.
pub fn arp(_source: &HardwareAddr, layer: &Layer) -> Vec<AttributeUpdate> {
    let Layer::Arp(arp) = layer else {
        return Vec::new();
    };

    let Ok(octets) = <[u8; 4]>::try_from(arp.sender_proto_address.as_slice()) else {
        return Vec::new();
    };

    if octets == [0, 0, 0, 0] {
        return Vec::new();
    }

    let ip = std::net::Ipv4Addr::from(octets);
    vec![AttributeUpdate::ip(ip.to_string())]
}

/// Hostname and vendor class from DHCP requests; one update per option present.
pub fn dhcpv4(_source: &HardwareAddr, layer: &Layer) -> Vec<AttributeUpdate> {
    let Layer::Dhcpv4(dhcp) = layer else {
        return Vec::new();
    };

    if dhcp.operation != DhcpOperation::Request {
        return Vec::new();
    }

    dhcp.options
        .iter()
        .filter_map(|option| {
            let value = String::from_utf8_lossy(&option.data).into_owned();
            match option.code {
                DHCP_OPT_CLASS_ID => Some(AttributeUpdate::vendor_hint(value)),
                DHCP_OPT_HOSTNAME => Some(AttributeUpdate::hostname(value)),
                _ => None,
            }
        })
        .collect()
}

pub fn ipv4(_source: &HardwareAddr, layer: &Layer) -> Vec<AttributeUpdate> {
    match layer {
        Layer::Ipv4(ip) if !ip.source.is_unspecified() => {
            vec![AttributeUpdate::ip(ip.source.to_string())]
        }
        _ => Vec::new(),
    }
}

pub fn ipv6(_source: &HardwareAddr, layer: &Layer) -> Vec<AttributeUpdate> {
    match layer {
        Layer::Ipv6(ip) if !ip.source.is_unspecified() => {
            vec![AttributeUpdate::ip(ip.source.to_string())]
        }
        _ => Vec::new(),
    }
}

/// User-Agent from an SSDP request sent to port 1900.
pub fn ssdp(_source: &HardwareAddr, layer: &Layer) -> Vec<AttributeUpdate> {
    let Layer::Udp(udp) = layer else {
        return Vec::new();
    };

    if udp.destination_port != SSDP_PORT {
        return Vec::new();
    }

    match parse_user_agent(&udp.payload) {
        Some(ua) => vec![AttributeUpdate::user_agent(ua)],
        None => Vec::new(),
    }
}

/// Parse `payload` as an HTTP request and return its non-empty User-Agent.
///
/// A request whose header block is not terminated counts as unparseable, as
/// does one with more than [`MAX_SSDP_HEADERS`] headers.
pub fn parse_user_agent(payload: &[u8]) -> Option<String> {
    let mut slots = SSDP_HEADERS_INITIAL;

    loop {
        let mut headers = vec![httparse::EMPTY_HEADER; slots];
        let mut request = httparse::Request::new(&mut headers);

        match request.parse(payload) {
            Ok(httparse::Status::Complete(_)) => return user_agent(request.headers),
            Err(httparse::Error::TooManyHeaders) if slots < MAX_SSDP_HEADERS => {
                slots = (slots * 2).min(MAX_SSDP_HEADERS);
            }
            Ok(httparse::Status::Partial) | Err(_) => return None,
        }
    }
}

fn user_agent(headers: &[httparse::Header<'_>]) -> Option<String> {
    let header = headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("user-agent"))?;

    let value = String::from_utf8_lossy(header.value).trim().to_string();
    (!value.is_empty()).then_some(value)
}

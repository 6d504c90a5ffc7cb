//! Raw Ethernet bytes to `DecodedFrame`.
//!
//! Header views come from `pnet`; ARP and DHCP are parsed by hand so that the
//! address lengths and option list survive exactly as sent. Decoding is
//! best-effort: whatever fails to parse is simply absent from the frame.

use std::net::{Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, Utc};
use pnet::packet::ethernet::{EtherType, EtherTypes, EthernetPacket};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::ipv6::Ipv6Packet;
use pnet::packet::udp::UdpPacket;
use pnet::packet::vlan::VlanPacket;
use pnet::packet::Packet;
use pnet::util::MacAddr;

use crate::frame::{
    ArpLayer, DecodedFrame, DhcpOption, Dhcpv4Layer, EthernetLayer, Ipv4Layer, Ipv6Layer, Layer,
    UdpLayer,
};
use crate::types::HardwareAddr;

pub const DHCP_SERVER_PORT: u16 = 67;
pub const DHCP_CLIENT_PORT: u16 = 68;

/// Fixed BOOTP header preceding the magic cookie
const BOOTP_HEADER_LEN: usize = 236;
const DHCP_MAGIC_COOKIE: [u8; 4] = [99, 130, 83, 99];
const DHCP_OPT_PAD: u8 = 0;
const DHCP_OPT_END: u8 = 255;

const ARP_FIXED_LEN: usize = 8;
const IPV6_HEADER_LEN: usize = 40;
const UDP_HEADER_LEN: usize = 8;

/// Decode an Ethernet II frame captured at `timestamp`.
///
/// A frame too short for an Ethernet header comes back with no layers.
pub fn decode_ethernet(data: &[u8], timestamp: DateTime<Utc>) -> DecodedFrame {
    let mut frame = DecodedFrame::new(timestamp);

    let Some(eth) = EthernetPacket::new(data) else {
        return frame;
    };

    frame.push(Layer::Ethernet(EthernetLayer {
        source: hardware_addr(eth.get_source()),
        destination: hardware_addr(eth.get_destination()),
    }));

    let mut ethertype = eth.get_ethertype();
    let mut payload = eth.payload();

    if ethertype == EtherTypes::Vlan {
        let Some(vlan) = VlanPacket::new(payload) else {
            return frame;
        };
        ethertype = vlan.get_ethertype();
        payload = &payload[VlanPacket::minimum_packet_size()..];
    }

    decode_network(&mut frame, ethertype, payload);
    frame
}

fn hardware_addr(mac: MacAddr) -> HardwareAddr {
    HardwareAddr([mac.0, mac.1, mac.2, mac.3, mac.4, mac.5])
}

fn decode_network(frame: &mut DecodedFrame, ethertype: EtherType, payload: &[u8]) {
    match ethertype {
        EtherTypes::Arp => {
            if let Some(arp) = parse_arp(payload) {
                frame.push(Layer::Arp(arp));
            }
        }
        EtherTypes::Ipv4 => decode_ipv4(frame, payload),
        EtherTypes::Ipv6 => decode_ipv6(frame, payload),
        _ => {}
    }
}

/// ARP with hardware/protocol address lengths taken from the header.
pub fn parse_arp(data: &[u8]) -> Option<ArpLayer> {
    if data.len() < ARP_FIXED_LEN {
        return None;
    }

    let hlen = data[4] as usize;
    let plen = data[5] as usize;
    let operation = u16::from_be_bytes([data[6], data[7]]);

    let body = &data[ARP_FIXED_LEN..];
    if body.len() < 2 * (hlen + plen) {
        return None;
    }

    let (sender_hw, rest) = body.split_at(hlen);
    let (sender_proto, rest) = rest.split_at(plen);
    let (target_hw, rest) = rest.split_at(hlen);
    let target_proto = &rest[..plen];

    Some(ArpLayer {
        operation,
        sender_hw_address: sender_hw.to_vec(),
        sender_proto_address: sender_proto.to_vec(),
        target_hw_address: target_hw.to_vec(),
        target_proto_address: target_proto.to_vec(),
    })
}

fn decode_ipv4(frame: &mut DecodedFrame, data: &[u8]) {
    let Some(ip) = Ipv4Packet::new(data) else {
        return;
    };

    let source: Ipv4Addr = ip.get_source();
    let destination: Ipv4Addr = ip.get_destination();
    frame.push(Layer::Ipv4(Ipv4Layer {
        source,
        destination,
    }));

    let header_len = ip.get_header_length() as usize * 4;
    let total_len = (ip.get_total_length() as usize).min(data.len());
    if header_len < Ipv4Packet::minimum_packet_size() || total_len < header_len {
        return;
    }

    // Non-first fragments carry no UDP header.
    if ip.get_fragment_offset() != 0 {
        return;
    }

    if ip.get_next_level_protocol() == IpNextHeaderProtocols::Udp {
        decode_udp(frame, &data[header_len..total_len]);
    }
}

fn decode_ipv6(frame: &mut DecodedFrame, data: &[u8]) {
    let Some(ip) = Ipv6Packet::new(data) else {
        return;
    };

    let source: Ipv6Addr = ip.get_source();
    let destination: Ipv6Addr = ip.get_destination();
    frame.push(Layer::Ipv6(Ipv6Layer {
        source,
        destination,
    }));

    let end = (IPV6_HEADER_LEN + ip.get_payload_length() as usize).min(data.len());
    if ip.get_next_header() == IpNextHeaderProtocols::Udp {
        decode_udp(frame, &data[IPV6_HEADER_LEN..end]);
    }
}

fn decode_udp(frame: &mut DecodedFrame, data: &[u8]) {
    let Some(udp) = UdpPacket::new(data) else {
        return;
    };

    let end = (udp.get_length() as usize).clamp(UDP_HEADER_LEN, data.len());
    let payload = &data[UDP_HEADER_LEN..end];
    let source_port = udp.get_source();
    let destination_port = udp.get_destination();

    frame.push(Layer::Udp(UdpLayer {
        source_port,
        destination_port,
        payload: payload.to_vec(),
    }));

    let dhcp_port = |p: u16| p == DHCP_SERVER_PORT || p == DHCP_CLIENT_PORT;
    if dhcp_port(source_port) || dhcp_port(destination_port) {
        if let Some(dhcp) = parse_dhcpv4(payload) {
            frame.push(Layer::Dhcpv4(dhcp));
        }
    }
}

/// BOOTP header plus DHCP options.
///
/// A truncated option ends parsing but keeps the options read before it.
pub fn parse_dhcpv4(data: &[u8]) -> Option<Dhcpv4Layer> {
    if data.len() < BOOTP_HEADER_LEN + DHCP_MAGIC_COOKIE.len() {
        return None;
    }

    if data[BOOTP_HEADER_LEN..BOOTP_HEADER_LEN + 4] != DHCP_MAGIC_COOKIE {
        return None;
    }

    let operation = data[0].into();
    let hlen = (data[2] as usize).min(16);
    let client_hw_address = data[28..28 + hlen].to_vec();

    let mut options = Vec::new();
    let mut rest = &data[BOOTP_HEADER_LEN + 4..];
    while let Some((&code, tail)) = rest.split_first() {
        match code {
            DHCP_OPT_PAD => rest = tail,
            DHCP_OPT_END => break,
            _ => {
                let Some((&len, tail)) = tail.split_first() else {
                    break;
                };
                let len = len as usize;
                if tail.len() < len {
                    break;
                }
                options.push(DhcpOption {
                    code,
                    data: tail[..len].to_vec(),
                });
                rest = &tail[len..];
            }
        }
    }

    Some(Dhcpv4Layer {
        operation,
        client_hw_address,
        options,
    })
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::frame::{DhcpOperation, LayerTag};

    #[test]
    fn test_short_frame_has_no_layers() {
        let frame = decode_ethernet(&[0u8; 10], Utc::now());
        assert!(frame.layers.is_empty());
        assert!(frame.source().is_none());
    }

    #[test]
    fn test_decode_arp() {
        let frame = decode_ethernet(&arp_request(SRC, [192, 168, 1, 5]), Utc::now());

        assert_eq!(frame.source(), Some(HardwareAddr(SRC)));
        assert!(frame.ethernet().unwrap().destination.is_group());
        match frame.layer(LayerTag::Arp) {
            Some(Layer::Arp(arp)) => {
                assert_eq!(arp.operation, 1);
                assert_eq!(arp.sender_proto_address, vec![192, 168, 1, 5]);
                assert_eq!(arp.sender_hw_address, SRC.to_vec());
            }
            other => panic!("expected ARP layer, got {:?}", other),
        }
    }

    #[test]
    fn test_arp_keeps_announced_lengths() {
        let mut arp = vec![0x00, 0x01, 0x86, 0xdd, 6, 16, 0x00, 0x01];
        arp.extend_from_slice(&SRC);
        arp.extend_from_slice(&[0xfe; 16]);
        arp.extend_from_slice(&[0; 6]);
        arp.extend_from_slice(&[0; 16]);

        let parsed = parse_arp(&arp).unwrap();
        assert_eq!(parsed.sender_proto_address.len(), 16);
        assert!(parse_arp(&arp[..20]).is_none());
    }

    #[test]
    fn test_decode_dhcp_request() {
        let frame = decode_ethernet(
            &dhcp_request_frame(&[(53, &[3]), (60, b"MSFT 5.0"), (12, b"laptop1")]),
            Utc::now(),
        );

        assert!(frame.has_layer(LayerTag::Ipv4));
        assert!(frame.has_layer(LayerTag::Udp));
        match frame.layer(LayerTag::Dhcpv4) {
            Some(Layer::Dhcpv4(dhcp)) => {
                assert_eq!(dhcp.operation, DhcpOperation::Request);
                assert_eq!(dhcp.client_hw_address, SRC.to_vec());
                assert_eq!(dhcp.options.len(), 3);
                assert_eq!(dhcp.option(12).unwrap().data, b"laptop1");
                assert_eq!(dhcp.option(60).unwrap().data, b"MSFT 5.0");
            }
            other => panic!("expected DHCPv4 layer, got {:?}", other),
        }
    }

    #[test]
    fn test_dhcp_requires_magic_cookie() {
        let mut bootp = dhcp(1, SRC, &[(12, b"host")]);
        bootp[236] = 0;
        assert!(parse_dhcpv4(&bootp).is_none());
        assert!(parse_dhcpv4(&bootp[..100]).is_none());
    }

    #[test]
    fn test_dhcp_truncated_option_keeps_earlier_options() {
        let mut bootp = dhcp(1, SRC, &[(12, b"host")]);
        bootp.pop();
        bootp.extend_from_slice(&[60, 20, b'a', b'b']);

        let parsed = parse_dhcpv4(&bootp).unwrap();
        assert_eq!(parsed.options.len(), 1);
        assert_eq!(parsed.options[0].code, 12);
    }

    #[test]
    fn test_dhcp_pad_options_skipped() {
        let mut bootp = dhcp(1, SRC, &[]);
        bootp.pop();
        bootp.extend_from_slice(&[0, 0, 12, 3, b'a', b'b', b'c', 255, 12, 1, b'z']);

        let parsed = parse_dhcpv4(&bootp).unwrap();
        assert_eq!(parsed.options.len(), 1);
        assert_eq!(parsed.options[0].data, b"abc");
    }

    #[test]
    fn test_decode_ssdp_udp() {
        let payload = b"M-SEARCH * HTTP/1.1\r\nUSER-AGENT: test\r\n\r\n";
        let frame = decode_ethernet(&ssdp_frame(1900, payload), Utc::now());

        match frame.layer(LayerTag::Udp) {
            Some(Layer::Udp(udp)) => {
                assert_eq!(udp.destination_port, 1900);
                assert_eq!(udp.payload, payload.to_vec());
            }
            other => panic!("expected UDP layer, got {:?}", other),
        }
        assert!(!frame.has_layer(LayerTag::Dhcpv4));
    }

    #[test]
    fn test_ethernet_padding_not_in_udp_payload() {
        let mut raw = ssdp_frame(1900, b"hi");
        raw.extend_from_slice(&[0; 12]);

        let frame = decode_ethernet(&raw, Utc::now());
        match frame.layer(LayerTag::Udp) {
            Some(Layer::Udp(udp)) => assert_eq!(udp.payload, b"hi".to_vec()),
            other => panic!("expected UDP layer, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_ipv6_udp() {
        let mut src = [0u8; 16];
        src[0] = 0xfe;
        src[1] = 0x80;
        src[15] = 0x01;
        let mut dst = [0u8; 16];
        dst[0] = 0xff;
        dst[1] = 0x02;
        dst[15] = 0x0c;

        let udp = udp(50000, 1900, b"x");
        let raw = ethernet([0x33, 0x33, 0, 0, 0, 0x0c], SRC, 0x86dd, &ipv6(src, dst, 17, &udp));
        let frame = decode_ethernet(&raw, Utc::now());

        match frame.layer(LayerTag::Ipv6) {
            Some(Layer::Ipv6(ip)) => assert_eq!(ip.source.to_string(), "fe80::1"),
            other => panic!("expected IPv6 layer, got {:?}", other),
        }
        assert!(frame.has_layer(LayerTag::Udp));
    }

    #[test]
    fn test_vlan_tagged_frame() {
        let arp = arp_request(SRC, [10, 0, 0, 2]);
        let mut inner = vec![0x00, 0x0a, 0x08, 0x06];
        inner.extend_from_slice(&arp[14..]);
        let raw = ethernet(BROADCAST, SRC, 0x8100, &inner);

        let frame = decode_ethernet(&raw, Utc::now());
        assert!(frame.has_layer(LayerTag::Arp));
    }

    #[test]
    fn test_unknown_ethertype_keeps_ethernet_only() {
        let raw = ethernet(BROADCAST, SRC, 0x88cc, &[1, 2, 3, 4]);
        let frame = decode_ethernet(&raw, Utc::now());
        assert_eq!(frame.layers.len(), 1);
        assert!(frame.has_layer(LayerTag::Ethernet));
    }
}

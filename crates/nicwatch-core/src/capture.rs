//! Live capture producers.
//!
//! Each monitored interface gets its own OS thread reading from a
//! non-promiscuous `pnet` datalink channel. Only group-addressed frames with a
//! real source are forwarded into the shared frame queue.

use std::io::ErrorKind;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::Utc;
use pnet::datalink::{self, Channel, Config, NetworkInterface};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::decode::decode_ethernet;
use crate::error::CaptureError;
use crate::frame::DecodedFrame;
use crate::types::HardwareAddr;

/// Name that selects every interface on the host
pub const ALL_INTERFACES: &str = "all";

/// Read timeout so a producer notices a closed queue while the link is quiet
const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Interface details for listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac: Option<HardwareAddr>,
    pub is_up: bool,
    pub is_loopback: bool,
    pub addresses: Vec<String>,
}

impl From<&NetworkInterface> for InterfaceSummary {
    fn from(iface: &NetworkInterface) -> Self {
        Self {
            name: iface.name.clone(),
            mac: iface
                .mac
                .map(|m| HardwareAddr([m.0, m.1, m.2, m.3, m.4, m.5])),
            is_up: iface.is_up(),
            is_loopback: iface.is_loopback(),
            addresses: iface.ips.iter().map(|ip| ip.to_string()).collect(),
        }
    }
}

/// Every interface on the host.
pub fn list_interfaces() -> Vec<InterfaceSummary> {
    datalink::interfaces().iter().map(InterfaceSummary::from).collect()
}

/// Map requested names to host interfaces; `["all"]` selects every one.
pub fn resolve_interfaces(requested: &[String]) -> Result<Vec<NetworkInterface>, CaptureError> {
    select_interfaces(datalink::interfaces(), requested)
}

fn select_interfaces(
    available: Vec<NetworkInterface>,
    requested: &[String],
) -> Result<Vec<NetworkInterface>, CaptureError> {
    if requested.is_empty() || (requested.len() == 1 && requested[0] == ALL_INTERFACES) {
        return Ok(available);
    }

    requested
        .iter()
        .map(|name| {
            available
                .iter()
                .find(|iface| &iface.name == name)
                .cloned()
                .ok_or_else(|| CaptureError::InterfaceNotFound(name.clone()))
        })
        .collect()
}

/// Live capture forwards only group-addressed frames from a real source.
pub fn accept_live_frame(frame: &DecodedFrame) -> bool {
    match frame.ethernet() {
        Some(eth) => !eth.source.is_zero() && eth.destination.is_group(),
        None => false,
    }
}

fn is_transient(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
    )
}

/// Open `iface` and start forwarding frames on a dedicated thread.
///
/// The thread blocks on `frames` when the queue is full and exits when the
/// receiver is dropped or the interface returns a read error.
pub fn spawn_capture(
    iface: NetworkInterface,
    frames: mpsc::Sender<DecodedFrame>,
) -> Result<JoinHandle<()>, CaptureError> {
    let config = Config {
        promiscuous: false,
        read_timeout: Some(READ_TIMEOUT),
        ..Default::default()
    };

    let mut rx = match datalink::channel(&iface, config) {
        Ok(Channel::Ethernet(_, rx)) => rx,
        Ok(_) => return Err(CaptureError::UnsupportedChannel(iface.name.clone())),
        Err(source) => {
            return Err(CaptureError::Open {
                interface: iface.name.clone(),
                source,
            })
        }
    };

    let name = iface.name.clone();
    let handle = thread::Builder::new()
        .name(format!("capture-{}", name))
        .spawn(move || {
            info!("Listening on {}", name);

            loop {
                if frames.is_closed() {
                    break;
                }

                match rx.next() {
                    Ok(data) => {
                        let frame = decode_ethernet(data, Utc::now());
                        if !accept_live_frame(&frame) {
                            continue;
                        }
                        if frames.blocking_send(frame).is_err() {
                            break;
                        }
                    }
                    Err(e) if is_transient(e.kind()) => continue,
                    Err(e) => {
                        warn!("Capture on {} failed: {}", name, e);
                        break;
                    }
                }
            }

            debug!("Capture on {} stopped", name);
        })
        .map_err(|source| CaptureError::Open {
            interface: iface.name.clone(),
            source,
        })?;

    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::fixtures::*;

    fn iface(name: &str, index: u32) -> NetworkInterface {
        NetworkInterface {
            name: name.to_string(),
            description: String::new(),
            index,
            mac: None,
            ips: Vec::new(),
            flags: 0,
        }
    }

    #[test]
    fn test_select_all_interfaces() {
        let available = vec![iface("lo", 1), iface("eth0", 2)];
        let selected = select_interfaces(available, &["all".to_string()]).unwrap();
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn test_select_named_interfaces() {
        let available = vec![iface("lo", 1), iface("eth0", 2), iface("wlan0", 3)];
        let selected =
            select_interfaces(available, &["wlan0".to_string(), "eth0".to_string()]).unwrap();
        let names: Vec<&str> = selected.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["wlan0", "eth0"]);
    }

    #[test]
    fn test_select_unknown_interface() {
        let available = vec![iface("eth0", 2)];
        let err = select_interfaces(available, &["eth9".to_string()]).unwrap_err();
        assert!(matches!(err, CaptureError::InterfaceNotFound(ref n) if n == "eth9"));
    }

    #[test]
    fn test_live_filter_keeps_broadcast_and_multicast() {
        let broadcast = decode_ethernet(&arp_request(SRC, [10, 0, 0, 1]), Utc::now());
        assert!(accept_live_frame(&broadcast));

        let multicast = decode_ethernet(&ssdp_frame(1900, b"x"), Utc::now());
        assert!(accept_live_frame(&multicast));
    }

    #[test]
    fn test_live_filter_drops_unicast_and_zero_source() {
        let unicast = ethernet([0x00, 0x11, 0x22, 0x33, 0x44, 0x55], SRC, 0x0800, &[]);
        assert!(!accept_live_frame(&decode_ethernet(&unicast, Utc::now())));

        let no_source = ethernet(BROADCAST, [0; 6], 0x0806, &[]);
        assert!(!accept_live_frame(&decode_ethernet(&no_source, Utc::now())));

        assert!(!accept_live_frame(&DecodedFrame::new(Utc::now())));
    }

    #[test]
    fn test_interface_summary_from_pnet() {
        let summary = InterfaceSummary::from(&iface("eth0", 2));
        assert_eq!(summary.name, "eth0");
        assert!(summary.mac.is_none());
        assert!(!summary.is_up);
    }
}

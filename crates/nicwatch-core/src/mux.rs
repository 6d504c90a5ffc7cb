//! Protocol multiplexer.
//!
//! Maps a layer tag to exactly one extractor and fans a decoded frame out to
//! every extractor whose tag is present in it. Dispatch is pure: it returns
//! the attribute updates and leaves applying them to the caller.

use std::collections::HashMap;
use std::fmt;

use crate::frame::{DecodedFrame, Layer, LayerTag};
use crate::types::{AttributeUpdate, HardwareAddr};

/// Reads one decoded layer and reports attribute updates for the source address.
///
/// Implementations must not block or perform I/O, and must return an empty
/// vector for content they cannot make sense of.
pub trait Extractor: Send + Sync {
    fn extract(&self, source: &HardwareAddr, layer: &Layer) -> Vec<AttributeUpdate>;
}

impl<F> Extractor for F
where
    F: Fn(&HardwareAddr, &Layer) -> Vec<AttributeUpdate> + Send + Sync,
{
    fn extract(&self, source: &HardwareAddr, layer: &Layer) -> Vec<AttributeUpdate> {
        self(source, layer)
    }
}

/// Dispatch table from layer tag to extractor.
#[derive(Default)]
pub struct ProtocolMux {
    extractors: HashMap<LayerTag, Box<dyn Extractor>>,
}

impl ProtocolMux {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `tag` with `extractor`, replacing any previous registration.
    pub fn register<E>(&mut self, tag: LayerTag, extractor: E) -> &mut Self
    where
        E: Extractor + 'static,
    {
        self.extractors.insert(tag, Box::new(extractor));
        self
    }

    pub fn is_registered(&self, tag: LayerTag) -> bool {
        self.extractors.contains_key(&tag)
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// Run every matching extractor over the frame and collect their updates.
    ///
    /// Frames without a link-layer source produce nothing. The order of
    /// updates across different tags is not meaningful.
    pub fn dispatch(&self, frame: &DecodedFrame) -> Vec<AttributeUpdate> {
        let Some(source) = frame.source() else {
            return Vec::new();
        };

        let mut updates = Vec::new();
        for (tag, extractor) in &self.extractors {
            if let Some(layer) = frame.layer(*tag) {
                updates.extend(extractor.extract(&source, layer));
            }
        }
        updates
    }
}

impl fmt::Debug for ProtocolMux {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&LayerTag> = self.extractors.keys().collect();
        tags.sort();
        f.debug_struct("ProtocolMux").field("tags", &tags).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{EthernetLayer, Ipv4Layer, UdpLayer};
    use chrono::Utc;
    use std::net::Ipv4Addr;

    fn frame_with(layers: Vec<Layer>) -> DecodedFrame {
        let mut frame = DecodedFrame::new(Utc::now()).with_layer(Layer::Ethernet(EthernetLayer {
            source: "aa:bb:cc:dd:ee:ff".parse().unwrap(),
            destination: "ff:ff:ff:ff:ff:ff".parse().unwrap(),
        }));
        for layer in layers {
            frame.push(layer);
        }
        frame
    }

    fn ipv4_layer() -> Layer {
        Layer::Ipv4(Ipv4Layer {
            source: Ipv4Addr::new(10, 0, 0, 7),
            destination: Ipv4Addr::BROADCAST,
        })
    }

    #[test]
    fn test_dispatch_invokes_matching_extractor() {
        let mut mux = ProtocolMux::new();
        mux.register(LayerTag::Ipv4, |_: &HardwareAddr, _: &Layer| {
            vec![AttributeUpdate::ip("10.0.0.7")]
        });

        let updates = mux.dispatch(&frame_with(vec![ipv4_layer()]));
        assert_eq!(updates, vec![AttributeUpdate::ip("10.0.0.7")]);
    }

    #[test]
    fn test_dispatch_passes_frame_source() {
        let mut mux = ProtocolMux::new();
        mux.register(LayerTag::Ipv4, |source: &HardwareAddr, _: &Layer| {
            vec![AttributeUpdate::hostname(source.to_string())]
        });

        let updates = mux.dispatch(&frame_with(vec![ipv4_layer()]));
        assert_eq!(updates[0].value, "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn test_register_last_write_wins() {
        let mut mux = ProtocolMux::new();
        mux.register(LayerTag::Ipv4, |_: &HardwareAddr, _: &Layer| {
            vec![AttributeUpdate::ip("first")]
        });
        mux.register(LayerTag::Ipv4, |_: &HardwareAddr, _: &Layer| {
            vec![AttributeUpdate::ip("second")]
        });

        assert_eq!(mux.len(), 1);
        let updates = mux.dispatch(&frame_with(vec![ipv4_layer()]));
        assert_eq!(updates, vec![AttributeUpdate::ip("second")]);
    }

    #[test]
    fn test_frame_without_registered_tags_is_ignored() {
        let mut mux = ProtocolMux::new();
        mux.register(LayerTag::Arp, |_: &HardwareAddr, _: &Layer| {
            vec![AttributeUpdate::ip("unexpected")]
        });

        let frame = frame_with(vec![Layer::Udp(UdpLayer {
            source_port: 5353,
            destination_port: 5353,
            payload: Vec::new(),
        })]);
        assert!(mux.dispatch(&frame).is_empty());
    }

    #[test]
    fn test_frame_without_source_is_ignored() {
        let mut mux = ProtocolMux::new();
        mux.register(LayerTag::Ipv4, |_: &HardwareAddr, _: &Layer| {
            vec![AttributeUpdate::ip("10.0.0.7")]
        });

        let frame = DecodedFrame::new(Utc::now()).with_layer(ipv4_layer());
        assert!(mux.dispatch(&frame).is_empty());
    }

    #[test]
    fn test_multiple_tags_all_dispatched() {
        let mut mux = ProtocolMux::new();
        mux.register(LayerTag::Ipv4, |_: &HardwareAddr, _: &Layer| {
            vec![AttributeUpdate::ip("10.0.0.7")]
        })
        .register(LayerTag::Udp, |_: &HardwareAddr, _: &Layer| {
            vec![AttributeUpdate::user_agent("agent")]
        });

        let frame = frame_with(vec![
            ipv4_layer(),
            Layer::Udp(UdpLayer {
                source_port: 1,
                destination_port: 2,
                payload: Vec::new(),
            }),
        ]);
        let mut updates = mux.dispatch(&frame);
        updates.sort_by(|a, b| a.value.cmp(&b.value));
        assert_eq!(
            updates,
            vec![
                AttributeUpdate::ip("10.0.0.7"),
                AttributeUpdate::user_agent("agent")
            ]
        );
    }
}

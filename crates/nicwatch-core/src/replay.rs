//! Pcap file replay.
//!
//! Reads a classic pcap capture and feeds every frame, stamped with its
//! capture time, into the frame queue. Unlike live capture no group-bit
//! filtering is applied.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use pcap_file::pcap::PcapReader;
use pcap_file::DataLink;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::decode::decode_ethernet;
use crate::error::{ReplayError, Result};
use crate::frame::DecodedFrame;

/// Replay `path` into `frames`, blocking while the queue is full.
///
/// Returns the number of frames sent. Stops early without error if the
/// consumer goes away. Must not be called from an async context; see
/// [`spawn_replay`].
pub fn replay_file(path: &Path, frames: &mpsc::Sender<DecodedFrame>) -> Result<u64> {
    let file = File::open(path).map_err(|e| ReplayError::Open {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let mut reader = PcapReader::new(BufReader::new(file)).map_err(|e| ReplayError::Open {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let datalink = reader.header().datalink;
    if datalink != DataLink::ETHERNET {
        return Err(ReplayError::UnsupportedLinkType(format!("{:?}", datalink)).into());
    }

    info!("Replaying {}", path.display());

    let mut sent = 0u64;
    while let Some(packet) = reader.next_packet() {
        let packet = packet.map_err(|e| ReplayError::Read {
            index: sent,
            message: e.to_string(),
        })?;

        let timestamp = DateTime::<Utc>::from_timestamp(
            packet.timestamp.as_secs() as i64,
            packet.timestamp.subsec_nanos(),
        )
        .unwrap_or_default();

        let frame = decode_ethernet(&packet.data, timestamp);
        if frames.blocking_send(frame).is_err() {
            debug!("Frame queue closed after {} frame(s), stopping replay", sent);
            break;
        }
        sent += 1;
    }

    info!("Replay of {} finished: {} frame(s)", path.display(), sent);
    Ok(sent)
}

/// Run [`replay_file`] on the blocking thread pool.
///
/// The sender is dropped when the replay ends, which closes the feed once no
/// other producer holds it.
pub fn spawn_replay(path: PathBuf, frames: mpsc::Sender<DecodedFrame>) -> JoinHandle<Result<u64>> {
    tokio::task::spawn_blocking(move || replay_file(&path, &frames))
}

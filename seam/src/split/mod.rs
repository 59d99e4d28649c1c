//! Cross-half state synchronization.
//!
//! The central half detects changes to its four state blocks and pushes full
//! snapshots to the peripheral; the peripheral validates and merges them.
//! There is no delivery acknowledgment: a periodic forced resync bounds the
//! staleness window after a dropped packet.

pub mod central;
/// Common abstraction layer of split transport drivers
pub mod driver;
pub mod peripheral;

use seam_types::config::UserConfig;
use seam_types::runtime::RuntimeState;
use seam_types::text::{AutocorrectText, TextLog};
use seam_types::wire::WireBlock;

/// Maximum payload of a single sync packet, shared by all block types.
pub const SYNC_PAYLOAD_MAX_SIZE: usize = 64;

// Every block must fit the transport payload. Checked here once, at compile
// time, so an oversize payload cannot be a runtime error.
const _: () = {
    assert!(RuntimeState::WIRE_SIZE <= SYNC_PAYLOAD_MAX_SIZE);
    assert!(UserConfig::WIRE_SIZE <= SYNC_PAYLOAD_MAX_SIZE);
    assert!(TextLog::WIRE_SIZE <= SYNC_PAYLOAD_MAX_SIZE);
    assert!(AutocorrectText::WIRE_SIZE <= SYNC_PAYLOAD_MAX_SIZE);
};

/// One channel per replicated block. The numeric values tag packets on the
/// wire; only their uniqueness matters, guaranteed here by the enum itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SyncChannel {
    RuntimeState = 0,
    Config = 1,
    Keylog = 2,
    Autocorrect = 3,
}

impl SyncChannel {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(SyncChannel::RuntimeState),
            1 => Some(SyncChannel::Config),
            2 => Some(SyncChannel::Keylog),
            3 => Some(SyncChannel::Autocorrect),
            _ => None,
        }
    }

    /// The exact payload size this channel carries. A received packet whose
    /// length differs is discarded without touching local state.
    pub fn expected_size(&self) -> usize {
        match self {
            SyncChannel::RuntimeState => RuntimeState::WIRE_SIZE,
            SyncChannel::Config => UserConfig::WIRE_SIZE,
            SyncChannel::Keylog => TextLog::WIRE_SIZE,
            SyncChannel::Autocorrect => AutocorrectText::WIRE_SIZE,
        }
    }
}

/// A single sync message: channel tag, claimed payload length, payload.
/// Blocks are always sent whole, never fragmented.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SyncPacket {
    pub channel: u8,
    pub len: u8,
    pub data: [u8; SYNC_PAYLOAD_MAX_SIZE],
}

impl SyncPacket {
    /// Build a packet from an already-encoded block snapshot.
    pub fn from_payload(channel: SyncChannel, payload: &[u8]) -> Self {
        debug_assert!(payload.len() <= SYNC_PAYLOAD_MAX_SIZE);
        let mut data = [0u8; SYNC_PAYLOAD_MAX_SIZE];
        data[..payload.len()].copy_from_slice(payload);
        Self {
            channel: channel as u8,
            len: payload.len() as u8,
            data,
        }
    }

    /// The claimed payload, clamped to the buffer.
    pub fn payload(&self) -> &[u8] {
        let len = (self.len as usize).min(SYNC_PAYLOAD_MAX_SIZE);
        &self.data[..len]
    }
}

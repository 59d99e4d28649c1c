//! The abstracted driver layer of the split link.
//!
//! How bytes physically move between the halves (UART, PIO, BLE, ...) is the
//! integration's concern; the sync core only needs a reader and a writer of
//! whole [`SyncPacket`]s.

use super::SyncPacket;

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SplitDriverError {
    SerialError,
    EmptyMessage,
    DeserializeError,
    SerializeError,
    /// The link cannot accept a packet right now. The scheduler retries on
    /// its next tick; nothing is lost but one tick of freshness.
    Busy,
    Disconnected,
}

/// Sync packet reader from the other half.
pub trait SyncReader {
    async fn read(&mut self) -> Result<SyncPacket, SplitDriverError>;
}

/// Sync packet writer to the other half.
pub trait SyncWriter {
    /// Returns the number of payload bytes accepted by the link.
    async fn write(&mut self, packet: &SyncPacket) -> Result<usize, SplitDriverError>;
}

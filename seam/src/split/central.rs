//! Central-side sync scheduler.
//!
//! Once per housekeeping tick the scheduler rebuilds the runtime block from
//! live host queries, then for each of the four blocks independently: encode,
//! compare byte-wise against the last-sent snapshot, force a resend when the
//! forced-resync interval has elapsed, and emit at most one packet per block.
//! The snapshot and the last-sent timestamp advance only when the driver
//! accepts the packet, so a refused send is retried naturally on the next
//! tick. There is no acknowledgment from the peer; the forced resync bounds
//! staleness after a dropped packet, it does not prove delivery.

use core::cell::RefCell;

use embassy_futures::select::{Either, select};
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Instant, Timer};
use seam_types::config::CONFIG_WIRE_SIZE;
use seam_types::runtime::{RUNTIME_WIRE_SIZE, RuntimeState};
use seam_types::text::{AUTOCORRECT_WIRE_SIZE, KEYLOG_LEN};
use seam_types::wire::encode_to_array;

use super::driver::{SplitDriverError, SyncWriter};
use super::{SyncChannel, SyncPacket};
use crate::RawMutex;
use crate::hooks::HostQueries;
use crate::menu::{MenuInput, MenuNavigator};
use crate::state::{LinkState, SharedState};

/// Unconditional resend period per block. A tunable staleness bound, not a
/// correctness guarantee.
pub const FORCED_RESYNC_INTERVAL: Duration = Duration::from_millis(500);

/// Housekeeping tick period of the central run loop.
pub const SYNC_TICK_INTERVAL: Duration = Duration::from_millis(5);

/// Per-block send bookkeeping: the encoded form of the last accepted send
/// plus its timestamp. Comparing encodings makes the dirty check literally
/// byte-wise, immune to NaN comparison quirks in float fields.
struct BlockSync<const N: usize> {
    channel: SyncChannel,
    snapshot: [u8; N],
    last_sent: Option<Instant>,
}

impl<const N: usize> BlockSync<N> {
    fn new(channel: SyncChannel) -> Self {
        Self {
            channel,
            snapshot: [0; N],
            last_sent: None,
        }
    }

    fn due(&self, current: &[u8; N], now: Instant) -> bool {
        match self.last_sent {
            None => true,
            Some(at) => self.snapshot != *current || now - at >= FORCED_RESYNC_INTERVAL,
        }
    }

    /// Send the block if it is due. `Ok(true)` means a packet was accepted
    /// and the snapshot advanced.
    async fn sync<W: SyncWriter>(
        &mut self,
        current: &[u8; N],
        now: Instant,
        writer: &mut W,
    ) -> Result<bool, SplitDriverError> {
        if !self.due(current, now) {
            return Ok(false);
        }
        let packet = SyncPacket::from_payload(self.channel, current);
        writer.write(&packet).await?;
        self.snapshot = *current;
        self.last_sent = Some(now);
        Ok(true)
    }
}

/// What a tick did, for the run loop to act on.
#[derive(Debug, Default, Clone, Copy)]
pub struct TickReport {
    /// Packets accepted by the driver this tick (0..=4).
    pub sent: usize,
    /// The config block differs from its last persisted form and should be
    /// written back to storage. Reported even while the link is down.
    pub save_config: bool,
}

/// The central half's scheduler state.
pub struct CentralSync<'a, Q: HostQueries> {
    state: &'a RefCell<SharedState>,
    link: &'a LinkState,
    queries: Q,
    runtime: BlockSync<RUNTIME_WIRE_SIZE>,
    config: BlockSync<CONFIG_WIRE_SIZE>,
    keylog: BlockSync<KEYLOG_LEN>,
    autocorrect: BlockSync<AUTOCORRECT_WIRE_SIZE>,
    config_persisted: [u8; CONFIG_WIRE_SIZE],
}

impl<'a, Q: HostQueries> CentralSync<'a, Q> {
    pub fn new(state: &'a RefCell<SharedState>, link: &'a LinkState, queries: Q) -> Self {
        // The boot-loaded config counts as persisted; only a later mutation
        // triggers a flash write.
        let config_persisted = encode_to_array(&state.borrow().config);
        Self {
            state,
            link,
            queries,
            runtime: BlockSync::new(SyncChannel::RuntimeState),
            config: BlockSync::new(SyncChannel::Config),
            keylog: BlockSync::new(SyncChannel::Keylog),
            autocorrect: BlockSync::new(SyncChannel::Autocorrect),
            config_persisted,
        }
    }

    /// Run one housekeeping tick now.
    pub async fn tick<W: SyncWriter>(&mut self, writer: &mut W) -> TickReport {
        self.tick_at(Instant::now(), writer).await
    }

    /// Tick with an explicit timestamp. Exposed so tests can drive the
    /// forced-resync clock deterministically.
    pub async fn tick_at<W: SyncWriter>(&mut self, now: Instant, writer: &mut W) -> TickReport {
        let (runtime_bytes, config_bytes, keylog_bytes, autocorrect_bytes) = {
            let mut state = self.state.borrow_mut();
            refresh_runtime(&mut state.runtime, &self.queries);
            (
                encode_to_array::<_, RUNTIME_WIRE_SIZE>(&state.runtime),
                encode_to_array::<_, CONFIG_WIRE_SIZE>(&state.config),
                encode_to_array::<_, KEYLOG_LEN>(&state.keylog),
                encode_to_array::<_, AUTOCORRECT_WIRE_SIZE>(&state.autocorrect),
            )
        };

        let mut report = TickReport::default();

        if config_bytes != self.config_persisted {
            self.config_persisted = config_bytes;
            report.save_config = true;
        }

        // All sync activity waits for the link; changes keep accumulating in
        // the blocks and go out on the first connected tick.
        if !self.link.is_connected() {
            return report;
        }

        match self.runtime.sync(&runtime_bytes, now, writer).await {
            Ok(true) => report.sent += 1,
            Ok(false) => {}
            Err(e) => debug!("runtime state sync deferred: {:?}", e),
        }
        match self.config.sync(&config_bytes, now, writer).await {
            Ok(true) => report.sent += 1,
            Ok(false) => {}
            Err(e) => debug!("config sync deferred: {:?}", e),
        }
        match self.keylog.sync(&keylog_bytes, now, writer).await {
            Ok(true) => report.sent += 1,
            Ok(false) => {}
            Err(e) => debug!("keylog sync deferred: {:?}", e),
        }
        match self.autocorrect.sync(&autocorrect_bytes, now, writer).await {
            Ok(true) => report.sent += 1,
            Ok(false) => {}
            Err(e) => debug!("autocorrect sync deferred: {:?}", e),
        }

        report
    }
}

/// Rebuild the replicated runtime block from live host queries. The menu
/// sub-block is owned by the navigator and deliberately left untouched.
fn refresh_runtime(runtime: &mut RuntimeState, queries: &impl HostQueries) {
    runtime.audio = queries.audio();
    runtime.flags = queries.flags();
    runtime.unicode_mode = queries.unicode_mode();
    runtime.unicode_typing_mode = queries.unicode_typing_mode();
    runtime.mods = queries.mods();
    runtime.layer_state = queries.layer_state();
    runtime.default_layer = queries.default_layer();
    runtime.leds = queries.leds();
    runtime.wpm = queries.wpm();
}

/// Run the central sync service: menu input handling, menu idle timeout,
/// block replication and config persistence, on a single cooperative loop.
#[allow(clippy::too_many_arguments)]
pub async fn run_split_central<
    Q: HostQueries,
    W: SyncWriter,
    #[cfg(feature = "storage")] F: embedded_storage_async::nor_flash::NorFlash,
    const INPUT_N: usize,
>(
    state: &RefCell<SharedState>,
    link: &LinkState,
    queries: Q,
    mut writer: W,
    navigator: &mut MenuNavigator,
    input: &Channel<RawMutex, MenuInput, INPUT_N>,
    #[cfg(feature = "storage")] storage: &mut crate::storage::Storage<F>,
) -> ! {
    let mut central = CentralSync::new(state, link, queries);
    info!("split central sync started");
    loop {
        match select(input.receive(), Timer::after(SYNC_TICK_INTERVAL)).await {
            Either::First(event) => {
                let mut state = state.borrow_mut();
                navigator.handle(&mut state, event, Instant::now());
            }
            Either::Second(_) => {
                {
                    let mut state = state.borrow_mut();
                    navigator.poll_timeout(&mut state, Instant::now());
                }
                let report = central.tick(&mut writer).await;
                #[cfg(feature = "storage")]
                if report.save_config {
                    let config = state.borrow().config;
                    if let Err(e) = storage.save_config(&config).await {
                        error!("config save failed: {:?}", e);
                    }
                }
                #[cfg(not(feature = "storage"))]
                let _ = report;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use embassy_futures::block_on;
    use seam_types::config::UserConfig;
    use seam_types::runtime::{AudioFlags, InternalFlags, LedIndicator, ModsSnapshot};
    use seam_types::wire::WireBlock;

    use super::*;

    struct FixedQueries {
        wpm: u8,
    }

    impl HostQueries for FixedQueries {
        fn mods(&self) -> ModsSnapshot {
            ModsSnapshot::default()
        }
        fn layer_state(&self) -> u32 {
            1
        }
        fn default_layer(&self) -> u32 {
            1
        }
        fn leds(&self) -> LedIndicator {
            LedIndicator::new()
        }
        fn wpm(&self) -> u8 {
            self.wpm
        }
        fn audio(&self) -> AudioFlags {
            AudioFlags::new()
        }
        fn flags(&self) -> InternalFlags {
            InternalFlags::new()
        }
    }

    /// Driver stub collecting accepted packets, optionally refusing writes.
    struct RecordingWriter {
        packets: Vec<SyncPacket>,
        refuse: bool,
    }

    impl RecordingWriter {
        fn new() -> Self {
            Self {
                packets: Vec::new(),
                refuse: false,
            }
        }
    }

    impl SyncWriter for RecordingWriter {
        async fn write(&mut self, packet: &SyncPacket) -> Result<usize, SplitDriverError> {
            if self.refuse {
                return Err(SplitDriverError::Busy);
            }
            self.packets.push(*packet);
            Ok(packet.len as usize)
        }
    }

    fn connected_link() -> LinkState {
        let link = LinkState::new();
        link.set_connected(true);
        link
    }

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    #[test]
    fn first_tick_sends_every_block() {
        let state = RefCell::new(SharedState::new());
        let link = connected_link();
        let mut central = CentralSync::new(&state, &link, FixedQueries { wpm: 40 });
        let mut writer = RecordingWriter::new();

        let report = block_on(central.tick_at(at(0), &mut writer));
        assert_eq!(report.sent, 4);
        assert!(!report.save_config);
        assert_eq!(writer.packets.len(), 4);
    }

    #[test]
    fn quiet_tick_sends_nothing() {
        let state = RefCell::new(SharedState::new());
        let link = connected_link();
        let mut central = CentralSync::new(&state, &link, FixedQueries { wpm: 40 });
        let mut writer = RecordingWriter::new();

        block_on(central.tick_at(at(0), &mut writer));
        writer.packets.clear();

        let report = block_on(central.tick_at(at(1), &mut writer));
        assert_eq!(report.sent, 0);
        assert!(writer.packets.is_empty());
    }

    #[test]
    fn config_bit_flip_sends_exactly_one_forty_byte_packet() {
        let state = RefCell::new(SharedState::new());
        let link = connected_link();
        let mut central = CentralSync::new(&state, &link, FixedQueries { wpm: 40 });
        let mut writer = RecordingWriter::new();

        block_on(central.tick_at(at(0), &mut writer));
        writer.packets.clear();

        {
            let mut state = state.borrow_mut();
            let enabled = state.config.rgb.flags.enabled();
            state.config.rgb.flags.set_enabled(!enabled);
        }
        let report = block_on(central.tick_at(at(1), &mut writer));
        assert_eq!(report.sent, 1);
        assert!(report.save_config);
        assert_eq!(writer.packets.len(), 1);
        let packet = &writer.packets[0];
        assert_eq!(packet.channel, SyncChannel::Config as u8);
        assert_eq!(packet.len as usize, UserConfig::WIRE_SIZE);
        assert_eq!(packet.len, 40);
    }

    #[test]
    fn forced_resync_fires_without_changes() {
        let state = RefCell::new(SharedState::new());
        let link = connected_link();
        let mut central = CentralSync::new(&state, &link, FixedQueries { wpm: 40 });
        let mut writer = RecordingWriter::new();

        block_on(central.tick_at(at(0), &mut writer));
        writer.packets.clear();

        // Just under the interval: still quiet.
        let report = block_on(central.tick_at(at(499), &mut writer));
        assert_eq!(report.sent, 0);

        // At the interval, every block goes out again, unchanged or not.
        let report = block_on(central.tick_at(at(500), &mut writer));
        assert_eq!(report.sent, 4);
    }

    #[test]
    fn refused_send_retries_on_next_tick() {
        let state = RefCell::new(SharedState::new());
        let link = connected_link();
        let mut central = CentralSync::new(&state, &link, FixedQueries { wpm: 40 });
        let mut writer = RecordingWriter::new();

        writer.refuse = true;
        let report = block_on(central.tick_at(at(0), &mut writer));
        assert_eq!(report.sent, 0);

        // Link accepts again: the stale snapshots make every block due.
        writer.refuse = false;
        let report = block_on(central.tick_at(at(1), &mut writer));
        assert_eq!(report.sent, 4);
    }

    #[test]
    fn disconnected_link_defers_sync_but_not_persistence() {
        let state = RefCell::new(SharedState::new());
        let link = LinkState::new();
        let mut central = CentralSync::new(&state, &link, FixedQueries { wpm: 40 });
        let mut writer = RecordingWriter::new();

        state.borrow_mut().config.oled_brightness = 42;
        let report = block_on(central.tick_at(at(0), &mut writer));
        assert_eq!(report.sent, 0);
        assert!(report.save_config);
        assert!(writer.packets.is_empty());

        // Once the link comes up, the accumulated state goes out.
        link.set_connected(true);
        let report = block_on(central.tick_at(at(1), &mut writer));
        assert_eq!(report.sent, 4);
    }

    #[test]
    fn keylog_append_is_replicated() {
        let state = RefCell::new(SharedState::new());
        let link = connected_link();
        let mut central = CentralSync::new(&state, &link, FixedQueries { wpm: 40 });
        let mut writer = RecordingWriter::new();

        block_on(central.tick_at(at(0), &mut writer));
        writer.packets.clear();

        state.borrow_mut().keylog.push('a');
        let report = block_on(central.tick_at(at(1), &mut writer));
        assert_eq!(report.sent, 1);
        assert_eq!(writer.packets[0].channel, SyncChannel::Keylog as u8);
    }
}

//! Peripheral-side receive and merge.
//!
//! Every merge is a whole-block replace guarded by an exact payload-size
//! check: a packet whose claimed size differs from the block's encoded size
//! is discarded without touching local state. That covers the halves being
//! flashed from different builds — the mismatch signals a layout change, and
//! stale-but-consistent beats corrupt.

use core::cell::RefCell;

use seam_types::config::UserConfig;
use seam_types::runtime::RuntimeState;
use seam_types::text::{AutocorrectText, TextLog};
use seam_types::wire::WireBlock;

use super::driver::{SplitDriverError, SyncReader};
use super::{SyncChannel, SyncPacket};
use crate::hooks::SplitHooks;
use crate::state::{LinkState, SharedState};

/// Validate and merge one incoming packet into local state. Returns whether
/// a block was actually applied.
pub fn apply_packet<H: SplitHooks>(
    state: &mut SharedState,
    hooks: &mut H,
    packet: &SyncPacket,
) -> bool {
    let Some(channel) = SyncChannel::from_u8(packet.channel) else {
        warn!("dropping sync packet with unknown channel {}", packet.channel);
        return false;
    };
    if packet.len as usize != channel.expected_size() {
        warn!(
            "dropping {:?} packet: size {} != expected {}",
            channel,
            packet.len,
            channel.expected_size()
        );
        return false;
    }
    let payload = packet.payload();

    match channel {
        SyncChannel::RuntimeState => {
            let incoming = RuntimeState::decode(payload);
            let was_dirty = state.runtime.menu.dirty;
            let was_suspended = state.runtime.flags.suspended();

            state.runtime = incoming;
            // A remote state that predates a local edit must not swallow a
            // pending redraw request.
            state.runtime.menu.dirty |= was_dirty;

            let suspended = state.runtime.flags.suspended();
            if suspended != was_suspended {
                debug!("suspend state changed: {}", suspended);
                hooks.on_suspend_change(suspended);
            }
        }
        SyncChannel::Config => {
            if !UserConfig::version_matches(payload) {
                warn!("dropping config packet with mismatched version");
                return false;
            }
            state.config = UserConfig::decode(payload);
            hooks.on_config_applied(&state.config);
        }
        SyncChannel::Keylog => {
            state.keylog = TextLog::decode(payload);
            state.keylog.changed = true;
        }
        SyncChannel::Autocorrect => {
            state.autocorrect = AutocorrectText::decode(payload);
            state.autocorrect.changed = true;
        }
    }
    true
}

/// The split peripheral service: reads packets off the link and merges them
/// until the driver reports a disconnect.
pub struct SplitPeripheral<'a, R: SyncReader, H: SplitHooks> {
    state: &'a RefCell<SharedState>,
    link: &'a LinkState,
    driver: R,
    hooks: H,
}

impl<'a, R: SyncReader, H: SplitHooks> SplitPeripheral<'a, R, H> {
    pub fn new(state: &'a RefCell<SharedState>, link: &'a LinkState, driver: R, hooks: H) -> Self {
        Self {
            state,
            link,
            driver,
            hooks,
        }
    }

    /// Run until the link drops. The caller reconnects and calls `run`
    /// again, mirroring the central's retry-forever posture.
    pub async fn run(&mut self) {
        self.link.set_connected(true);
        info!("split peripheral sync started");
        loop {
            match self.driver.read().await {
                Ok(packet) => {
                    let mut state = self.state.borrow_mut();
                    apply_packet(&mut state, &mut self.hooks, &packet);
                }
                Err(SplitDriverError::Disconnected) => {
                    warn!("split link disconnected");
                    self.link.set_connected(false);
                    return;
                }
                Err(e) => {
                    error!("split read error: {:?}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use seam_types::config::CONFIG_WIRE_SIZE;
    use seam_types::runtime::RUNTIME_WIRE_SIZE;
    use seam_types::wire::encode_to_array;

    use super::*;
    use crate::hooks::NoHooks;

    extern crate std;

    #[derive(Default)]
    struct CountingHooks {
        suspend_calls: std::vec::Vec<bool>,
        config_applied: usize,
    }

    impl SplitHooks for CountingHooks {
        fn on_suspend_change(&mut self, suspended: bool) {
            self.suspend_calls.push(suspended);
        }
        fn on_config_applied(&mut self, _config: &UserConfig) {
            self.config_applied += 1;
        }
    }

    fn runtime_packet(runtime: &RuntimeState) -> SyncPacket {
        let bytes: [u8; RUNTIME_WIRE_SIZE] = encode_to_array(runtime);
        SyncPacket::from_payload(SyncChannel::RuntimeState, &bytes)
    }

    fn config_packet(config: &UserConfig) -> SyncPacket {
        let bytes: [u8; CONFIG_WIRE_SIZE] = encode_to_array(config);
        SyncPacket::from_payload(SyncChannel::Config, &bytes)
    }

    #[test]
    fn config_merge_copies_all_bytes() {
        let mut state = SharedState::new();
        let mut remote = UserConfig::default();
        remote.rgb.flags.set_enabled(!remote.rgb.flags.enabled());
        remote.oled_brightness = 3;

        assert!(apply_packet(&mut state, &mut NoHooks, &config_packet(&remote)));
        assert_eq!(state.config, remote);
    }

    #[test]
    fn wrong_size_leaves_block_untouched() {
        let mut state = SharedState::new();
        let before = state.config;

        let good = config_packet(&UserConfig::default());
        for bad_len in [0u8, 1, CONFIG_WIRE_SIZE as u8 - 1, CONFIG_WIRE_SIZE as u8 + 1] {
            let mut packet = good;
            packet.len = bad_len;
            assert!(!apply_packet(&mut state, &mut NoHooks, &packet));
        }
        assert_eq!(state.config, before);
    }

    #[test]
    fn unknown_channel_is_discarded() {
        let mut state = SharedState::new();
        let mut packet = config_packet(&UserConfig::default());
        packet.channel = 0x7F;
        assert!(!apply_packet(&mut state, &mut NoHooks, &packet));
    }

    #[test]
    fn merge_is_idempotent() {
        let mut state = SharedState::new();
        let mut runtime = RuntimeState::default();
        runtime.wpm = 88;
        runtime.layer_state = 0b100;
        let packet = runtime_packet(&runtime);

        assert!(apply_packet(&mut state, &mut NoHooks, &packet));
        let after_once = state.clone();
        assert!(apply_packet(&mut state, &mut NoHooks, &packet));
        assert_eq!(state.runtime, after_once.runtime);
        assert_eq!(state.config, after_once.config);
    }

    #[test]
    fn local_menu_dirty_survives_remote_clear() {
        let mut state = SharedState::new();
        state.runtime.menu.dirty = true;

        let mut remote = RuntimeState::default();
        remote.menu.dirty = false;
        remote.wpm = 10;
        assert!(apply_packet(&mut state, &mut NoHooks, &runtime_packet(&remote)));

        assert!(state.runtime.menu.dirty);
        assert_eq!(state.runtime.wpm, 10);
    }

    #[test]
    fn remote_dirty_is_not_lost_either() {
        let mut state = SharedState::new();
        let mut remote = RuntimeState::default();
        remote.menu.dirty = true;
        assert!(apply_packet(&mut state, &mut NoHooks, &runtime_packet(&remote)));
        assert!(state.runtime.menu.dirty);
    }

    #[test]
    fn suspend_hook_fires_on_edges_only() {
        let mut state = SharedState::new();
        let mut hooks = CountingHooks::default();

        let mut suspended = RuntimeState::default();
        suspended.flags.set_suspended(true);
        let mut awake = RuntimeState::default();
        awake.flags.set_suspended(false);

        // false -> true: one call.
        apply_packet(&mut state, &mut hooks, &runtime_packet(&suspended));
        // true -> true, repeated: no further calls.
        apply_packet(&mut state, &mut hooks, &runtime_packet(&suspended));
        apply_packet(&mut state, &mut hooks, &runtime_packet(&suspended));
        // true -> false: one call.
        apply_packet(&mut state, &mut hooks, &runtime_packet(&awake));

        assert_eq!(hooks.suspend_calls, std::vec![true, false]);
    }

    #[test]
    fn config_apply_hook_fires_per_merge() {
        let mut state = SharedState::new();
        let mut hooks = CountingHooks::default();
        apply_packet(&mut state, &mut hooks, &config_packet(&UserConfig::default()));
        assert_eq!(hooks.config_applied, 1);
    }

    #[test]
    fn text_merges_raise_changed() {
        let mut state = SharedState::new();

        let mut log = TextLog::default();
        log.push('k');
        let bytes: [u8; TextLog::WIRE_SIZE] = encode_to_array(&log);
        let packet = SyncPacket::from_payload(SyncChannel::Keylog, &bytes);
        assert!(apply_packet(&mut state, &mut NoHooks, &packet));
        assert!(state.keylog.changed);
        assert_eq!(state.keylog.as_str(), "k");

        let mut ac = AutocorrectText::default();
        ac.record("adn", "and");
        let bytes: [u8; AutocorrectText::WIRE_SIZE] = encode_to_array(&ac);
        let packet = SyncPacket::from_payload(SyncChannel::Autocorrect, &bytes);
        assert!(apply_packet(&mut state, &mut NoHooks, &packet));
        assert!(state.autocorrect.changed);
        assert_eq!(state.autocorrect.corrected(), "and");
    }
}

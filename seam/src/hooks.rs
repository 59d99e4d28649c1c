//! Capability traits at the edges of the sync core.
//!
//! The firmware framework owns the actual hardware and host state; the sync
//! core reaches it only through these narrow interfaces. All hook methods
//! have no-op defaults, so integrations implement exactly what they care
//! about instead of overriding link-time symbols.

use seam_types::config::UserConfig;
use seam_types::runtime::{AudioFlags, InternalFlags, LedIndicator, ModsSnapshot};

/// Live host-side reads, queried once per tick on the central half to
/// rebuild the runtime state block before change detection runs. All pure
/// reads, no side effects.
pub trait HostQueries {
    fn mods(&self) -> ModsSnapshot;
    fn layer_state(&self) -> u32;
    fn default_layer(&self) -> u32;
    fn leds(&self) -> LedIndicator;
    fn wpm(&self) -> u8;
    fn audio(&self) -> AudioFlags;
    fn flags(&self) -> InternalFlags;

    fn unicode_mode(&self) -> u8 {
        0
    }

    fn unicode_typing_mode(&self) -> u8 {
        0
    }
}

/// Side-effect callbacks fired by the receive-side merge logic.
pub trait SplitHooks {
    /// Fired once per transition of the replicated `suspended` flag,
    /// edge-triggered so a display or LED driver is not re-suspended on
    /// every incoming sync.
    fn on_suspend_change(&mut self, suspended: bool) {
        let _ = suspended;
    }

    /// Fired after a config block has been merged, so the receiving half can
    /// push the new preferences into its local RGB / display drivers.
    fn on_config_applied(&mut self, config: &UserConfig) {
        let _ = config;
    }
}

impl<Q: HostQueries> HostQueries for &Q {
    fn mods(&self) -> ModsSnapshot {
        (**self).mods()
    }
    fn layer_state(&self) -> u32 {
        (**self).layer_state()
    }
    fn default_layer(&self) -> u32 {
        (**self).default_layer()
    }
    fn leds(&self) -> LedIndicator {
        (**self).leds()
    }
    fn wpm(&self) -> u8 {
        (**self).wpm()
    }
    fn audio(&self) -> AudioFlags {
        (**self).audio()
    }
    fn flags(&self) -> InternalFlags {
        (**self).flags()
    }
    fn unicode_mode(&self) -> u8 {
        (**self).unicode_mode()
    }
    fn unicode_typing_mode(&self) -> u8 {
        (**self).unicode_typing_mode()
    }
}

impl<H: SplitHooks> SplitHooks for &mut H {
    fn on_suspend_change(&mut self, suspended: bool) {
        (**self).on_suspend_change(suspended);
    }
    fn on_config_applied(&mut self, config: &UserConfig) {
        (**self).on_config_applied(config);
    }
}

/// Hook implementation that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl SplitHooks for NoHooks {}

//! Caller-owned shared state and the link connection gate.

use core::sync::atomic::{AtomicBool, Ordering};

use seam_types::config::UserConfig;
use seam_types::runtime::RuntimeState;
use seam_types::text::{AutocorrectText, TextLog};

/// All replicated state of one half, owned by the caller and shared between
/// the sync tasks and the menu logic as `&RefCell<SharedState>` within a
/// single executor. Each half runs single threaded, so block updates are
/// plain whole-struct copies with no locking.
#[derive(Debug, Default, Clone)]
pub struct SharedState {
    pub config: UserConfig,
    pub runtime: RuntimeState,
    pub keylog: TextLog,
    pub autocorrect: AutocorrectText,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State seeded with a config loaded from storage.
    pub fn with_config(config: UserConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }
}

/// Connection gate for the split link. While down, the central scheduler
/// sends nothing and pending changes simply accumulate in the snapshots.
///
/// Typically a `static` next to the executor; the drivers set it, the sync
/// loops read it.
pub struct LinkState {
    connected: AtomicBool,
}

impl LinkState {
    pub const fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

impl Default for LinkState {
    fn default() -> Self {
        Self::new()
    }
}

//! Ephemeral runtime state, rebuilt on every boot and replicated from the
//! central half to the peripheral. The central recomputes it from live
//! firmware queries once per tick; the peripheral only ever mirrors it.
//!
//! Wire layout (28 bytes):
//!
//! | offset | size | field                                      |
//! |--------|------|--------------------------------------------|
//! | 0      | 1    | audio flags                                |
//! | 1      | 1    | internal flags                             |
//! | 2      | 1    | unicode mode                               |
//! | 3      | 1    | unicode typing mode                        |
//! | 4..8   | 4    | modifiers: active / weak / one-shot / osl  |
//! | 8..12  | 4    | layer state bitmask (LE u32)               |
//! | 12..16 | 4    | default layer bitmask (LE u32)             |
//! | 16     | 1    | host LED indicator                         |
//! | 17     | 1    | words per minute                           |
//! | 18     | 1    | menu flags (bit 0 in-menu, bit 1 dirty)    |
//! | 19     | 1    | menu selected child index (0xFF = none)    |
//! | 20..28 | 8    | menu stack, root-first (0xFF = unused)     |

use bitfield_struct::bitfield;
use byteorder::{ByteOrder, LittleEndian};

use crate::wire::WireBlock;

/// Encoded size of [`RuntimeState`].
pub const RUNTIME_WIRE_SIZE: usize = 28;

/// Fixed depth of the menu navigation stack. Menu trees deeper than this
/// cannot be expressed; `enter` saturates at the limit.
pub const MENU_STACK_DEPTH: usize = 8;

/// Sentinel for "no selection" / unused stack slot.
pub const MENU_INDEX_NONE: u8 = 0xFF;

/// Standard HID modifier bits.
#[bitfield(u8, order = Lsb, defmt = cfg(feature = "defmt"))]
#[derive(PartialEq, Eq)]
pub struct Modifiers {
    #[bits(1)]
    pub left_ctrl: bool,
    #[bits(1)]
    pub left_shift: bool,
    #[bits(1)]
    pub left_alt: bool,
    #[bits(1)]
    pub left_gui: bool,
    #[bits(1)]
    pub right_ctrl: bool,
    #[bits(1)]
    pub right_shift: bool,
    #[bits(1)]
    pub right_alt: bool,
    #[bits(1)]
    pub right_gui: bool,
}

/// Snapshot of all four modifier layers the firmware tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModsSnapshot {
    pub active: Modifiers,
    pub weak: Modifiers,
    pub one_shot: Modifiers,
    pub one_shot_locked: Modifiers,
}

#[bitfield(u8, order = Lsb, defmt = cfg(feature = "defmt"))]
#[derive(PartialEq, Eq)]
pub struct AudioFlags {
    #[bits(1)]
    pub enabled: bool,
    #[bits(1)]
    pub clicky: bool,
    #[bits(6)]
    _reserved: u8,
}

#[bitfield(u8, order = Lsb, defmt = cfg(feature = "defmt"))]
#[derive(PartialEq, Eq)]
pub struct InternalFlags {
    /// Host driver holds the lock (remote desktop style capture).
    #[bits(1)]
    pub host_driver_locked: bool,
    #[bits(1)]
    pub caps_word: bool,
    #[bits(1)]
    pub swap_hands: bool,
    #[bits(1)]
    pub suspended: bool,
    #[bits(4)]
    _reserved: u8,
}

/// Host keyboard LED state as reported over HID.
#[bitfield(u8, order = Lsb, defmt = cfg(feature = "defmt"))]
#[derive(PartialEq, Eq)]
pub struct LedIndicator {
    #[bits(1)]
    pub num_lock: bool,
    #[bits(1)]
    pub caps_lock: bool,
    #[bits(1)]
    pub scroll_lock: bool,
    #[bits(1)]
    pub compose: bool,
    #[bits(1)]
    pub kana: bool,
    #[bits(3)]
    _reserved: u8,
}

/// Cursor into the static menu tree: which node is shown and how we got
/// there. Replicated as part of [`RuntimeState`]; the tree itself is
/// compiled into both halves and never sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MenuState {
    /// Whether the menu is currently shown.
    pub active: bool,
    /// Render-needed flag. An incoming sync must never clear a locally set
    /// dirty bit; the merge logic ORs the previous local value back in.
    pub dirty: bool,
    /// Index of the highlighted child in the current submenu.
    pub selected: u8,
    /// Path from the root to the displayed submenu: a prefix of valid child
    /// indices followed by `MENU_INDEX_NONE` sentinels.
    pub stack: [u8; MENU_STACK_DEPTH],
}

impl Default for MenuState {
    fn default() -> Self {
        Self {
            active: false,
            dirty: false,
            selected: MENU_INDEX_NONE,
            stack: [MENU_INDEX_NONE; MENU_STACK_DEPTH],
        }
    }
}

impl MenuState {
    /// Number of non-sentinel entries at the front of the stack.
    pub fn depth(&self) -> usize {
        self.stack.iter().position(|&s| s == MENU_INDEX_NONE).unwrap_or(MENU_STACK_DEPTH)
    }

    /// Push a child index. Saturates: at full depth the stack is unchanged
    /// and `false` is returned.
    pub fn push(&mut self, index: u8) -> bool {
        let depth = self.depth();
        if depth == MENU_STACK_DEPTH || index == MENU_INDEX_NONE {
            return false;
        }
        self.stack[depth] = index;
        true
    }

    /// Pop the most recent entry, or `None` when already at the root.
    pub fn pop(&mut self) -> Option<u8> {
        let depth = self.depth();
        if depth == 0 {
            return None;
        }
        let index = self.stack[depth - 1];
        self.stack[depth - 1] = MENU_INDEX_NONE;
        Some(index)
    }

    /// Leave the menu entirely: clears the stack and the selection.
    pub fn reset(&mut self) {
        self.active = false;
        self.selected = MENU_INDEX_NONE;
        self.stack = [MENU_INDEX_NONE; MENU_STACK_DEPTH];
    }
}

/// The ephemeral replicated state block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RuntimeState {
    pub audio: AudioFlags,
    pub flags: InternalFlags,
    pub unicode_mode: u8,
    pub unicode_typing_mode: u8,
    pub mods: ModsSnapshot,
    pub layer_state: u32,
    pub default_layer: u32,
    pub leds: LedIndicator,
    pub wpm: u8,
    pub menu: MenuState,
}

impl WireBlock for RuntimeState {
    const WIRE_SIZE: usize = RUNTIME_WIRE_SIZE;

    fn encode(&self, buf: &mut [u8]) {
        debug_assert!(buf.len() >= Self::WIRE_SIZE);
        buf[0] = self.audio.into_bits();
        buf[1] = self.flags.into_bits();
        buf[2] = self.unicode_mode;
        buf[3] = self.unicode_typing_mode;
        buf[4] = self.mods.active.into_bits();
        buf[5] = self.mods.weak.into_bits();
        buf[6] = self.mods.one_shot.into_bits();
        buf[7] = self.mods.one_shot_locked.into_bits();
        LittleEndian::write_u32(&mut buf[8..12], self.layer_state);
        LittleEndian::write_u32(&mut buf[12..16], self.default_layer);
        buf[16] = self.leds.into_bits();
        buf[17] = self.wpm;
        buf[18] = (self.menu.active as u8) | ((self.menu.dirty as u8) << 1);
        buf[19] = self.menu.selected;
        buf[20..28].copy_from_slice(&self.menu.stack);
    }

    fn decode(buf: &[u8]) -> Self {
        debug_assert!(buf.len() >= Self::WIRE_SIZE);
        let mut stack = [MENU_INDEX_NONE; MENU_STACK_DEPTH];
        stack.copy_from_slice(&buf[20..28]);
        Self {
            audio: AudioFlags::from_bits(buf[0]),
            flags: InternalFlags::from_bits(buf[1]),
            unicode_mode: buf[2],
            unicode_typing_mode: buf[3],
            mods: ModsSnapshot {
                active: Modifiers::from_bits(buf[4]),
                weak: Modifiers::from_bits(buf[5]),
                one_shot: Modifiers::from_bits(buf[6]),
                one_shot_locked: Modifiers::from_bits(buf[7]),
            },
            layer_state: LittleEndian::read_u32(&buf[8..12]),
            default_layer: LittleEndian::read_u32(&buf[12..16]),
            leds: LedIndicator::from_bits(buf[16]),
            wpm: buf[17],
            menu: MenuState {
                active: buf[18] & 0x01 != 0,
                dirty: buf[18] & 0x02 != 0,
                selected: buf[19],
                stack,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::encode_to_array;

    #[test]
    fn wire_size_is_twenty_eight_bytes() {
        assert_eq!(RuntimeState::WIRE_SIZE, 28);
    }

    #[test]
    fn encode_decode_preserves_state() {
        let mut state = RuntimeState::default();
        state.audio = AudioFlags::new().with_enabled(true).with_clicky(true);
        state.flags = InternalFlags::new().with_caps_word(true).with_suspended(true);
        state.mods.active = Modifiers::new().with_left_shift(true);
        state.layer_state = 0b1010;
        state.default_layer = 1;
        state.wpm = 73;
        state.menu.active = true;
        state.menu.dirty = true;
        state.menu.selected = 2;
        state.menu.push(0);
        state.menu.push(3);

        let buf: [u8; RUNTIME_WIRE_SIZE] = encode_to_array(&state);
        assert_eq!(RuntimeState::decode(&buf), state);
    }

    #[test]
    fn menu_stack_saturates_at_fixed_depth() {
        let mut menu = MenuState::default();
        for i in 0..MENU_STACK_DEPTH as u8 {
            assert!(menu.push(i));
        }
        assert_eq!(menu.depth(), MENU_STACK_DEPTH);

        let before = menu.stack;
        assert!(!menu.push(42));
        assert_eq!(menu.stack, before);
    }

    #[test]
    fn menu_stack_pop_is_lifo() {
        let mut menu = MenuState::default();
        menu.push(1);
        menu.push(5);
        assert_eq!(menu.pop(), Some(5));
        assert_eq!(menu.pop(), Some(1));
        assert_eq!(menu.pop(), None);
    }

    #[test]
    fn sentinel_cannot_be_pushed() {
        let mut menu = MenuState::default();
        assert!(!menu.push(MENU_INDEX_NONE));
        assert_eq!(menu.depth(), 0);
    }

    #[test]
    fn menu_flags_share_one_wire_byte() {
        let mut state = RuntimeState::default();
        state.menu.active = true;
        state.menu.dirty = true;
        let buf: [u8; RUNTIME_WIRE_SIZE] = encode_to_array(&state);
        assert_eq!(buf[18], 0b11);
    }
}

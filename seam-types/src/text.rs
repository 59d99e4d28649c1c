//! Bounded display-string blocks: a rolling keystroke log and the
//! autocorrection typed/corrected pair. Both are replicated opportunistically
//! and independently of the config and runtime blocks.
//!
//! Wire form is the raw character buffer, zero padded to the fixed length.
//! The companion `changed` flag is a local render hint and never goes on the
//! wire: the receiving half sets it unconditionally on merge.

use crate::wire::WireBlock;

/// Visible length of the keystroke log.
pub const KEYLOG_LEN: usize = 20;

/// Maximum length of each autocorrect string.
pub const AUTOCORRECT_LEN: usize = 16;

/// Encoded size of [`AutocorrectText`]: the typed and corrected strings
/// back to back.
pub const AUTOCORRECT_WIRE_SIZE: usize = AUTOCORRECT_LEN * 2;

fn decode_padded<const N: usize>(buf: &[u8]) -> ([u8; N], u8) {
    let mut chars = [0u8; N];
    chars.copy_from_slice(&buf[..N]);
    let len = chars.iter().position(|&b| b == 0).unwrap_or(N) as u8;
    (chars, len)
}

fn str_from(chars: &[u8], len: u8) -> &str {
    core::str::from_utf8(&chars[..len as usize]).unwrap_or("")
}

/// Rolling log of recently typed characters, oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TextLog {
    chars: [u8; KEYLOG_LEN],
    len: u8,
    /// Set on any local append and on every merge; cleared by the renderer.
    pub changed: bool,
}

impl Default for TextLog {
    fn default() -> Self {
        Self {
            chars: [0; KEYLOG_LEN],
            len: 0,
            changed: false,
        }
    }
}

impl TextLog {
    /// Append one character, discarding the oldest when full. Non-printable
    /// ASCII input is logged as `'?'` so the buffer stays valid UTF-8.
    pub fn push(&mut self, c: char) {
        let byte = if c.is_ascii_graphic() || c == ' ' { c as u8 } else { b'?' };
        if (self.len as usize) == KEYLOG_LEN {
            self.chars.copy_within(1..KEYLOG_LEN, 0);
            self.chars[KEYLOG_LEN - 1] = byte;
        } else {
            self.chars[self.len as usize] = byte;
            self.len += 1;
        }
        self.changed = true;
    }

    pub fn clear(&mut self) {
        self.chars = [0; KEYLOG_LEN];
        self.len = 0;
        self.changed = true;
    }

    pub fn as_str(&self) -> &str {
        str_from(&self.chars, self.len)
    }
}

impl WireBlock for TextLog {
    const WIRE_SIZE: usize = KEYLOG_LEN;

    fn encode(&self, buf: &mut [u8]) {
        debug_assert!(buf.len() >= Self::WIRE_SIZE);
        buf[..KEYLOG_LEN].copy_from_slice(&self.chars);
    }

    fn decode(buf: &[u8]) -> Self {
        debug_assert!(buf.len() >= Self::WIRE_SIZE);
        let (chars, len) = decode_padded::<KEYLOG_LEN>(buf);
        Self {
            chars,
            len,
            changed: false,
        }
    }
}

/// The most recent autocorrection: what was typed and what it became.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AutocorrectText {
    typed: [u8; AUTOCORRECT_LEN],
    typed_len: u8,
    corrected: [u8; AUTOCORRECT_LEN],
    corrected_len: u8,
    /// Same render-hint semantics as [`TextLog::changed`].
    pub changed: bool,
}

impl Default for AutocorrectText {
    fn default() -> Self {
        Self {
            typed: [0; AUTOCORRECT_LEN],
            typed_len: 0,
            corrected: [0; AUTOCORRECT_LEN],
            corrected_len: 0,
            changed: false,
        }
    }
}

impl AutocorrectText {
    /// Record a correction. Inputs longer than the buffer are truncated.
    pub fn record(&mut self, typed: &str, corrected: &str) {
        fn fill(dst: &mut [u8; AUTOCORRECT_LEN], src: &str) -> u8 {
            *dst = [0; AUTOCORRECT_LEN];
            let mut len = 0;
            for &b in src.as_bytes() {
                if len == AUTOCORRECT_LEN || !b.is_ascii() {
                    break;
                }
                dst[len] = b;
                len += 1;
            }
            len as u8
        }
        self.typed_len = fill(&mut self.typed, typed);
        self.corrected_len = fill(&mut self.corrected, corrected);
        self.changed = true;
    }

    pub fn typed(&self) -> &str {
        str_from(&self.typed, self.typed_len)
    }

    pub fn corrected(&self) -> &str {
        str_from(&self.corrected, self.corrected_len)
    }
}

impl WireBlock for AutocorrectText {
    const WIRE_SIZE: usize = AUTOCORRECT_WIRE_SIZE;

    fn encode(&self, buf: &mut [u8]) {
        debug_assert!(buf.len() >= Self::WIRE_SIZE);
        buf[..AUTOCORRECT_LEN].copy_from_slice(&self.typed);
        buf[AUTOCORRECT_LEN..AUTOCORRECT_LEN * 2].copy_from_slice(&self.corrected);
    }

    fn decode(buf: &[u8]) -> Self {
        debug_assert!(buf.len() >= Self::WIRE_SIZE);
        let (typed, typed_len) = decode_padded::<AUTOCORRECT_LEN>(&buf[..AUTOCORRECT_LEN]);
        let (corrected, corrected_len) = decode_padded::<AUTOCORRECT_LEN>(&buf[AUTOCORRECT_LEN..]);
        Self {
            typed,
            typed_len,
            corrected,
            corrected_len,
            changed: false,
        }
    }
}

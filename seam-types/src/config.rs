//! Persistent user configuration.
//!
//! `UserConfig` is the single persistent block: loaded once at boot, mutated
//! by menu value handlers and key-event glue, saved back to flash on every
//! change and replicated to the peripheral half whenever it differs from the
//! last-sent snapshot.
//!
//! Wire layout (40 bytes, version-tagged, little-endian):
//!
//! | offset | size | field                                   |
//! |--------|------|-----------------------------------------|
//! | 0      | 1    | config version (`CONFIG_VERSION`)       |
//! | 1      | 1    | RGB flags                               |
//! | 2      | 1    | RGB mode                                |
//! | 3..6   | 3    | RGB hue / sat / val                     |
//! | 6      | 1    | RGB animation speed                     |
//! | 7      | 1    | gaming flags                            |
//! | 8      | 1    | OLED brightness                         |
//! | 9      | 1    | debug flags                             |
//! | 10..26 | 16   | pointer accel curve, 4 × f32            |
//! | 26     | 1    | painter flags (mode / rotation / invert)|
//! | 27     | 1    | painter logo index                      |
//! | 28..31 | 3    | painter primary hue / sat / val         |
//! | 31..34 | 3    | painter secondary hue / sat / val       |
//! | 34     | 1    | RTC flags                               |
//! | 35     | 1    | RTC UTC offset, quarter hours (i8)      |
//! | 36..40 | 4    | reserved, zero                          |

use bitfield_struct::bitfield;
use byteorder::{ByteOrder, LittleEndian};

use crate::wire::WireBlock;

/// Bumped whenever the layout above changes. A stored or received config with
/// a different version byte is discarded as a whole.
pub const CONFIG_VERSION: u8 = 1;

/// Encoded size of [`UserConfig`].
pub const CONFIG_WIRE_SIZE: usize = 40;

/// An HSV color triple, one byte per component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Hsv {
    pub hue: u8,
    pub sat: u8,
    pub val: u8,
}

impl Hsv {
    pub const fn new(hue: u8, sat: u8, val: u8) -> Self {
        Self { hue, sat, val }
    }
}

#[bitfield(u8, order = Lsb, defmt = cfg(feature = "defmt"))]
#[derive(PartialEq, Eq)]
pub struct RgbFlags {
    #[bits(1)]
    pub enabled: bool,
    /// Layer-reactive color override.
    #[bits(1)]
    pub layer_indication: bool,
    /// Dim the matrix after the idle timeout instead of turning it off.
    #[bits(1)]
    pub idle_dim: bool,
    #[bits(5)]
    _reserved: u8,
}

#[bitfield(u8, order = Lsb, defmt = cfg(feature = "defmt"))]
#[derive(PartialEq, Eq)]
pub struct GamingFlags {
    #[bits(1)]
    pub enabled: bool,
    /// Disable the GUI key while gaming mode is active.
    #[bits(1)]
    pub no_gui: bool,
    /// Keep the OLED on while gaming mode is active.
    #[bits(1)]
    pub oled_lock: bool,
    #[bits(5)]
    _reserved: u8,
}

#[bitfield(u8, order = Lsb, defmt = cfg(feature = "defmt"))]
#[derive(PartialEq, Eq)]
pub struct DebugFlags {
    #[bits(1)]
    pub enabled: bool,
    #[bits(1)]
    pub matrix: bool,
    #[bits(1)]
    pub keyboard: bool,
    #[bits(1)]
    pub mouse: bool,
    #[bits(4)]
    _reserved: u8,
}

/// Four-parameter acceleration curve applied to pointing devices.
/// The math consuming these lives in the pointing driver, not here.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PointerAccel {
    pub growth_rate: f32,
    pub offset: f32,
    pub limit: f32,
    pub takeoff: f32,
}

impl Default for PointerAccel {
    fn default() -> Self {
        Self {
            growth_rate: 0.25,
            offset: 2.2,
            limit: 0.2,
            takeoff: 2.0,
        }
    }
}

#[bitfield(u8, order = Lsb, defmt = cfg(feature = "defmt"))]
#[derive(PartialEq, Eq)]
pub struct PainterFlags {
    /// Display content mode (0 = status, 1 = clock, 2 = art, 3-7 reserved).
    #[bits(3)]
    pub mode: u8,
    /// Screen rotation in 90° steps.
    #[bits(2)]
    pub rotation: u8,
    #[bits(1)]
    pub inverted: bool,
    #[bits(2)]
    _reserved: u8,
}

/// Display painter preferences: content mode, logo and the dual hue pair
/// used for highlight / background rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PainterConfig {
    pub flags: PainterFlags,
    pub logo: u8,
    pub primary: Hsv,
    pub secondary: Hsv,
}

#[bitfield(u8, order = Lsb, defmt = cfg(feature = "defmt"))]
#[derive(PartialEq, Eq)]
pub struct RtcFlags {
    #[bits(1)]
    pub format_24h: bool,
    #[bits(1)]
    pub dst: bool,
    #[bits(6)]
    _reserved: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RtcConfig {
    pub flags: RtcFlags,
    /// UTC offset in quarter hours, so half-hour timezones are expressible.
    pub utc_offset_quarters: i8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RgbConfig {
    pub flags: RgbFlags,
    pub mode: u8,
    pub color: Hsv,
    pub speed: u8,
}

/// The persistent user configuration block.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UserConfig {
    pub rgb: RgbConfig,
    pub gaming: GamingFlags,
    pub oled_brightness: u8,
    pub debug: DebugFlags,
    pub accel: PointerAccel,
    pub painter: PainterConfig,
    pub rtc: RtcConfig,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            rgb: RgbConfig {
                flags: RgbFlags::new().with_enabled(true),
                mode: 1,
                color: Hsv::new(170, 255, 255),
                speed: 64,
            },
            gaming: GamingFlags::new().with_no_gui(true),
            oled_brightness: 128,
            debug: DebugFlags::new(),
            accel: PointerAccel::default(),
            painter: PainterConfig {
                flags: PainterFlags::new(),
                logo: 0,
                primary: Hsv::new(128, 255, 255),
                secondary: Hsv::new(48, 255, 255),
            },
            rtc: RtcConfig::default(),
        }
    }
}

impl WireBlock for UserConfig {
    const WIRE_SIZE: usize = CONFIG_WIRE_SIZE;

    fn encode(&self, buf: &mut [u8]) {
        debug_assert!(buf.len() >= Self::WIRE_SIZE);
        buf[0] = CONFIG_VERSION;
        buf[1] = self.rgb.flags.into_bits();
        buf[2] = self.rgb.mode;
        buf[3] = self.rgb.color.hue;
        buf[4] = self.rgb.color.sat;
        buf[5] = self.rgb.color.val;
        buf[6] = self.rgb.speed;
        buf[7] = self.gaming.into_bits();
        buf[8] = self.oled_brightness;
        buf[9] = self.debug.into_bits();
        LittleEndian::write_f32(&mut buf[10..14], self.accel.growth_rate);
        LittleEndian::write_f32(&mut buf[14..18], self.accel.offset);
        LittleEndian::write_f32(&mut buf[18..22], self.accel.limit);
        LittleEndian::write_f32(&mut buf[22..26], self.accel.takeoff);
        buf[26] = self.painter.flags.into_bits();
        buf[27] = self.painter.logo;
        buf[28] = self.painter.primary.hue;
        buf[29] = self.painter.primary.sat;
        buf[30] = self.painter.primary.val;
        buf[31] = self.painter.secondary.hue;
        buf[32] = self.painter.secondary.sat;
        buf[33] = self.painter.secondary.val;
        buf[34] = self.rtc.flags.into_bits();
        buf[35] = self.rtc.utc_offset_quarters as u8;
        buf[36..40].fill(0);
    }

    fn decode(buf: &[u8]) -> Self {
        debug_assert!(buf.len() >= Self::WIRE_SIZE);
        Self {
            rgb: RgbConfig {
                flags: RgbFlags::from_bits(buf[1]),
                mode: buf[2],
                color: Hsv::new(buf[3], buf[4], buf[5]),
                speed: buf[6],
            },
            gaming: GamingFlags::from_bits(buf[7]),
            oled_brightness: buf[8],
            debug: DebugFlags::from_bits(buf[9]),
            accel: PointerAccel {
                growth_rate: LittleEndian::read_f32(&buf[10..14]),
                offset: LittleEndian::read_f32(&buf[14..18]),
                limit: LittleEndian::read_f32(&buf[18..22]),
                takeoff: LittleEndian::read_f32(&buf[22..26]),
            },
            painter: PainterConfig {
                flags: PainterFlags::from_bits(buf[26]),
                logo: buf[27],
                primary: Hsv::new(buf[28], buf[29], buf[30]),
                secondary: Hsv::new(buf[31], buf[32], buf[33]),
            },
            rtc: RtcConfig {
                flags: RtcFlags::from_bits(buf[34]),
                utc_offset_quarters: buf[35] as i8,
            },
        }
    }
}

impl UserConfig {
    /// Whether an encoded buffer carries the layout this build understands.
    pub fn version_matches(buf: &[u8]) -> bool {
        !buf.is_empty() && buf[0] == CONFIG_VERSION
    }
}

//! The shipped menu tree.
//!
//! Static data compiled into both halves; every leaf binds an edit/render
//! handler pair operating directly on the shared state. Block dirtiness is
//! detected by the sync scheduler and config persistence by the central run
//! loop, so the handlers only perform the mutation itself.

use seam_types::ValueText;

use super::{EditOp, MenuEntry, write_truncated};
use crate::state::SharedState;

/// Number of RGB animation modes the LED driver exposes.
pub const RGB_MODE_COUNT: u8 = 24;
/// Number of compiled-in logo images.
pub const LOGO_COUNT: u8 = 4;
const PAINTER_MODE_COUNT: u8 = 3;
const ROTATION_COUNT: u8 = 4;
const UNICODE_MODE_COUNT: u8 = 3;

// UTC-12:00 .. UTC+14:00 in quarter hours.
const UTC_OFFSET_MIN: i8 = -48;
const UTC_OFFSET_MAX: i8 = 56;

fn cycle_u8(value: u8, op: EditOp, count: u8) -> u8 {
    // A merged block may carry an out-of-range byte; fold it in first.
    let value = (value % count) as u16;
    let count = count as u16;
    let next = match op {
        EditOp::Increment | EditOp::Activate => (value + 1) % count,
        EditOp::Decrement => (value + count - 1) % count,
    };
    next as u8
}

fn step_wrapping(value: u8, op: EditOp, step: u8) -> u8 {
    match op {
        EditOp::Increment | EditOp::Activate => value.wrapping_add(step),
        EditOp::Decrement => value.wrapping_sub(step),
    }
}

fn step_f32(value: f32, op: EditOp, step: f32, min: f32, max: f32) -> f32 {
    let next = match op {
        EditOp::Increment | EditOp::Activate => value + step,
        EditOp::Decrement => value - step,
    };
    next.clamp(min, max)
}

fn render_on_off(text: &mut ValueText, enabled: bool) {
    write_truncated(text, format_args!("{}", if enabled { "on" } else { "off" }));
}

fn render_u8(text: &mut ValueText, value: u8) {
    write_truncated(text, format_args!("{}", value));
}

fn render_f32(text: &mut ValueText, value: f32) {
    write_truncated(text, format_args!("{:.2}", value));
}

// --- RGB ---

fn edit_rgb_enabled(state: &mut SharedState, _op: EditOp) -> bool {
    let flags = &mut state.config.rgb.flags;
    flags.set_enabled(!flags.enabled());
    false
}
fn render_rgb_enabled(state: &SharedState, text: &mut ValueText) {
    render_on_off(text, state.config.rgb.flags.enabled());
}

fn edit_rgb_mode(state: &mut SharedState, op: EditOp) -> bool {
    state.config.rgb.mode = cycle_u8(state.config.rgb.mode, op, RGB_MODE_COUNT);
    false
}
fn render_rgb_mode(state: &SharedState, text: &mut ValueText) {
    render_u8(text, state.config.rgb.mode);
}

fn edit_rgb_hue(state: &mut SharedState, op: EditOp) -> bool {
    state.config.rgb.color.hue = step_wrapping(state.config.rgb.color.hue, op, 8);
    false
}
fn render_rgb_hue(state: &SharedState, text: &mut ValueText) {
    render_u8(text, state.config.rgb.color.hue);
}

fn edit_rgb_sat(state: &mut SharedState, op: EditOp) -> bool {
    state.config.rgb.color.sat = step_wrapping(state.config.rgb.color.sat, op, 16);
    false
}
fn render_rgb_sat(state: &SharedState, text: &mut ValueText) {
    render_u8(text, state.config.rgb.color.sat);
}

fn edit_rgb_val(state: &mut SharedState, op: EditOp) -> bool {
    state.config.rgb.color.val = step_wrapping(state.config.rgb.color.val, op, 16);
    false
}
fn render_rgb_val(state: &SharedState, text: &mut ValueText) {
    render_u8(text, state.config.rgb.color.val);
}

fn edit_rgb_speed(state: &mut SharedState, op: EditOp) -> bool {
    state.config.rgb.speed = step_wrapping(state.config.rgb.speed, op, 16);
    false
}
fn render_rgb_speed(state: &SharedState, text: &mut ValueText) {
    render_u8(text, state.config.rgb.speed);
}

fn edit_rgb_layer_indication(state: &mut SharedState, _op: EditOp) -> bool {
    let flags = &mut state.config.rgb.flags;
    flags.set_layer_indication(!flags.layer_indication());
    false
}
fn render_rgb_layer_indication(state: &SharedState, text: &mut ValueText) {
    render_on_off(text, state.config.rgb.flags.layer_indication());
}

fn edit_rgb_idle_dim(state: &mut SharedState, _op: EditOp) -> bool {
    let flags = &mut state.config.rgb.flags;
    flags.set_idle_dim(!flags.idle_dim());
    false
}
fn render_rgb_idle_dim(state: &SharedState, text: &mut ValueText) {
    render_on_off(text, state.config.rgb.flags.idle_dim());
}

// --- Display ---

fn edit_oled_brightness(state: &mut SharedState, op: EditOp) -> bool {
    state.config.oled_brightness = step_wrapping(state.config.oled_brightness, op, 16);
    false
}
fn render_oled_brightness(state: &SharedState, text: &mut ValueText) {
    render_u8(text, state.config.oled_brightness);
}

fn edit_painter_mode(state: &mut SharedState, op: EditOp) -> bool {
    let flags = &mut state.config.painter.flags;
    flags.set_mode(cycle_u8(flags.mode(), op, PAINTER_MODE_COUNT));
    false
}
fn render_painter_mode(state: &SharedState, text: &mut ValueText) {
    let name = match state.config.painter.flags.mode() {
        0 => "status",
        1 => "clock",
        2 => "art",
        _ => "?",
    };
    write_truncated(text, format_args!("{}", name));
}

fn edit_painter_logo(state: &mut SharedState, op: EditOp) -> bool {
    state.config.painter.logo = cycle_u8(state.config.painter.logo, op, LOGO_COUNT);
    false
}
fn render_painter_logo(state: &SharedState, text: &mut ValueText) {
    render_u8(text, state.config.painter.logo);
}

fn edit_painter_primary_hue(state: &mut SharedState, op: EditOp) -> bool {
    state.config.painter.primary.hue = step_wrapping(state.config.painter.primary.hue, op, 8);
    false
}
fn render_painter_primary_hue(state: &SharedState, text: &mut ValueText) {
    render_u8(text, state.config.painter.primary.hue);
}

fn edit_painter_secondary_hue(state: &mut SharedState, op: EditOp) -> bool {
    state.config.painter.secondary.hue = step_wrapping(state.config.painter.secondary.hue, op, 8);
    false
}
fn render_painter_secondary_hue(state: &SharedState, text: &mut ValueText) {
    render_u8(text, state.config.painter.secondary.hue);
}

fn edit_painter_inverted(state: &mut SharedState, _op: EditOp) -> bool {
    let flags = &mut state.config.painter.flags;
    flags.set_inverted(!flags.inverted());
    false
}
fn render_painter_inverted(state: &SharedState, text: &mut ValueText) {
    render_on_off(text, state.config.painter.flags.inverted());
}

fn edit_painter_rotation(state: &mut SharedState, op: EditOp) -> bool {
    let flags = &mut state.config.painter.flags;
    flags.set_rotation(cycle_u8(flags.rotation(), op, ROTATION_COUNT));
    false
}
fn render_painter_rotation(state: &SharedState, text: &mut ValueText) {
    write_truncated(
        text,
        format_args!("{}°", state.config.painter.flags.rotation() as u16 * 90),
    );
}

// --- Pointing ---

fn edit_accel_growth(state: &mut SharedState, op: EditOp) -> bool {
    state.config.accel.growth_rate = step_f32(state.config.accel.growth_rate, op, 0.05, 0.0, 4.0);
    false
}
fn render_accel_growth(state: &SharedState, text: &mut ValueText) {
    render_f32(text, state.config.accel.growth_rate);
}

fn edit_accel_offset(state: &mut SharedState, op: EditOp) -> bool {
    state.config.accel.offset = step_f32(state.config.accel.offset, op, 0.1, -10.0, 10.0);
    false
}
fn render_accel_offset(state: &SharedState, text: &mut ValueText) {
    render_f32(text, state.config.accel.offset);
}

fn edit_accel_limit(state: &mut SharedState, op: EditOp) -> bool {
    state.config.accel.limit = step_f32(state.config.accel.limit, op, 0.01, 0.01, 1.0);
    false
}
fn render_accel_limit(state: &SharedState, text: &mut ValueText) {
    render_f32(text, state.config.accel.limit);
}

fn edit_accel_takeoff(state: &mut SharedState, op: EditOp) -> bool {
    state.config.accel.takeoff = step_f32(state.config.accel.takeoff, op, 0.1, 0.1, 10.0);
    false
}
fn render_accel_takeoff(state: &SharedState, text: &mut ValueText) {
    render_f32(text, state.config.accel.takeoff);
}

// --- Gaming ---

fn edit_gaming_enabled(state: &mut SharedState, _op: EditOp) -> bool {
    let gaming = &mut state.config.gaming;
    gaming.set_enabled(!gaming.enabled());
    false
}
fn render_gaming_enabled(state: &SharedState, text: &mut ValueText) {
    render_on_off(text, state.config.gaming.enabled());
}

fn edit_gaming_no_gui(state: &mut SharedState, _op: EditOp) -> bool {
    let gaming = &mut state.config.gaming;
    gaming.set_no_gui(!gaming.no_gui());
    false
}
fn render_gaming_no_gui(state: &SharedState, text: &mut ValueText) {
    render_on_off(text, state.config.gaming.no_gui());
}

fn edit_gaming_oled_lock(state: &mut SharedState, _op: EditOp) -> bool {
    let gaming = &mut state.config.gaming;
    gaming.set_oled_lock(!gaming.oled_lock());
    false
}
fn render_gaming_oled_lock(state: &SharedState, text: &mut ValueText) {
    render_on_off(text, state.config.gaming.oled_lock());
}

// --- Audio & unicode (runtime block) ---

fn edit_audio_enabled(state: &mut SharedState, _op: EditOp) -> bool {
    let audio = &mut state.runtime.audio;
    audio.set_enabled(!audio.enabled());
    false
}
fn render_audio_enabled(state: &SharedState, text: &mut ValueText) {
    render_on_off(text, state.runtime.audio.enabled());
}

fn edit_audio_clicky(state: &mut SharedState, _op: EditOp) -> bool {
    let audio = &mut state.runtime.audio;
    audio.set_clicky(!audio.clicky());
    false
}
fn render_audio_clicky(state: &SharedState, text: &mut ValueText) {
    render_on_off(text, state.runtime.audio.clicky());
}

fn edit_unicode_mode(state: &mut SharedState, op: EditOp) -> bool {
    state.runtime.unicode_mode = cycle_u8(state.runtime.unicode_mode, op, UNICODE_MODE_COUNT);
    false
}
fn render_unicode_mode(state: &SharedState, text: &mut ValueText) {
    let name = match state.runtime.unicode_mode {
        0 => "linux",
        1 => "macos",
        2 => "windows",
        _ => "?",
    };
    write_truncated(text, format_args!("{}", name));
}

// --- RTC ---

fn edit_rtc_format(state: &mut SharedState, _op: EditOp) -> bool {
    let flags = &mut state.config.rtc.flags;
    flags.set_format_24h(!flags.format_24h());
    false
}
fn render_rtc_format(state: &SharedState, text: &mut ValueText) {
    let name = if state.config.rtc.flags.format_24h() { "24h" } else { "12h" };
    write_truncated(text, format_args!("{}", name));
}

fn edit_rtc_dst(state: &mut SharedState, _op: EditOp) -> bool {
    let flags = &mut state.config.rtc.flags;
    flags.set_dst(!flags.dst());
    false
}
fn render_rtc_dst(state: &SharedState, text: &mut ValueText) {
    render_on_off(text, state.config.rtc.flags.dst());
}

fn edit_rtc_offset(state: &mut SharedState, op: EditOp) -> bool {
    let offset = &mut state.config.rtc.utc_offset_quarters;
    *offset = match op {
        EditOp::Increment | EditOp::Activate => offset.saturating_add(1).min(UTC_OFFSET_MAX),
        EditOp::Decrement => offset.saturating_sub(1).max(UTC_OFFSET_MIN),
    };
    false
}
fn render_rtc_offset(state: &SharedState, text: &mut ValueText) {
    let quarters = state.config.rtc.utc_offset_quarters as i16;
    let sign = if quarters < 0 { '-' } else { '+' };
    let abs = quarters.abs();
    write_truncated(text, format_args!("UTC{}{:02}:{:02}", sign, abs / 4, (abs % 4) * 15));
}

// --- Debug ---

fn edit_debug_enabled(state: &mut SharedState, _op: EditOp) -> bool {
    let debug = &mut state.config.debug;
    debug.set_enabled(!debug.enabled());
    false
}
fn render_debug_enabled(state: &SharedState, text: &mut ValueText) {
    render_on_off(text, state.config.debug.enabled());
}

fn edit_debug_matrix(state: &mut SharedState, _op: EditOp) -> bool {
    let debug = &mut state.config.debug;
    debug.set_matrix(!debug.matrix());
    false
}
fn render_debug_matrix(state: &SharedState, text: &mut ValueText) {
    render_on_off(text, state.config.debug.matrix());
}

fn edit_debug_keyboard(state: &mut SharedState, _op: EditOp) -> bool {
    let debug = &mut state.config.debug;
    debug.set_keyboard(!debug.keyboard());
    false
}
fn render_debug_keyboard(state: &SharedState, text: &mut ValueText) {
    render_on_off(text, state.config.debug.keyboard());
}

fn edit_debug_mouse(state: &mut SharedState, _op: EditOp) -> bool {
    let debug = &mut state.config.debug;
    debug.set_mouse(!debug.mouse());
    false
}
fn render_debug_mouse(state: &SharedState, text: &mut ValueText) {
    render_on_off(text, state.config.debug.mouse());
}

static RGB_MENU: [MenuEntry; 8] = [
    MenuEntry::value("Enabled", edit_rgb_enabled, render_rgb_enabled),
    MenuEntry::value("Mode", edit_rgb_mode, render_rgb_mode),
    MenuEntry::value("Hue", edit_rgb_hue, render_rgb_hue),
    MenuEntry::value("Saturation", edit_rgb_sat, render_rgb_sat),
    MenuEntry::value("Brightness", edit_rgb_val, render_rgb_val),
    MenuEntry::value("Speed", edit_rgb_speed, render_rgb_speed),
    MenuEntry::value("Layer Color", edit_rgb_layer_indication, render_rgb_layer_indication),
    MenuEntry::value("Idle Dim", edit_rgb_idle_dim, render_rgb_idle_dim),
];

static DISPLAY_MENU: [MenuEntry; 7] = [
    MenuEntry::value("Brightness", edit_oled_brightness, render_oled_brightness),
    MenuEntry::value("Mode", edit_painter_mode, render_painter_mode),
    MenuEntry::value("Logo", edit_painter_logo, render_painter_logo),
    MenuEntry::value("Primary Hue", edit_painter_primary_hue, render_painter_primary_hue),
    MenuEntry::value("Second Hue", edit_painter_secondary_hue, render_painter_secondary_hue),
    MenuEntry::value("Inverted", edit_painter_inverted, render_painter_inverted),
    MenuEntry::value("Rotation", edit_painter_rotation, render_painter_rotation),
];

static POINTING_MENU: [MenuEntry; 4] = [
    MenuEntry::value("Growth", edit_accel_growth, render_accel_growth),
    MenuEntry::value("Offset", edit_accel_offset, render_accel_offset),
    MenuEntry::value("Limit", edit_accel_limit, render_accel_limit),
    MenuEntry::value("Takeoff", edit_accel_takeoff, render_accel_takeoff),
];

static GAMING_MENU: [MenuEntry; 3] = [
    MenuEntry::value("Enabled", edit_gaming_enabled, render_gaming_enabled),
    MenuEntry::value("No GUI", edit_gaming_no_gui, render_gaming_no_gui),
    MenuEntry::value("OLED Lock", edit_gaming_oled_lock, render_gaming_oled_lock),
];

static AUDIO_MENU: [MenuEntry; 3] = [
    MenuEntry::value("Enabled", edit_audio_enabled, render_audio_enabled),
    MenuEntry::value("Clicky", edit_audio_clicky, render_audio_clicky),
    MenuEntry::value("Unicode", edit_unicode_mode, render_unicode_mode),
];

static RTC_MENU: [MenuEntry; 3] = [
    MenuEntry::value("Format", edit_rtc_format, render_rtc_format),
    MenuEntry::value("DST", edit_rtc_dst, render_rtc_dst),
    MenuEntry::value("Timezone", edit_rtc_offset, render_rtc_offset),
];

static DEBUG_MENU: [MenuEntry; 4] = [
    MenuEntry::value("Enabled", edit_debug_enabled, render_debug_enabled),
    MenuEntry::value("Matrix", edit_debug_matrix, render_debug_matrix),
    MenuEntry::value("Keyboard", edit_debug_keyboard, render_debug_keyboard),
    MenuEntry::value("Mouse", edit_debug_mouse, render_debug_mouse),
];

static ROOT_MENU: [MenuEntry; 7] = [
    MenuEntry::submenu("RGB", &RGB_MENU),
    MenuEntry::submenu("Display", &DISPLAY_MENU),
    MenuEntry::submenu("Pointing", &POINTING_MENU),
    MenuEntry::submenu("Gaming", &GAMING_MENU),
    MenuEntry::submenu("Audio", &AUDIO_MENU),
    MenuEntry::submenu("Clock", &RTC_MENU),
    MenuEntry::submenu("Debug", &DEBUG_MENU),
];

/// The shipped root menu.
pub static DEFAULT_MENU: &[MenuEntry] = &ROOT_MENU;

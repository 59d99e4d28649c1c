//! On-device settings menu.
//!
//! The menu *tree* is static data compiled identically into both halves;
//! only the *cursor* (the `MenuState` inside the runtime block) is mutable
//! and replicated. The navigator below is a bounded-depth stack walker over
//! that tree, plus an idle timeout that backs out of the menu when input
//! stops.

pub mod render;
pub mod tree;

use embassy_time::{Duration, Instant};
use seam_types::ValueText;
use seam_types::runtime::{MENU_INDEX_NONE, MenuState};

use crate::state::SharedState;

/// Navigation events fed to [`MenuNavigator::handle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuInput {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Back,
    Exit,
}

/// Direction handed to a value node's edit handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EditOp {
    /// `right` on the selected value.
    Increment,
    /// `left` on the selected value.
    Decrement,
    /// `enter` on a value-only node.
    Activate,
}

/// Mutates state for one edit step. Returns whether the triggering input
/// should continue to further firmware-level processing (`false` = fully
/// consumed, the usual case).
pub type EditHandler = fn(&mut SharedState, EditOp) -> bool;

/// Formats the current value as a short string. Output longer than
/// [`seam_types::VALUE_TEXT_LEN`] is truncated.
pub type RenderHandler = fn(&SharedState, &mut ValueText);

/// The edit/render pair bound to a value node.
#[derive(Clone, Copy)]
pub struct MenuValue {
    pub edit: EditHandler,
    pub render: RenderHandler,
}

/// A node in the static menu tree. A node with children is a submenu; a node
/// with a value is editable; a node with both opens as a submenu on `enter`
/// and still edits on `left`/`right`.
pub struct MenuEntry {
    pub label: &'static str,
    pub children: &'static [MenuEntry],
    pub value: Option<MenuValue>,
}

impl MenuEntry {
    pub const fn submenu(label: &'static str, children: &'static [MenuEntry]) -> Self {
        Self {
            label,
            children,
            value: None,
        }
    }

    pub const fn value(label: &'static str, edit: EditHandler, render: RenderHandler) -> Self {
        Self {
            label,
            children: &[],
            value: Some(MenuValue { edit, render }),
        }
    }
}

/// Auto-exit the menu after this long without input.
pub const MENU_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Stack-based walker over a static menu tree, driving the replicated
/// [`MenuState`] cursor.
pub struct MenuNavigator {
    root: &'static [MenuEntry],
    /// Idle auto-exit deadline; `None` while the menu is closed. Polled by
    /// the housekeeping tick rather than scheduled, so "cancel" is a plain
    /// overwrite.
    deadline: Option<Instant>,
    /// Scroll offset of the last rendered window, kept for minimal-movement
    /// scrolling.
    scroll: usize,
}

impl MenuNavigator {
    pub fn new(root: &'static [MenuEntry]) -> Self {
        Self {
            root,
            deadline: None,
            scroll: 0,
        }
    }

    /// The children of the submenu the cursor currently points into, or
    /// `None` if the replicated stack does not resolve against this build's
    /// tree (possible right after a version-skewed merge).
    pub fn current_children(&self, menu: &MenuState) -> Option<&'static [MenuEntry]> {
        let mut children = self.root;
        for &index in menu.stack.iter() {
            if index == MENU_INDEX_NONE {
                break;
            }
            children = children.get(index as usize)?.children;
            if children.is_empty() {
                return None;
            }
        }
        Some(children)
    }

    fn selected_entry(&self, menu: &MenuState) -> Option<&'static MenuEntry> {
        self.current_children(menu)?.get(menu.selected as usize)
    }

    /// Open the menu from idle, selecting the first root entry.
    pub fn open(&mut self, state: &mut SharedState, now: Instant) {
        let menu = &mut state.runtime.menu;
        menu.reset();
        menu.active = true;
        menu.selected = 0;
        menu.dirty = true;
        self.scroll = 0;
        self.deadline = Some(now + MENU_IDLE_TIMEOUT);
    }

    /// Close the menu and cancel the idle timeout.
    pub fn exit(&mut self, state: &mut SharedState) {
        state.runtime.menu.reset();
        state.runtime.menu.dirty = true;
        self.deadline = None;
        self.scroll = 0;
    }

    /// Feed one navigation input. Returns whether the input was consumed by
    /// the menu; `false` passes it back to normal key processing.
    pub fn handle(&mut self, state: &mut SharedState, input: MenuInput, now: Instant) -> bool {
        if !state.runtime.menu.active {
            return match input {
                MenuInput::Enter => {
                    self.open(state, now);
                    true
                }
                _ => false,
            };
        }

        if input == MenuInput::Exit {
            self.exit(state);
            return true;
        }

        // Any other input keeps the menu alive. Only inputs that actually
        // move the cursor or run an edit handler mark the block dirty; a
        // no-op must not trigger a redraw or a runtime-block resend.
        self.deadline = Some(now + MENU_IDLE_TIMEOUT);

        match input {
            MenuInput::Up => self.step_selection(state, true),
            MenuInput::Down => self.step_selection(state, false),
            MenuInput::Enter => self.enter(state),
            MenuInput::Back => self.back(state),
            MenuInput::Left => self.edit(state, EditOp::Decrement),
            MenuInput::Right => self.edit(state, EditOp::Increment),
            MenuInput::Exit => unreachable!(),
        }
    }

    /// Issue the auto-exit once the idle deadline passes.
    pub fn poll_timeout(&mut self, state: &mut SharedState, now: Instant) {
        if let Some(deadline) = self.deadline
            && now >= deadline
        {
            debug!("menu idle timeout, exiting");
            self.exit(state);
        }
    }

    fn step_selection(&mut self, state: &mut SharedState, up: bool) -> bool {
        let count = match self.current_children(&state.runtime.menu) {
            Some(children) if !children.is_empty() => children.len(),
            _ => {
                self.exit(state);
                return true;
            }
        };
        let menu = &mut state.runtime.menu;
        let current = (menu.selected as usize).min(count - 1);
        // Wrap at both ends.
        menu.selected = if up {
            ((current + count - 1) % count) as u8
        } else {
            ((current + 1) % count) as u8
        };
        menu.dirty = true;
        true
    }

    fn enter(&mut self, state: &mut SharedState) -> bool {
        let Some(entry) = self.selected_entry(&state.runtime.menu) else {
            return true;
        };
        if !entry.children.is_empty() {
            let selected = state.runtime.menu.selected;
            if state.runtime.menu.push(selected) {
                state.runtime.menu.selected = 0;
                state.runtime.menu.dirty = true;
                self.scroll = 0;
            }
            // On a full stack the cursor stays put; deeper levels simply
            // cannot be expressed.
            true
        } else if let Some(value) = entry.value {
            state.runtime.menu.dirty = true;
            !(value.edit)(state, EditOp::Activate)
        } else {
            true
        }
    }

    fn back(&mut self, state: &mut SharedState) -> bool {
        match state.runtime.menu.pop() {
            Some(index) => {
                state.runtime.menu.selected = index;
                state.runtime.menu.dirty = true;
                self.scroll = 0;
            }
            None => self.exit(state),
        }
        true
    }

    fn edit(&mut self, state: &mut SharedState, op: EditOp) -> bool {
        let Some(entry) = self.selected_entry(&state.runtime.menu) else {
            return true;
        };
        match entry.value {
            Some(value) => {
                state.runtime.menu.dirty = true;
                !(value.edit)(state, op)
            }
            // Left/right on a plain submenu entry does nothing.
            None => true,
        }
    }

    /// Scroll offset keeping the selection visible in `visible_rows`,
    /// moving as little as possible and snapping at the list boundaries.
    pub fn scroll_window(&mut self, menu: &MenuState, visible_rows: usize) -> usize {
        let count = self.current_children(menu).map_or(0, <[MenuEntry]>::len);
        self.scroll = scroll_offset(menu.selected as usize, count, visible_rows, self.scroll);
        self.scroll
    }
}

/// Pure scroll-window computation, split out for direct testing.
pub fn scroll_offset(selected: usize, count: usize, visible: usize, previous: usize) -> usize {
    if visible == 0 || count <= visible {
        return 0;
    }
    let max = count - visible;
    let mut offset = previous.min(max);
    if selected < offset {
        offset = selected;
    } else if selected >= offset + visible {
        offset = selected + 1 - visible;
    }
    offset.min(max)
}

/// Render a value into a fresh text buffer.
pub fn render_value(state: &SharedState, value: &MenuValue) -> ValueText {
    let mut text = ValueText::new();
    (value.render)(state, &mut text);
    text
}

/// Helper for render handlers: formatted write that truncates instead of
/// failing when the output exceeds the buffer capacity.
pub(crate) fn write_truncated(text: &mut ValueText, args: core::fmt::Arguments<'_>) {
    use core::fmt::Write;
    if text.write_fmt(args).is_err() {
        trace!("menu value text truncated");
    }
}

//! Menu drawing.
//!
//! Rendering is pulled by the half that owns a display: whenever the
//! replicated cursor's dirty flag is set, the current window of entries is
//! redrawn through a [`MenuPainter`]. The painter abstracts the actual
//! display so the pass itself stays testable off-target.

use super::{MenuNavigator, render_value};
use crate::state::SharedState;

/// Row-oriented drawing surface for the menu pass.
pub trait MenuPainter {
    /// Number of entry rows the surface can show at once.
    fn rows(&self) -> usize;

    /// Blank the surface.
    fn clear(&mut self);

    /// Draw one entry row. `value` is present for editable leaves.
    fn draw_row(&mut self, row: usize, label: &str, value: Option<&str>, selected: bool);

    /// Push the drawn frame out, for surfaces that buffer.
    fn flush(&mut self) {}
}

/// Redraw the menu if its cursor changed since the last pass. Returns whether
/// anything was drawn; the dirty flag is consumed either way.
pub fn render_menu<P: MenuPainter>(
    nav: &mut MenuNavigator,
    state: &mut SharedState,
    painter: &mut P,
) -> bool {
    if !state.runtime.menu.dirty {
        return false;
    }
    state.runtime.menu.dirty = false;

    painter.clear();
    if !state.runtime.menu.active {
        painter.flush();
        return true;
    }

    let Some(children) = nav.current_children(&state.runtime.menu) else {
        // Replicated stack from a version-skewed build; nothing to show.
        warn!("menu cursor does not resolve against this tree");
        painter.flush();
        return true;
    };

    let visible = painter.rows();
    let offset = nav.scroll_window(&state.runtime.menu, visible);
    let selected = state.runtime.menu.selected as usize;

    for row in 0..visible {
        let Some(entry) = children.get(offset + row) else {
            break;
        };
        match entry.value {
            Some(value) => {
                let text = render_value(state, &value);
                painter.draw_row(row, entry.label, Some(text.as_str()), offset + row == selected);
            }
            None => painter.draw_row(row, entry.label, None, offset + row == selected),
        }
    }
    painter.flush();
    true
}

#[cfg(feature = "display")]
mod oled {
    use embedded_graphics::mono_font::MonoTextStyle;
    use embedded_graphics::mono_font::ascii::FONT_6X10;
    use embedded_graphics::pixelcolor::BinaryColor;
    use embedded_graphics::prelude::*;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
    use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};

    use super::MenuPainter;

    const ROW_HEIGHT: u32 = 12;

    /// [`MenuPainter`] over any monochrome `embedded-graphics` target.
    /// The selected row is drawn inverted.
    pub struct OledPainter<'d, D> {
        target: &'d mut D,
    }

    impl<'d, D> OledPainter<'d, D>
    where
        D: DrawTarget<Color = BinaryColor> + OriginDimensions,
    {
        pub fn new(target: &'d mut D) -> Self {
            Self { target }
        }

        fn row_rect(&self, row: usize) -> Rectangle {
            let width = self.target.size().width;
            Rectangle::new(
                Point::new(0, (row as u32 * ROW_HEIGHT) as i32),
                Size::new(width, ROW_HEIGHT),
            )
        }
    }

    impl<D> MenuPainter for OledPainter<'_, D>
    where
        D: DrawTarget<Color = BinaryColor> + OriginDimensions,
    {
        fn rows(&self) -> usize {
            (self.target.size().height / ROW_HEIGHT) as usize
        }

        fn clear(&mut self) {
            let _ = self.target.clear(BinaryColor::Off);
        }

        fn draw_row(&mut self, row: usize, label: &str, value: Option<&str>, selected: bool) {
            let rect = self.row_rect(row);
            let (fg, bg) = if selected {
                (BinaryColor::Off, BinaryColor::On)
            } else {
                (BinaryColor::On, BinaryColor::Off)
            };
            let _ = rect
                .into_styled(PrimitiveStyle::with_fill(bg))
                .draw(self.target);

            let char_style = MonoTextStyle::new(&FONT_6X10, fg);
            let left = TextStyleBuilder::new()
                .alignment(Alignment::Left)
                .baseline(Baseline::Top)
                .build();
            let _ = Text::with_text_style(
                label,
                rect.top_left + Point::new(1, 1),
                char_style,
                left,
            )
            .draw(self.target);

            if let Some(value) = value {
                let right = TextStyleBuilder::new()
                    .alignment(Alignment::Right)
                    .baseline(Baseline::Top)
                    .build();
                let anchor = Point::new(
                    rect.top_left.x + rect.size.width as i32 - 1,
                    rect.top_left.y + 1,
                );
                let _ = Text::with_text_style(value, anchor, char_style, right).draw(self.target);
            }
        }
    }
}

#[cfg(feature = "display")]
pub use oled::OledPainter;

#[cfg(test)]
mod tests {
    extern crate std;

    use std::string::String;
    use std::vec::Vec;

    use embassy_time::Instant;

    use super::super::tree::DEFAULT_MENU;
    use super::super::{MenuInput, MenuNavigator};
    use super::*;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    #[derive(Default)]
    struct FakePainter {
        rows: usize,
        drawn: Vec<(usize, String, Option<String>, bool)>,
        clears: usize,
    }

    impl MenuPainter for FakePainter {
        fn rows(&self) -> usize {
            self.rows
        }

        fn clear(&mut self) {
            self.clears += 1;
            self.drawn.clear();
        }

        fn draw_row(&mut self, row: usize, label: &str, value: Option<&str>, selected: bool) {
            self.drawn
                .push((row, String::from(label), value.map(String::from), selected));
        }
    }

    fn fake(rows: usize) -> FakePainter {
        FakePainter {
            rows,
            ..FakePainter::default()
        }
    }

    #[test]
    fn clean_cursor_draws_nothing() {
        let mut nav = MenuNavigator::new(DEFAULT_MENU);
        let mut state = SharedState::new();
        let mut painter = fake(4);

        assert!(!render_menu(&mut nav, &mut state, &mut painter));
        assert_eq!(painter.clears, 0);
    }

    #[test]
    fn open_menu_draws_root_window_once() {
        let mut nav = MenuNavigator::new(DEFAULT_MENU);
        let mut state = SharedState::new();
        let mut painter = fake(4);
        nav.open(&mut state, at(0));

        assert!(render_menu(&mut nav, &mut state, &mut painter));
        assert_eq!(painter.drawn.len(), 4);
        assert_eq!(painter.drawn[0].1, "RGB");
        assert!(painter.drawn[0].3);
        assert!(!painter.drawn[1].3);

        // Dirty consumed: a second pass is a no-op.
        assert!(!render_menu(&mut nav, &mut state, &mut painter));
    }

    #[test]
    fn submenu_rows_carry_values() {
        let mut nav = MenuNavigator::new(DEFAULT_MENU);
        let mut state = SharedState::new();
        nav.open(&mut state, at(0));
        nav.handle(&mut state, MenuInput::Enter, at(1));

        let mut painter = fake(4);
        assert!(render_menu(&mut nav, &mut state, &mut painter));
        assert_eq!(painter.drawn[0].1, "Enabled");
        assert_eq!(painter.drawn[0].2.as_deref(), Some("on"));
    }

    #[test]
    fn selection_below_window_scrolls() {
        let mut nav = MenuNavigator::new(DEFAULT_MENU);
        let mut state = SharedState::new();
        nav.open(&mut state, at(0));
        // Into the 8-entry RGB submenu, then cursor to the last entry.
        nav.handle(&mut state, MenuInput::Enter, at(1));
        nav.handle(&mut state, MenuInput::Up, at(2));

        let mut painter = fake(4);
        assert!(render_menu(&mut nav, &mut state, &mut painter));
        // Window snapped to the bottom; last drawn row is selected.
        assert_eq!(painter.drawn.len(), 4);
        assert_eq!(painter.drawn[3].1, "Idle Dim");
        assert!(painter.drawn[3].3);
    }

    #[test]
    fn exit_blanks_the_surface() {
        let mut nav = MenuNavigator::new(DEFAULT_MENU);
        let mut state = SharedState::new();
        nav.open(&mut state, at(0));
        let mut painter = fake(4);
        render_menu(&mut nav, &mut state, &mut painter);

        nav.handle(&mut state, MenuInput::Exit, at(1));
        assert!(render_menu(&mut nav, &mut state, &mut painter));
        assert!(painter.drawn.is_empty());
    }
}

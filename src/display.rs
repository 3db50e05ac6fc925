//! Character display for the scoreboard
//!
//! The scoreboard talks to a 16x2 character interface ([`CharacterDisplay`]).
//! [`TextLcd`] provides that interface on any embedded-graphics RGB565 panel
//! (the ST7735 on the board) by keeping a character grid and redrawing the
//! rows that changed.

use defmt_or_log as log;
use embedded_graphics::mono_font::ascii::FONT_10X20;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};

use crate::config::{DISPLAY_HEIGHT, DISPLAY_WIDTH, GLYPH_HEIGHT, GLYPH_WIDTH, LCD_COLS, LCD_ROWS};

/// Cursor-based character display, modelled on an HD44780 style LCD
pub trait CharacterDisplay {
    /// Blank every cell and home the cursor
    fn clear(&mut self);
    /// Move the cursor to `row`/`col` and write `text` from there
    fn write_at(&mut self, row: usize, col: usize, text: &str);
    /// Write one character at the cursor and advance it
    fn write_char(&mut self, c: char);
    /// Write `text` at the cursor
    fn write_text(&mut self, text: &str);
}

const BLANK: u8 = b' ';
const _: () = assert!(LCD_COLS as u32 * GLYPH_WIDTH <= DISPLAY_WIDTH);
const _: () = assert!(LCD_ROWS as u32 * GLYPH_HEIGHT <= DISPLAY_HEIGHT);
const TOP_MARGIN: i32 = ((DISPLAY_HEIGHT - LCD_ROWS as u32 * GLYPH_HEIGHT) / 2) as i32;

// ===================================================================
// Text Grid on an embedded-graphics Target
// ===================================================================

pub struct TextLcd<D> {
    target: D,
    cells: [[u8; LCD_COLS]; LCD_ROWS],
    dirty: [bool; LCD_ROWS],
    row: usize,
    col: usize,
    foreground: Rgb565,
    background: Rgb565,
}

impl<D> TextLcd<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    pub fn new(target: D) -> Self {
        Self {
            target,
            cells: [[BLANK; LCD_COLS]; LCD_ROWS],
            dirty: [false; LCD_ROWS],
            row: 0,
            col: 0,
            foreground: Rgb565::WHITE,
            background: Rgb565::BLACK,
        }
    }

    /// Current contents of one row, padded with spaces
    pub fn row_text(&self, row: usize) -> &str {
        self.cells
            .get(row)
            .and_then(|cells| core::str::from_utf8(cells).ok())
            .unwrap_or("")
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub fn target(&self) -> &D {
        &self.target
    }

    pub fn into_inner(self) -> D {
        self.target
    }

    fn put(&mut self, c: char) {
        if self.row < LCD_ROWS && self.col < LCD_COLS {
            // The panel font only covers printable ASCII
            let byte = if c.is_ascii() && !c.is_ascii_control() { c as u8 } else { b'?' };
            self.cells[self.row][self.col] = byte;
            self.dirty[self.row] = true;
        }
        self.col = self.col.saturating_add(1);
    }

    fn flush(&mut self) {
        let style = MonoTextStyle::new(&FONT_10X20, self.foreground);
        let fill = PrimitiveStyle::with_fill(self.background);

        for row in 0..LCD_ROWS {
            if !self.dirty[row] {
                continue;
            }
            self.dirty[row] = false;

            let origin = Point::new(0, TOP_MARGIN + (row as u32 * GLYPH_HEIGHT) as i32);
            let band = Rectangle::new(origin, Size::new(DISPLAY_WIDTH, GLYPH_HEIGHT));
            let text = core::str::from_utf8(&self.cells[row]).unwrap_or("");

            let drawn = band
                .into_styled(fill)
                .draw(&mut self.target)
                .and_then(|_| Text::with_baseline(text, origin, style, Baseline::Top).draw(&mut self.target));
            if drawn.is_err() {
                log::warn!("Display row {} draw failed", row);
            }
        }
    }
}

impl<D> CharacterDisplay for TextLcd<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    fn clear(&mut self) {
        self.cells = [[BLANK; LCD_COLS]; LCD_ROWS];
        self.dirty = [false; LCD_ROWS];
        self.row = 0;
        self.col = 0;
        if self.target.clear(self.background).is_err() {
            log::warn!("Display clear failed");
        }
    }

    fn write_at(&mut self, row: usize, col: usize, text: &str) {
        self.row = row;
        self.col = col;
        self.write_text(text);
    }

    fn write_char(&mut self, c: char) {
        self.put(c);
        self.flush();
    }

    fn write_text(&mut self, text: &str) {
        for c in text.chars() {
            self.put(c);
        }
        self.flush();
    }
}

use crate::canvas::PixelCanvas;
use anyhow::Context;
use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

/// Braille sub-pixels per terminal cell.
pub(crate) const DOTS_X: u32 = 2;
pub(crate) const DOTS_Y: u32 = 4;

/// Minimum alpha for a sub-pixel to count as ink.
const INK_ALPHA: u8 = 32;

/// One terminal cell, drawn on the terminal's own background.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
}

impl Cell {
    pub(crate) const BLANK: Cell = Cell {
        ch: ' ',
        fg: Color::Reset,
    };

    pub(crate) fn new(ch: char, fg: Color) -> Self {
        Self { ch, fg }
    }
}

/// Row-major grid of cells. Writes outside the grid are dropped.
pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::BLANK; w as usize * h as usize],
        }
    }

    fn offset(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.w && y < self.h).then(|| y as usize * self.w as usize + x as usize)
    }

    pub(crate) fn get(&self, x: u16, y: u16) -> Option<Cell> {
        self.offset(x, y).map(|i| self.cells[i])
    }

    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if let Some(i) = self.offset(x, y) {
            self.cells[i] = c;
        }
    }

    pub(crate) fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }
}

/// Raw-mode alternate screen with mouse capture. `frame` is composed each
/// tick and `present` sends only the cells that differ from what is shown.
pub(crate) struct Terminal {
    out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    shown: CellBuffer,
    pub(crate) frame: CellBuffer,
    /// Braille dots for the garden rows.
    pub(crate) canvas: PixelCanvas,
    status_rows: u16,
}

impl Terminal {
    pub(crate) fn begin(status_rows: u16) -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            EnableMouseCapture,
            Clear(ClearType::All)
        )
        .context("failed to enter the alternate screen")?;
        terminal::enable_raw_mode().context("failed to enable raw mode")?;

        let (cols, rows) = terminal::size().context("failed to read the terminal size")?;
        Ok(Self {
            out,
            cols,
            rows,
            shown: CellBuffer::new(cols, rows),
            frame: CellBuffer::new(cols, rows),
            canvas: canvas_for(cols, rows, status_rows),
            status_rows,
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        execute!(
            self.out,
            ResetColor,
            DisableMouseCapture,
            EnableLineWrap,
            cursor::Show,
            LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    /// Rebuilds the grids and canvas after a size change. Returns whether
    /// anything changed.
    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (cols, rows) = terminal::size()?;
        if (cols, rows) == (self.cols, self.rows) {
            return Ok(false);
        }
        self.cols = cols;
        self.rows = rows;
        self.shown = CellBuffer::new(cols, rows);
        self.frame = CellBuffer::new(cols, rows);
        self.canvas = canvas_for(cols, rows, self.status_rows);
        queue!(self.out, ResetColor, Clear(ClearType::All))?;
        Ok(true)
    }

    pub(crate) fn garden_rows(&self) -> u16 {
        self.rows.saturating_sub(self.status_rows)
    }

    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let width = self.frame.w as usize;
        let mut fg = None;
        // where the terminal cursor sits after the last print
        let mut cursor_at = None;
        for (i, (new, old)) in self.frame.cells.iter().zip(&self.shown.cells).enumerate() {
            if new == old {
                continue;
            }
            let x = (i % width) as u16;
            let y = (i / width) as u16;
            if cursor_at != Some((x, y)) {
                queue!(self.out, cursor::MoveTo(x, y))?;
            }
            if fg != Some(new.fg) {
                queue!(self.out, SetForegroundColor(new.fg))?;
                fg = Some(new.fg);
            }
            queue!(self.out, Print(new.ch))?;
            cursor_at = Some((x + 1, y));
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.shown.cells.copy_from_slice(&self.frame.cells);
        Ok(())
    }
}

fn canvas_for(cols: u16, rows: u16, status_rows: u16) -> PixelCanvas {
    let garden_rows = rows.saturating_sub(status_rows);
    PixelCanvas::new(cols as u32 * DOTS_X, garden_rows as u32 * DOTS_Y)
}

/* -----------------------------
   Braille encoding: 2×4 pixels -> U+2800..U+28FF
------------------------------ */

pub(crate) fn braille_bit(dx: u32, dy: u32) -> u8 {
    // Dot mapping:
    // (0,0)=1 (0,1)=2 (0,2)=4 (0,3)=64
    // (1,0)=8 (1,1)=16 (1,2)=32 (1,3)=128
    match (dx, dy) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0x00,
    }
}

/// Folds every 2×4 block of `canvas` into one braille cell of `out`, coloured
/// with the average of its inked dots.
pub(crate) fn canvas_to_cells(canvas: &PixelCanvas, out: &mut CellBuffer, enable_color: bool) {
    let cols = out.w as u32;
    let rows = (canvas.h / DOTS_Y).min(out.h as u32);

    for cy in 0..rows {
        for cx in 0..cols {
            let px0 = cx * DOTS_X;
            let py0 = cy * DOTS_Y;

            let mut mask: u8 = 0;
            let mut sum = [0u32; 3];
            let mut ink_count: u32 = 0;

            for dy in 0..DOTS_Y {
                for dx in 0..DOTS_X {
                    let Some(p) = canvas.pixel(px0 + dx, py0 + dy) else {
                        continue;
                    };
                    if p.a >= INK_ALPHA {
                        mask |= braille_bit(dx, dy);
                        sum[0] += p.r as u32;
                        sum[1] += p.g as u32;
                        sum[2] += p.b as u32;
                        ink_count += 1;
                    }
                }
            }

            if mask == 0 {
                continue;
            }
            let ch = char::from_u32(0x2800 + mask as u32).unwrap_or(' ');
            let fg = if enable_color {
                Color::Rgb {
                    r: (sum[0] / ink_count) as u8,
                    g: (sum[1] / ink_count) as u8,
                    b: (sum[2] / ink_count) as u8,
                }
            } else {
                Color::White
            };

            out.set(cx as u16, cy as u16, Cell::new(ch, fg));
        }
    }
}

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color) {
    for (ch, col) in s.chars().zip(x..buf.w) {
        buf.set(col, y, Cell::new(ch, fg));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{Paint, Path, Rgba, Surface};

    fn cell(buf: &CellBuffer, x: u16, y: u16) -> Cell {
        buf.get(x, y).unwrap()
    }

    #[test]
    fn each_dot_has_its_own_bit() {
        let mut seen = 0u8;
        for dy in 0..DOTS_Y {
            for dx in 0..DOTS_X {
                let bit = braille_bit(dx, dy);
                assert_eq!(bit.count_ones(), 1);
                assert_eq!(seen & bit, 0);
                seen |= bit;
            }
        }
        assert_eq!(seen, 0xff);
        assert_eq!(braille_bit(2, 0), 0);
    }

    #[test]
    fn full_block_becomes_a_full_braille_cell() {
        let mut canvas = PixelCanvas::new(4, 4);
        let mut square = Path::new();
        square
            .move_to(0.0, 0.0)
            .line_to(2.0, 0.0)
            .line_to(2.0, 4.0)
            .line_to(0.0, 4.0)
            .close();
        canvas.fill_path(&square, &Paint::Solid(Rgba::hex(0x336699)));

        let mut buf = CellBuffer::new(2, 2);
        canvas_to_cells(&canvas, &mut buf, true);
        let left = cell(&buf, 0, 0);
        assert_eq!(left.ch, '\u{28ff}');
        assert_eq!(left.fg, Color::Rgb { r: 0x33, g: 0x66, b: 0x99 });
        assert_eq!(cell(&buf, 1, 0).ch, ' ');
        // rows past the canvas stay untouched
        assert_eq!(cell(&buf, 0, 1), Cell::BLANK);
    }

    #[test]
    fn faint_ink_is_ignored_and_mono_is_white() {
        let mut canvas = PixelCanvas::new(2, 4);
        canvas.px[0] = Rgba::hex(0xff0000).with_alpha(0.05);
        canvas.px[1] = Rgba::hex(0xff0000);
        let mut buf = CellBuffer::new(1, 1);
        canvas_to_cells(&canvas, &mut buf, false);
        let c = cell(&buf, 0, 0);
        assert_eq!(c.ch, char::from_u32(0x2800 + 0x08).unwrap());
        assert_eq!(c.fg, Color::White);
    }

    #[test]
    fn text_is_clipped_to_the_buffer() {
        let mut buf = CellBuffer::new(4, 1);
        draw_text(&mut buf, 2, 0, "hello", Color::Yellow);
        assert_eq!(cell(&buf, 2, 0), Cell::new('h', Color::Yellow));
        assert_eq!(cell(&buf, 3, 0).ch, 'e');
        assert_eq!(cell(&buf, 0, 0), Cell::BLANK);
        assert_eq!(buf.get(4, 0), None);
    }

    #[test]
    fn clear_blanks_every_cell() {
        let mut buf = CellBuffer::new(3, 2);
        buf.set(1, 1, Cell::new('x', Color::Red));
        buf.set(9, 9, Cell::new('y', Color::Red));
        assert_eq!(cell(&buf, 1, 1).ch, 'x');
        buf.clear();
        assert!(buf.cells.iter().all(|c| *c == Cell::BLANK));
    }
}

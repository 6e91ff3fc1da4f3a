//! Clipped drawing surface
//!
//! A [`Surface`] is a window onto a rectangle of a ratatui [`Buffer`].
//! Coordinates are relative to the rectangle, and anything that would land
//! outside it is cut off or skipped. Callers never have to bounds-check.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Span;
use ratatui::widgets::{Block, Clear, Widget};

use hawk_core::text::{fit_title, wrap_lines};

use super::theme::styles;

/// Marker shown in every pane title
pub const HEADER: &str = "▛▞//";

pub struct Surface<'a> {
    buf: &'a mut Buffer,
    area: Rect,
}

impl<'a> Surface<'a> {
    pub fn new(buf: &'a mut Buffer, area: Rect) -> Self {
        let area = area.intersection(buf.area);
        Self { buf, area }
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn width(&self) -> u16 {
        self.area.width
    }

    pub fn height(&self) -> u16 {
        self.area.height
    }

    /// A surface over `area` (absolute coordinates), clipped to this one
    pub fn region(&mut self, area: Rect) -> Surface<'_> {
        Surface {
            area: area.intersection(self.area),
            buf: &mut *self.buf,
        }
    }

    /// Write `text` at (`x`, `y`), truncated one column short of the right
    /// edge so a pane border is never overwritten. Rows and columns outside
    /// the surface are ignored.
    pub fn put(&mut self, y: u16, x: u16, text: &str, style: Style) {
        if y >= self.area.height || x >= self.area.width {
            return;
        }
        let max = (self.area.width - x - 1) as usize;
        if max == 0 {
            return;
        }
        self.buf.set_stringn(
            self.area.x + x,
            self.area.y + y,
            sanitize(text),
            max,
            style,
        );
    }

    /// Word-wrap `text` to `width` and write up to `max_lines` rows starting
    /// at `y`. Returns the number of rows produced by the wrap.
    pub fn put_wrapped(
        &mut self,
        y: u16,
        x: u16,
        text: &str,
        width: usize,
        style: Style,
        max_lines: Option<usize>,
    ) -> usize {
        let mut lines = wrap_lines(text, width);
        if let Some(max) = max_lines {
            lines.truncate(max);
        }
        for (i, line) in lines.iter().enumerate() {
            let Ok(offset) = u16::try_from(i) else {
                break;
            };
            self.put(y.saturating_add(offset), x, line, style);
        }
        lines.len()
    }

    /// Paint a whole row with `style`
    pub fn fill_row(&mut self, y: u16, style: Style) {
        if y >= self.area.height {
            return;
        }
        let row = Rect::new(self.area.x, self.area.y + y, self.area.width, 1);
        self.buf.set_style(row, style);
    }

    /// Blank the surface
    pub fn clear(&mut self) {
        Clear.render(self.area, self.buf);
    }

    /// Clear, draw a border, and put ` ▛▞// <title> ` on the top edge
    pub fn boxed(&mut self, title: &str) {
        self.clear();
        let label = format!(" {} {} ", HEADER, title);
        Block::bordered()
            .border_style(styles::border())
            .title(Span::styled(
                fit_title(&label, self.area.width),
                styles::title(),
            ))
            .render(self.area, self.buf);
    }
}

/// Control characters would move the terminal cursor; show them as spaces
fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

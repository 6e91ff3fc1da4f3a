//! Five-pane layout
//!
//! A banner row on top, then nav | main | ops | chat side by side with
//! one-column gutters. Main and ops are each split into a top and a bottom
//! sub-pane. Below the minimum size no panes are produced at all.

use ratatui::layout::Rect;

pub const MIN_WIDTH: u16 = 150;
pub const MIN_HEIGHT: u16 = 28;

pub const NAV_WIDTH: u16 = 30;
pub const CHAT_WIDTH: u16 = 30;
pub const GUTTER: u16 = 1;
pub const MAIN_MIN_WIDTH: u16 = 52;
pub const OPS_MIN_WIDTH: u16 = 28;

const SPLIT_GAP: u16 = 1;
const MAIN_SPLIT_MIN: u16 = 3;
const OPS_SPLIT_MIN: u16 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScreenLayout {
    TooSmall { width: u16, height: u16 },
    Panes(Panes),
}

/// Top and bottom regions inside a bordered pane
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Split {
    pub top: Rect,
    /// The one-row gap between `top` and `bottom`
    pub gap: Rect,
    pub bottom: Rect,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Panes {
    pub banner: Rect,
    pub nav: Rect,
    pub main: Rect,
    pub main_split: Split,
    pub ops: Rect,
    pub ops_split: Split,
    pub chat: Rect,
}

impl ScreenLayout {
    pub fn compute(area: Rect) -> Self {
        if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
            return ScreenLayout::TooSmall {
                width: area.width,
                height: area.height,
            };
        }

        let body_y = area.y + 1;
        let body_h = area.height - 1;
        let core_w = area.width - NAV_WIDTH - CHAT_WIDTH - 3 * GUTTER;
        let (main_w, ops_w) = column_widths(core_w);

        let main_x = area.x + NAV_WIDTH + GUTTER;
        let ops_x = main_x + main_w + GUTTER;
        let chat_x = ops_x + ops_w + GUTTER;

        let main = Rect::new(main_x, body_y, main_w, body_h);
        let ops = Rect::new(ops_x, body_y, ops_w, body_h);

        ScreenLayout::Panes(Panes {
            banner: Rect::new(area.x, area.y, area.width, 1),
            nav: Rect::new(area.x, body_y, NAV_WIDTH, body_h),
            main,
            main_split: split(main, MAIN_SPLIT_MIN),
            ops,
            ops_split: split(ops, OPS_SPLIT_MIN),
            chat: Rect::new(chat_x, body_y, CHAT_WIDTH, body_h),
        })
    }
}

/// Main gets two thirds of the core width (at least 52 columns); ops gets
/// the rest, and main gives columns back when ops would drop below 28.
pub fn column_widths(core_w: u16) -> (u16, u16) {
    let two_thirds = (u32::from(core_w) * 2 / 3) as u16;
    let mut main_w = MAIN_MIN_WIDTH.max(two_thirds);
    let mut ops_w = core_w.saturating_sub(main_w);
    if ops_w < OPS_MIN_WIDTH {
        main_w = main_w.saturating_sub(OPS_MIN_WIDTH - ops_w);
        ops_w = core_w.saturating_sub(main_w);
    }
    (main_w, ops_w)
}

/// Split the interior of a bordered pane. Each half is at least `min` rows;
/// the bottom half absorbs the odd row. Nothing extends past the border.
pub fn split(pane: Rect, min: u16) -> Split {
    let inner_x = pane.x + 1;
    let inner_w = pane.width.saturating_sub(2);
    let inner_h = pane.height.saturating_sub(2);
    let inner_bottom = pane.y + 1 + inner_h;

    let top_h = min.max(inner_h.saturating_sub(SPLIT_GAP) / 2);
    let bottom_h = min.max(inner_h.saturating_sub(top_h + SPLIT_GAP));

    let top = clamp_rows(Rect::new(inner_x, pane.y + 1, inner_w, top_h), inner_bottom);
    let gap = clamp_rows(Rect::new(inner_x, top.bottom(), inner_w, SPLIT_GAP), inner_bottom);
    let bottom = clamp_rows(
        Rect::new(inner_x, top.bottom() + SPLIT_GAP, inner_w, bottom_h),
        inner_bottom,
    );
    Split { top, gap, bottom }
}

fn clamp_rows(rect: Rect, limit: u16) -> Rect {
    let y = rect.y.min(limit);
    Rect {
        y,
        height: rect.height.min(limit - y),
        ..rect
    }
}

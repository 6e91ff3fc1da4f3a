//! Terminal UI: layout, clipped surface, pane renderers and theme

pub mod layout;
pub mod render;
pub mod surface;
pub mod theme;

use std::time::Duration;

use ratatui::Frame;

use hawk_core::config::HawkConfig;
use hawk_core::state::Snapshot;

/// Liveness indicator frames
pub const MOTION: [&str; 8] = ["|", "/", "-", "-", "-", "-", "\\", "|"];
pub const MOTION_FPS: u128 = 6;

/// Indicator frame for a point in time since the console started
pub fn motion_frame(elapsed: Duration) -> &'static str {
    let tick = elapsed.as_millis() * MOTION_FPS / 1000;
    MOTION[(tick % MOTION.len() as u128) as usize]
}

/// Everything a render pass reads
pub struct View<'a> {
    pub snap: &'a Snapshot,
    pub config: &'a HawkConfig,
    pub frame: &'static str,
    /// Banner clock, `HH:MM:SS`
    pub clock: String,
    pub flash: Option<&'a str>,
}

pub fn draw(f: &mut Frame, view: &View) {
    let area = f.area();
    render::screen(f.buffer_mut(), area, view);
}

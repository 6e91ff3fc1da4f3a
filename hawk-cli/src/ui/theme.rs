//! UI Theme Module - color palette and style helpers
//!
//! Every pane pulls its colors from one [`Palette`] so the orange-accent
//! console look stays consistent. Renderers use the `styles` shortcuts.

use ratatui::style::{Color, Modifier, Style};

/// Color palette tokens for the theme
#[derive(Clone, Debug)]
pub struct Palette {
    /// Accent color (pane titles, selection, headings)
    pub accent: Color,
    /// Foreground of the banner row and prompt
    pub banner_fg: Color,
    /// Box borders and the ops divider
    pub border: Color,
    /// Secondary info (card frames of unselected sections)
    pub dim: Color,
    /// Tertiary info (hints, sub-bullets)
    pub muted: Color,
    /// SERVING rows and counts
    pub good: Color,
    /// Everything not SERVING
    pub bad: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self::orange()
    }
}

impl Palette {
    /// 256-color orange on the terminal's own background
    pub fn orange() -> Self {
        Self {
            accent: Color::Indexed(208),
            banner_fg: Color::Black,
            border: Color::Reset,
            dim: Color::Cyan,
            muted: Color::Indexed(245),
            good: Color::Green,
            bad: Color::Red,
        }
    }
}

/// Theme configuration
#[derive(Clone, Debug, Default)]
pub struct Theme {
    pub palette: Palette,
}

impl Theme {
    /// Pane title on the top border
    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.palette.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.palette.border)
    }

    /// Banner row and the note prompt
    pub fn banner_style(&self) -> Style {
        Style::default()
            .fg(self.palette.banner_fg)
            .bg(self.palette.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn accent_style(&self) -> Style {
        Style::default().fg(self.palette.accent)
    }

    pub fn dim_style(&self) -> Style {
        Style::default().fg(self.palette.dim)
    }

    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.palette.muted)
    }

    /// Selected catalog row
    pub fn selection_style(&self) -> Style {
        Style::default()
            .fg(self.palette.accent)
            .add_modifier(Modifier::BOLD | Modifier::REVERSED)
    }

    /// Color for a health status string
    pub fn health_style(&self, serving: bool) -> Style {
        let color = if serving {
            self.palette.good
        } else {
            self.palette.bad
        };
        Style::default().fg(color)
    }
}

static DEFAULT_THEME: std::sync::OnceLock<Theme> = std::sync::OnceLock::new();

/// Get the default theme
pub fn theme() -> &'static Theme {
    DEFAULT_THEME.get_or_init(Theme::default)
}

/// Convenience re-exports for common use cases
pub mod styles {
    use super::*;

    pub fn title() -> Style {
        theme().title_style()
    }

    pub fn border() -> Style {
        theme().border_style()
    }

    pub fn banner() -> Style {
        theme().banner_style()
    }

    pub fn accent() -> Style {
        theme().accent_style()
    }

    pub fn accent_bold() -> Style {
        theme().title_style()
    }

    pub fn dim() -> Style {
        theme().dim_style()
    }

    pub fn muted() -> Style {
        theme().muted_style()
    }

    pub fn faint() -> Style {
        Style::default().add_modifier(Modifier::DIM)
    }

    pub fn bold() -> Style {
        Style::default().add_modifier(Modifier::BOLD)
    }

    pub fn text() -> Style {
        Style::default()
    }

    pub fn selection() -> Style {
        theme().selection_style()
    }

    pub fn health(serving: bool) -> Style {
        theme().health_style(serving)
    }

    pub fn good_bold() -> Style {
        theme().health_style(true).add_modifier(Modifier::BOLD)
    }

    pub fn bad_bold() -> Style {
        theme().health_style(false).add_modifier(Modifier::BOLD)
    }
}

//! Theme and styling definitions for the lineview dashboard.

use ratatui::style::{Color, Modifier, Style};

/// Color palette for the TUI.
pub struct Palette;

impl Palette {
    // Base colors
    pub const BG: Color = Color::Rgb(30, 30, 40);
    pub const FG: Color = Color::Rgb(220, 220, 230);
    pub const DIM: Color = Color::Rgb(140, 140, 160);

    // Accent colors
    pub const ACCENT: Color = Color::Rgb(130, 170, 255);
    pub const ACCENT_DIM: Color = Color::Rgb(80, 100, 160);

    // Status bar colors (high contrast)
    pub const STATUS_BG: Color = Color::Rgb(45, 45, 60);
    pub const STATUS_KEY_BG: Color = Color::Rgb(70, 90, 140);

    // Status colors
    pub const WARNING: Color = Color::Rgb(240, 200, 100);
    pub const ERROR: Color = Color::Rgb(240, 100, 100);

    // Border colors
    pub const BORDER: Color = Color::Rgb(80, 80, 100);
    pub const BORDER_ACTIVE: Color = Color::Rgb(130, 170, 255);

    // Table
    pub const ROW_SELECTED_BG: Color = Color::Rgb(55, 60, 85);
}

/// Glyphs used by the slider and status line (ASCII only).
pub struct Symbols;

impl Symbols {
    pub const TRACK: char = '-';
    pub const TRACK_SELECTED: char = '=';
    pub const TICK: char = '+';
    pub const HANDLE: char = 'o';
    pub const HANDLE_ACTIVE: char = '@';
    pub const ROW_MARKER: &'static str = "> ";
    pub const SPINNER: [&'static str; 4] = ["|", "/", "-", "\\"];
}

/// Common styles used throughout the TUI.
pub struct Styles;

impl Styles {
    /// Default text style.
    pub fn default() -> Style {
        Style::default().fg(Palette::FG).bg(Palette::BG)
    }

    /// Dimmed text for secondary information.
    pub fn dim() -> Style {
        Style::default().fg(Palette::DIM).bg(Palette::BG)
    }

    /// Highlighted/selected item.
    pub fn highlight() -> Style {
        Style::default()
            .fg(Palette::ACCENT)
            .bg(Palette::BG)
            .add_modifier(Modifier::BOLD)
    }

    /// Active/focused element.
    pub fn active() -> Style {
        Style::default().fg(Palette::ACCENT).bg(Palette::BG)
    }

    /// Selected part of the slider track.
    pub fn selected_track() -> Style {
        Style::default().fg(Palette::ACCENT_DIM).bg(Palette::BG)
    }

    /// Warning status.
    pub fn warning() -> Style {
        Style::default().fg(Palette::WARNING).bg(Palette::BG)
    }

    /// Error status.
    pub fn error() -> Style {
        Style::default().fg(Palette::ERROR).bg(Palette::BG)
    }

    /// Title style.
    pub fn title() -> Style {
        Style::default()
            .fg(Palette::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    /// Table header row.
    pub fn table_header() -> Style {
        Style::default()
            .fg(Palette::DIM)
            .bg(Palette::BG)
            .add_modifier(Modifier::BOLD)
    }

    /// Selected table row.
    pub fn row_selected() -> Style {
        Style::default()
            .fg(Palette::FG)
            .bg(Palette::ROW_SELECTED_BG)
            .add_modifier(Modifier::BOLD)
    }

    /// Key hint style (for status bar) - bright on dark for visibility.
    pub fn key_hint() -> Style {
        Style::default()
            .fg(Palette::FG)
            .bg(Palette::STATUS_KEY_BG)
            .add_modifier(Modifier::BOLD)
    }

    /// Key hint label style - readable on status bar background.
    pub fn key_label() -> Style {
        Style::default().fg(Palette::FG).bg(Palette::STATUS_BG)
    }

    /// Status bar background style.
    pub fn status_bar() -> Style {
        Style::default().fg(Palette::FG).bg(Palette::STATUS_BG)
    }

    /// Border style for inactive elements.
    pub fn border() -> Style {
        Style::default().fg(Palette::BORDER)
    }

    /// Border style for active/focused elements.
    pub fn border_active() -> Style {
        Style::default().fg(Palette::BORDER_ACTIVE)
    }

    /// Border style for a field, depending on focus.
    pub fn border_for(focused: bool) -> Style {
        if focused {
            Self::border_active()
        } else {
            Self::border()
        }
    }
}

/// Spinner frame for the given tick counter.
pub fn spinner(tick: usize) -> &'static str {
    Symbols::SPINNER[tick % Symbols::SPINNER.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_cycles() {
        assert_eq!(spinner(0), "|");
        assert_eq!(spinner(3), "\\");
        assert_eq!(spinner(4), "|");
    }

    #[test]
    fn test_border_for_focus() {
        assert_eq!(Styles::border_for(true), Styles::border_active());
        assert_eq!(Styles::border_for(false), Styles::border());
    }
}

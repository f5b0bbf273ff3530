//! Screen definitions for the lineview TUI.

pub mod dashboard;

use crate::app::App;
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

/// Trait for screens that can be rendered.
pub trait Screen {
    /// Render the screen to the buffer.
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer);
}

/// Render the help overlay.
pub fn render_help_overlay(area: Rect, buf: &mut Buffer) {
    use crate::ui::centered_fixed;
    use crate::ui::theme::Styles;
    use ratatui::widgets::{Block, Borders, Clear, Paragraph};

    let help_text = r"
  Navigation
    Tab / Shift+Tab   Next/prev panel
    /                 Jump to search
    Esc               Revert field / clear search

  Time range
    Left/Right        Move slider handle
    Space             Switch handle
    Enter             Apply date field

  Rows
    Up/Down           Select row
    Enter             Open lineage overview
    n / p             Next/prev page
    r                 Refresh
    q                 Quit
    ?                 Toggle this help

  [Press any key to close]
";

    let width = 56.min(area.width.saturating_sub(4));
    let height = 25.min(area.height.saturating_sub(2));
    let overlay_area = centered_fixed(width, height, area);

    Clear.render(overlay_area, buf);

    let block = Block::default()
        .title(" Help ")
        .title_style(Styles::title())
        .borders(Borders::ALL)
        .border_style(Styles::border_active())
        .style(Styles::default());

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .style(Styles::default());

    paragraph.render(overlay_area, buf);
}

//! Layout helpers for the lineview dashboard.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Height of the slider panel: borders plus track, two legend rows and labels.
pub const SLIDER_HEIGHT: u16 = 6;

/// Height of a bordered single-line input.
pub const FIELD_HEIGHT: u16 = 3;

/// Create a centered rect with fixed dimensions.
pub fn centered_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

/// Create the main layout with status bar at bottom.
pub fn main_layout(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);
    (chunks[0], chunks[1])
}

/// Areas of the dashboard body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardAreas {
    pub slider: Rect,
    pub range: Rect,
    pub from: Rect,
    pub to: Rect,
    pub search: Rect,
    pub table: Rect,
}

/// Split the dashboard body: slider, picker row, search box, table.
pub fn dashboard_layout(area: Rect) -> DashboardAreas {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(SLIDER_HEIGHT),
            Constraint::Length(FIELD_HEIGHT),
            Constraint::Length(FIELD_HEIGHT),
            Constraint::Min(3),
        ])
        .split(area);

    let pickers = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(50),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(rows[1]);

    DashboardAreas {
        slider: rows[0],
        range: pickers[0],
        from: pickers[1],
        to: pickers[2],
        search: rows[2],
        table: rows[3],
    }
}

//! Dashboard screen: time range controls above the execution events table.

use crate::app::{App, Focus};
use crate::screens::Screen;
use crate::ui::theme::{spinner, Styles};
use crate::ui::widgets::{EventsTable, KeyHint, RangeSlider, StatusBar, TextInputState};
use crate::ui::{dashboard_layout, main_layout};
use chrono::Local;
use lineview_engine::format_picker_range;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    widgets::{Block, Borders, Widget},
};

/// The dashboard (only) screen.
pub struct DashboardScreen;

impl Screen for DashboardScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        Block::default().style(Styles::default()).render(area, buf);

        let (main_area, status_area) = main_layout(area);
        let areas = dashboard_layout(main_area);

        render_slider(app, areas.slider, buf);
        render_field(app, Focus::Range, " Range ", "YYYY-MM-DD..YYYY-MM-DD", areas.range, buf);
        render_field(app, Focus::From, " From ", "YYYY-MM-DD", areas.from, buf);
        render_field(app, Focus::To, " To ", "YYYY-MM-DD", areas.to, buf);
        render_field(app, Focus::Search, " Search ", "filter rows on this page", areas.search, buf);
        render_table(app, areas.table, buf);
        render_status(app, status_area, buf);
    }
}

fn panel(title: &str, focused: bool) -> Block<'_> {
    Block::default()
        .title(title)
        .title_style(Styles::title())
        .borders(Borders::ALL)
        .border_style(Styles::border_for(focused))
        .style(Styles::default())
}

fn render_slider(app: &App, area: Rect, buf: &mut Buffer) {
    let interval = app.selector.interval();
    let title = format!(
        " Time range {} ",
        format_picker_range(interval.start_ms(), interval.end_ms(), &Local)
    );
    let (low, high) = app.slider_labels();

    RangeSlider::new(app.selector.ticks(), app.selector.selection())
        .focused(app.focus == Focus::Slider)
        .active(app.handle)
        .labels(&low, &high)
        .block(panel(&title, app.focus == Focus::Slider))
        .render(area, buf);
}

fn render_field(
    app: &App,
    focus: Focus,
    title: &str,
    placeholder: &str,
    area: Rect,
    buf: &mut Buffer,
) {
    let input: &TextInputState = match focus {
        Focus::Range => &app.range_input,
        Focus::From => &app.from_input,
        Focus::To => &app.to_input,
        Focus::Search => &app.search_input,
        Focus::Slider | Focus::Table => return,
    };
    let focused = app.focus == focus;

    input
        .widget()
        .focused(focused)
        .placeholder(placeholder)
        .block(panel(title, focused))
        .render(area, buf);
}

fn render_table(app: &App, area: Rect, buf: &mut Buffer) {
    let focused = app.focus == Focus::Table;
    let block = panel(" Execution events ", focused).title_bottom(page_summary(app));

    let selected = (focused && !app.visible.is_empty()).then_some(app.selected_row);
    EventsTable::new(app.page_rows(), &app.visible)
        .selected(selected)
        .block(block)
        .render(area, buf);
}

/// Footer text such as ` rows 1-10 of 42 `.
fn page_summary(app: &App) -> String {
    let events = &app.state().execution_events;
    let shown = app.page_rows().len() as u64;
    let mut summary = if events.total_count == 0 || shown == 0 {
        " no rows".to_string()
    } else {
        format!(
            " rows {}-{} of {}",
            events.offset + 1,
            events.offset + shown,
            events.total_count
        )
    };
    if !app.search_input.is_empty() {
        summary.push_str(&format!(", {} matching", app.visible.len()));
    }
    summary.push(' ');
    summary
}

fn hints_for(focus: Focus) -> Vec<KeyHint> {
    match focus {
        Focus::Slider => vec![
            KeyHint::new("←/→", "Move"),
            KeyHint::new("Space", "Handle"),
            KeyHint::new("Tab", "Next"),
            KeyHint::new("?", "Help"),
        ],
        Focus::Range | Focus::From | Focus::To => vec![
            KeyHint::new("Enter", "Apply"),
            KeyHint::new("Esc", "Revert"),
            KeyHint::new("Tab", "Next"),
        ],
        Focus::Search => vec![
            KeyHint::new("Enter", "Rows"),
            KeyHint::new("Esc", "Clear"),
            KeyHint::new("Tab", "Next"),
        ],
        Focus::Table => vec![
            KeyHint::new("Enter", "Open"),
            KeyHint::new("n/p", "Page"),
            KeyHint::new("r", "Refresh"),
            KeyHint::new("?", "Help"),
        ],
    }
}

fn render_status(app: &App, area: Rect, buf: &mut Buffer) {
    let events = &app.state().execution_events;
    let (right, style) = if let Some(notification) = &app.notification {
        (notification.clone(), Styles::warning())
    } else if app.is_loading() {
        (format!("{} loading", spinner(app.tick)), Styles::active())
    } else if let Some(error) = &events.error {
        (format!("error: {error}"), Styles::error())
    } else {
        (app.source_label.clone(), Styles::dim())
    };

    StatusBar::new(app.focus.label())
        .hints(hints_for(app.focus))
        .right(&right)
        .right_style(style)
        .render(area, buf);
}

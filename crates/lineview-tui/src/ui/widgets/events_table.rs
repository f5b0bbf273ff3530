//! Execution events table.

use crate::ui::theme::{Styles, Symbols};
use chrono::{Local, TimeZone};
use lineview_engine::ExecutionEvent;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    widgets::{Block, Cell, Row, StatefulWidget, Table, TableState, Widget},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Column headers, in display order.
pub const HEADERS: [&str; 7] = [
    "Framework",
    "Application",
    "App ID",
    "Timestamp",
    "Data source",
    "Type",
    "Mode",
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Table over a subset of rows, given as indices into the page.
#[derive(Debug, Clone)]
pub struct EventsTable<'a> {
    rows: &'a [ExecutionEvent],
    visible: &'a [usize],
    selected: Option<usize>,
    block: Option<Block<'a>>,
}

impl<'a> EventsTable<'a> {
    pub fn new(rows: &'a [ExecutionEvent], visible: &'a [usize]) -> Self {
        Self {
            rows,
            visible,
            selected: None,
            block: None,
        }
    }

    /// Highlight the `selected`-th visible row.
    #[must_use]
    pub fn selected(mut self, selected: Option<usize>) -> Self {
        self.selected = selected;
        self
    }

    #[must_use]
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for EventsTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let widths = [
            Constraint::Length(9),
            Constraint::Min(12),
            Constraint::Length(17),
            Constraint::Length(16),
            Constraint::Min(16),
            Constraint::Length(7),
            Constraint::Length(9),
        ];

        let body: Vec<Row<'_>> = self
            .visible
            .iter()
            .filter_map(|&index| self.rows.get(index))
            .map(|event| {
                Row::new([
                    Cell::from(event.framework_name.as_str()),
                    Cell::from(event.application_name.as_str()),
                    Cell::from(event.application_id.as_str()),
                    Cell::from(format_timestamp(event.timestamp, &Local)),
                    Cell::from(truncate_start(&event.datasource, 28)),
                    Cell::from(event.datasource_type.as_str()),
                    Cell::from(event.write_mode.as_str()),
                ])
            })
            .collect();

        let mut table = Table::new(body, widths)
            .header(Row::new(HEADERS).style(Styles::table_header()))
            .style(Styles::default())
            .row_highlight_style(Styles::row_selected())
            .highlight_symbol(Symbols::ROW_MARKER);
        if let Some(block) = self.block {
            table = table.block(block);
        }

        let mut state = TableState::default().with_selected(self.selected);
        StatefulWidget::render(table, area, buf, &mut state);
    }
}

/// Format an execution timestamp for the table.
pub fn format_timestamp<Tz: TimeZone>(ms: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    tz.timestamp_millis_opt(ms)
        .single()
        .map_or_else(|| ms.to_string(), |dt| dt.format(TIMESTAMP_FORMAT).to_string())
}

/// Keep the end of `text` within `width` columns, marking the cut with `…`.
///
/// Data source URIs differ mostly in their tail, so the head is dropped.
pub fn truncate_start(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let budget = width.saturating_sub(1);
    let mut used = 0;
    let mut tail: Vec<char> = Vec::new();
    for ch in text.chars().rev() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        tail.push(ch);
    }
    std::iter::once('…').chain(tail.into_iter().rev()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::buffer_to_string;
    use chrono::Utc;
    use lineview_engine::sample_events;

    #[test]
    fn test_truncate_start_keeps_tail() {
        assert_eq!(truncate_start("hdfs://a/b", 20), "hdfs://a/b");
        assert_eq!(
            truncate_start("hdfs://warehouse/marketing/raw.parquet", 12),
            "…raw.parquet"
        );
        assert_eq!(truncate_start("abc", 0), "…");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(1_704_186_000_000, &Utc), "2024-01-02 09:00");
    }

    #[test]
    fn test_renders_only_visible_rows() {
        let rows = sample_events();
        let visible = vec![2, 5];
        let area = Rect::new(0, 0, 120, 6);
        let mut buf = Buffer::empty(area);

        EventsTable::new(&rows, &visible)
            .selected(Some(1))
            .render(area, &mut buf);

        let text = buffer_to_string(&buf);
        assert!(text.contains("Application"));
        assert!(text.contains("app-20240103-0007"));
        assert!(text.contains("> Spark"));
        assert!(text.contains("app-20240106-0004"));
        assert!(!text.contains("app-20240102-0001"));
    }
}

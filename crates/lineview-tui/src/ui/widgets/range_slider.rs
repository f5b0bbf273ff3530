//! Dual-handle range slider drawn over a tick set.
//!
//! Four rows: the track with tick marks and handles, day legends, month
//! legends, and the handle value labels.

use crate::ui::theme::{Styles, Symbols};
use lineview_engine::{Handle, TickSet, TimeInterval};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Widget},
};
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone)]
pub struct RangeSlider<'a> {
    ticks: &'a TickSet,
    selection: TimeInterval,
    active: Handle,
    focused: bool,
    labels: (&'a str, &'a str),
    block: Option<Block<'a>>,
}

impl<'a> RangeSlider<'a> {
    pub fn new(ticks: &'a TickSet, selection: TimeInterval) -> Self {
        Self {
            ticks,
            selection,
            active: Handle::Low,
            focused: false,
            labels: ("", ""),
            block: None,
        }
    }

    /// Handle moved by the arrow keys.
    #[must_use]
    pub fn active(mut self, handle: Handle) -> Self {
        self.active = handle;
        self
    }

    #[must_use]
    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// Value labels for the low and high handle.
    #[must_use]
    pub fn labels(mut self, low: &'a str, high: &'a str) -> Self {
        self.labels = (low, high);
        self
    }

    #[must_use]
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Value range shown on the track; always covers both handles.
    fn domain(&self) -> (i64, i64) {
        let (low, high) = self.selection.bounds();
        let first = self.ticks.first().map_or(low, |t| t.value);
        let last = self.ticks.last().map_or(high, |t| t.value);
        (first.min(low), last.max(high))
    }

    fn render_track(&self, area: Rect, buf: &mut Buffer, domain: (i64, i64)) {
        let (low, high) = self.selection.bounds();
        let low_col = column(low, domain, area.width);
        let high_col = column(high, domain, area.width);

        for x in 0..area.width {
            let (ch, style) = if (low_col..=high_col).contains(&x) {
                (Symbols::TRACK_SELECTED, Styles::selected_track())
            } else {
                (Symbols::TRACK, Styles::dim())
            };
            buf[(area.x + x, area.y)].set_char(ch).set_style(style);
        }

        // Marks would merge into a solid bar when there are more ticks than cells
        if self.ticks.len() <= usize::from(area.width) {
            for tick in self.ticks {
                let x = column(tick.value, domain, area.width);
                buf[(area.x + x, area.y)].set_char(Symbols::TICK);
            }
        }

        for (handle, x) in [(Handle::Low, low_col), (Handle::High, high_col)] {
            let active = self.focused && handle == self.active;
            let (ch, style) = if active {
                (Symbols::HANDLE_ACTIVE, Styles::highlight())
            } else {
                (Symbols::HANDLE, Styles::active())
            };
            buf[(area.x + x, area.y)].set_char(ch).set_style(style);
        }
    }

    fn render_legends(&self, area: Rect, buf: &mut Buffer, domain: (i64, i64)) {
        // Next free column per legend row, so labels never overlap
        let mut free = [0u16; 2];
        for tick in self.ticks {
            let Some(legend) = &tick.legend else {
                continue;
            };
            let mark = column(tick.value, domain, area.width);
            for (row, text) in legend.lines().into_iter().enumerate().take(2) {
                let text = text.trim();
                #[allow(clippy::cast_possible_truncation)]
                let width = text.width() as u16;
                if width > area.width {
                    continue;
                }
                // Pull labels near the right edge back inside the track
                let x = mark.min(area.width - width);
                if x < free[row] {
                    continue;
                }
                #[allow(clippy::cast_possible_truncation)]
                let y = area.y + row as u16;
                buf.set_string(area.x + x, y, text, Styles::dim());
                free[row] = x + width + 1;
            }
        }
    }

    fn render_labels(&self, area: Rect, buf: &mut Buffer) {
        let style_for = |handle: Handle| -> Style {
            if self.focused && handle == self.active {
                Styles::highlight()
            } else {
                Styles::default()
            }
        };
        let line = Line::from(vec![
            Span::styled(self.labels.0, style_for(Handle::Low)),
            Span::styled("  ->  ", Styles::dim()),
            Span::styled(self.labels.1, style_for(Handle::High)),
        ]);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}

impl Widget for RangeSlider<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        if inner.height < 1 || inner.width < 2 {
            return;
        }

        let domain = self.domain();
        let row = |offset: u16| Rect::new(inner.x, inner.y + offset, inner.width, 1);

        self.render_track(row(0), buf, domain);
        if inner.height >= 3 {
            self.render_legends(Rect::new(inner.x, inner.y + 1, inner.width, 2), buf, domain);
        }
        if inner.height >= 4 {
            self.render_labels(row(3), buf);
        }
    }
}

/// Column of `value` on a track `width` cells wide spanning `domain`.
fn column(value: i64, (min, max): (i64, i64), width: u16) -> u16 {
    let last = width.saturating_sub(1);
    if max <= min || last == 0 {
        return 0;
    }
    let offset = i128::from(value.clamp(min, max)) - i128::from(min);
    let span = i128::from(max) - i128::from(min);
    let col = offset * i128::from(last) / span;
    u16::try_from(col).unwrap_or(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::buffer_to_string;
    use chrono::{TimeZone, Utc};
    use lineview_engine::build_ticks;

    const DAY: i64 = 86_400_000;

    fn jan(day: u32) -> i64 {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0)
            .unwrap()
            .timestamp_millis()
    }

    #[test]
    fn test_column_maps_domain_onto_width() {
        assert_eq!(column(0, (0, 100), 11), 0);
        assert_eq!(column(50, (0, 100), 11), 5);
        assert_eq!(column(100, (0, 100), 11), 10);
        assert_eq!(column(500, (0, 100), 11), 10);
        assert_eq!(column(5, (5, 5), 11), 0);
    }

    #[test]
    fn test_render_five_day_slider() {
        let ticks = build_ticks(&TimeInterval::ordered(jan(1), jan(5)), &Utc);
        let selection = TimeInterval::ordered(jan(2), jan(4));
        let area = Rect::new(0, 0, 9, 4);
        let mut buf = Buffer::empty(area);

        RangeSlider::new(&ticks, selection)
            .focused(true)
            .active(Handle::High)
            .labels("02", "04")
            .render(area, &mut buf);

        insta::assert_snapshot!(buffer_to_string(&buf), @r"
        +-o=+=@-+
        01  03 05
        January
        02  ->  0
        ");
    }

    #[test]
    fn test_handle_outside_ticks_stays_visible() {
        let ticks = build_ticks(&TimeInterval::ordered(jan(1), jan(3)), &Utc);
        let selection = TimeInterval::ordered(jan(1), jan(3) + 10 * DAY);
        let area = Rect::new(0, 0, 20, 1);
        let mut buf = Buffer::empty(area);

        RangeSlider::new(&ticks, selection).render(area, &mut buf);

        let track = buffer_to_string(&buf);
        assert!(track.starts_with('o'));
        assert!(track.ends_with('o'));
    }
}

//! Synchronized multi-view time-range selector.
//!
//! Four bound views share one selection: the dual-handle slider pair, the
//! calendar range picker, and the from/to date pickers. Each user edit goes
//! through exactly one handler, which writes its own view with an emission
//! and pushes the result to the other views through [`ViewField::set_silently`].
//! Silent writes never count as emissions, so nothing listening for changes
//! can bounce an update back into the selector.
//!
//! The outer [`TimeInterval`] and its [`TickSet`] are separate from the
//! selection: only the range picker (or an upstream date range) replaces
//! the interval, while single-date edits retarget one tick in place.

use chrono::{DateTime, TimeZone, Utc};
use tracing::debug;

use crate::interval::TimeInterval;
use crate::ticks::{at, build_ticks, TickSet};

/// A bound view value plus its write bookkeeping.
#[derive(Debug, Clone)]
pub struct ViewField<T> {
    value: T,
    revision: u64,
    emissions: u64,
}

impl<T> ViewField<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            revision: 0,
            emissions: 0,
        }
    }

    /// Current value.
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Number of writes of any kind.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of writes that announced a change.
    pub fn emissions(&self) -> u64 {
        self.emissions
    }

    fn set(&mut self, value: T) {
        self.value = value;
        self.revision += 1;
        self.emissions += 1;
    }

    /// Update the displayed value without announcing a change.
    fn set_silently(&mut self, value: T) {
        self.value = value;
        self.revision += 1;
    }
}

/// The four bound views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Slider,
    Range,
    From,
    To,
}

/// Slider handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Handle {
    #[default]
    Low,
    High,
}

impl Handle {
    /// The other handle.
    pub fn toggled(self) -> Self {
        match self {
            Self::Low => Self::High,
            Self::High => Self::Low,
        }
    }
}

/// What happened to the tick set during an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickUpdate {
    /// Ticks untouched.
    Unchanged,
    /// Whole tick set regenerated from a new interval.
    Rebuilt,
    /// One tick's value replaced.
    Retargeted,
    /// A retarget found no tick on that day; nothing changed.
    Missed,
}

/// Report of one update: who emitted, who was written silently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Propagation {
    /// View that announced the change; `None` for upstream projections.
    pub source: Option<View>,
    /// Views written through the silent path.
    pub silent: Vec<View>,
    /// Effect on the tick set.
    pub ticks: TickUpdate,
}

/// Time-range selector state.
#[derive(Debug, Clone)]
pub struct TimeRangeSelector<Tz: TimeZone> {
    tz: Tz,
    interval: TimeInterval,
    ticks: TickSet,
    slider: ViewField<TimeInterval>,
    range: ViewField<(DateTime<Tz>, DateTime<Tz>)>,
    from: ViewField<DateTime<Tz>>,
    to: ViewField<DateTime<Tz>>,
    slider_redraws: u64,
}

impl<Tz: TimeZone> TimeRangeSelector<Tz> {
    /// Create a selector covering `(now, now + 1 month)`.
    ///
    /// The initial ticks stop short of the end instant and the initial
    /// selection spans the first two ticks.
    pub fn new(now: DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let interval = TimeInterval::month_from(&now);
        let end = at(&tz, interval.end_ms()).unwrap_or_else(|| now.clone());
        let ticks = TickSet::spanning(now, &end);

        let low = ticks.first().map_or(interval.start_ms(), |t| t.value);
        let high = ticks.get(1).map_or(low, |t| t.value);
        let selection = TimeInterval::ordered(low, high);

        let from = to_datetime(&tz, selection.start_ms());
        let to = to_datetime(&tz, selection.end_ms());
        Self {
            interval,
            ticks,
            slider: ViewField::new(selection),
            range: ViewField::new((from.clone(), to.clone())),
            from: ViewField::new(from),
            to: ViewField::new(to),
            slider_redraws: 0,
            tz,
        }
    }

    /// Create a selector over an explicit interval, selecting all of it.
    pub fn with_interval(interval: TimeInterval, tz: Tz) -> Self {
        let from = to_datetime(&tz, interval.start_ms());
        let to = to_datetime(&tz, interval.end_ms());
        Self {
            ticks: build_ticks(&interval, &tz),
            interval,
            slider: ViewField::new(interval),
            range: ViewField::new((from.clone(), to.clone())),
            from: ViewField::new(from),
            to: ViewField::new(to),
            slider_redraws: 0,
            tz,
        }
    }

    // ------------------------------------------------------------------
    // Tick operations
    // ------------------------------------------------------------------

    /// Build ticks for `interval`, or for the current interval when `None`.
    pub fn build_ticks(&self, interval: Option<&TimeInterval>) -> TickSet {
        build_ticks(interval.unwrap_or(&self.interval), &self.tz)
    }

    /// Retarget the tick on `old`'s calendar day to `new`.
    ///
    /// Returns `false` and leaves state unchanged when no tick matches.
    pub fn replace_tick_value(&mut self, old: i64, new: i64) -> bool {
        let replaced = self.ticks.replace_value(old, new, &self.tz);
        if replaced {
            self.slider_redraws += 1;
        }
        replaced
    }

    /// Replace the outer interval and regenerate every tick.
    pub fn replace_interval(&mut self, start: i64, end: i64) {
        self.interval = TimeInterval::ordered(start, end);
        self.ticks = build_ticks(&self.interval, &self.tz);
        self.slider_redraws += 1;
        debug!(
            start = self.interval.start_ms(),
            end = self.interval.end_ms(),
            ticks = self.ticks.len(),
            "selector interval replaced"
        );
    }

    // ------------------------------------------------------------------
    // View edits
    // ------------------------------------------------------------------

    /// The slider handles were dragged.
    pub fn drag_slider(&mut self, a: i64, b: i64) -> Propagation {
        let selection = TimeInterval::ordered(a, b);
        self.slider.set(selection);
        let range = self.range_of(selection);
        self.range.set_silently(range);
        self.from
            .set_silently(to_datetime(&self.tz, selection.start_ms()));
        self.to.set_silently(to_datetime(&self.tz, selection.end_ms()));
        Propagation {
            source: Some(View::Slider),
            silent: vec![View::Range, View::From, View::To],
            ticks: TickUpdate::Unchanged,
        }
    }

    /// The calendar range picker committed a new range.
    ///
    /// This is the only view edit that replaces the outer interval.
    pub fn pick_range(&mut self, start: DateTime<Tz>, end: DateTime<Tz>) -> Propagation {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let selection = TimeInterval::ordered(start.timestamp_millis(), end.timestamp_millis());

        self.range.set((start.clone(), end.clone()));
        self.slider.set_silently(selection);
        self.replace_interval(selection.start_ms(), selection.end_ms());
        self.from.set_silently(start);
        self.to.set_silently(end);
        Propagation {
            source: Some(View::Range),
            silent: vec![View::Slider, View::From, View::To],
            ticks: TickUpdate::Rebuilt,
        }
    }

    /// The "from" picker committed a new date.
    pub fn pick_from(&mut self, date: DateTime<Tz>) -> Propagation {
        let new = date.timestamp_millis();
        let previous = *self.slider.get();
        self.from.set(date);
        let ticks = self.retarget(previous.start_ms(), new);
        let silent = self.sync_endpoint(new, previous.end_ms());
        Propagation {
            source: Some(View::From),
            silent,
            ticks,
        }
    }

    /// The "to" picker committed a new date.
    pub fn pick_to(&mut self, date: DateTime<Tz>) -> Propagation {
        let new = date.timestamp_millis();
        let previous = *self.slider.get();
        self.to.set(date);
        let ticks = self.retarget(previous.end_ms(), new);
        let silent = self.sync_endpoint(previous.start_ms(), new);
        Propagation {
            source: Some(View::To),
            silent,
            ticks,
        }
    }

    /// Push an upstream selection into all four views without emitting.
    pub fn project_selection(&mut self, a: i64, b: i64) -> Propagation {
        let selection = TimeInterval::ordered(a, b);
        self.slider.set_silently(selection);
        let range = self.range_of(selection);
        self.range.set_silently(range);
        self.from
            .set_silently(to_datetime(&self.tz, selection.start_ms()));
        self.to.set_silently(to_datetime(&self.tz, selection.end_ms()));
        Propagation {
            source: None,
            silent: vec![View::Slider, View::Range, View::From, View::To],
            ticks: TickUpdate::Unchanged,
        }
    }

    /// Selection after moving `handle` by `steps` ticks, clamped to the set.
    ///
    /// Does not modify the selector; callers feed the result to
    /// [`Self::drag_slider`] or upstream.
    pub fn stepped(&self, handle: Handle, steps: isize) -> Option<TimeInterval> {
        let selection = *self.slider.get();
        let (moving, fixed) = match handle {
            Handle::Low => (selection.start_ms(), selection.end_ms()),
            Handle::High => (selection.end_ms(), selection.start_ms()),
        };
        let index = self.ticks.nearest_index(moving)?;
        let last = self.ticks.len().saturating_sub(1);
        let target = index.saturating_add_signed(steps).min(last);
        let value = self.ticks.get(target)?.value;
        Some(TimeInterval::ordered(value, fixed))
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn tz(&self) -> &Tz {
        &self.tz
    }

    pub fn interval(&self) -> TimeInterval {
        self.interval
    }

    pub fn ticks(&self) -> &TickSet {
        &self.ticks
    }

    /// The slider pair as an ordered interval.
    pub fn selection(&self) -> TimeInterval {
        *self.slider.get()
    }

    pub fn slider(&self) -> &ViewField<TimeInterval> {
        &self.slider
    }

    pub fn range(&self) -> &ViewField<(DateTime<Tz>, DateTime<Tz>)> {
        &self.range
    }

    pub fn from(&self) -> &ViewField<DateTime<Tz>> {
        &self.from
    }

    pub fn to(&self) -> &ViewField<DateTime<Tz>> {
        &self.to
    }

    /// How many times the slider had to be redrawn for tick changes.
    pub fn slider_redraws(&self) -> u64 {
        self.slider_redraws
    }

    /// Whether all four views agree on the selection.
    pub fn is_consistent(&self) -> bool {
        let (low, high) = self.slider.get().bounds();
        let (range_start, range_end) = self.range.get();
        range_start.timestamp_millis() == low
            && range_end.timestamp_millis() == high
            && self.from.get().timestamp_millis() == low
            && self.to.get().timestamp_millis() == high
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn retarget(&mut self, old: i64, new: i64) -> TickUpdate {
        if self.replace_tick_value(old, new) {
            TickUpdate::Retargeted
        } else {
            TickUpdate::Missed
        }
    }

    /// Silently write the slider and range for a single-endpoint edit.
    ///
    /// When the edit crosses the other endpoint the pair is reordered and
    /// both pickers are rewritten to match.
    fn sync_endpoint(&mut self, low: i64, high: i64) -> Vec<View> {
        let selection = TimeInterval::ordered(low, high);
        self.slider.set_silently(selection);
        let range = self.range_of(selection);
        self.range.set_silently(range);
        let mut silent = vec![View::Slider, View::Range];
        if low > high {
            self.from
                .set_silently(to_datetime(&self.tz, selection.start_ms()));
            self.to.set_silently(to_datetime(&self.tz, selection.end_ms()));
            silent.extend([View::From, View::To]);
        }
        silent
    }

    fn range_of(&self, selection: TimeInterval) -> (DateTime<Tz>, DateTime<Tz>) {
        (
            to_datetime(&self.tz, selection.start_ms()),
            to_datetime(&self.tz, selection.end_ms()),
        )
    }
}

fn to_datetime<Tz: TimeZone>(tz: &Tz, ms: i64) -> DateTime<Tz> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .unwrap_or_default()
        .with_timezone(tz)
}

//! Application store: canonical filter values and fetched execution events.
//!
//! State changes only through [`reduce`]. Side effects are not performed
//! here; the reducer hands them back as [`Effect`]s for the caller to run.
//! Filter changes are broadcast on a `watch` channel so views can follow
//! the store one-way.

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::events::{ExecutionEvent, ExecutionEventsPage, FetchParams};
use crate::interval::TimeInterval;

/// Which filter slot the latest edit targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterEdit {
    DateRange,
    /// Lower bound edited; `previous` is the low endpoint it replaced.
    MinDate { previous: Option<i64> },
    /// Upper bound edited; `previous` is the high endpoint it replaced.
    MaxDate { previous: Option<i64> },
    SliderRange,
}

/// The `filters` namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FiltersState {
    pub date_range: Option<(i64, i64)>,
    pub min_date: Option<i64>,
    pub max_date: Option<i64>,
    pub slider_range: Option<(i64, i64)>,
    /// Bumped on every accepted filter edit.
    pub revision: u64,
    pub last_edit: Option<FilterEdit>,
}

impl FiltersState {
    /// Filters with every slot set to `range`.
    pub fn from_range(range: TimeInterval) -> Self {
        Self {
            date_range: Some(range.bounds()),
            min_date: Some(range.start_ms()),
            max_date: Some(range.end_ms()),
            slider_range: Some(range.bounds()),
            revision: 0,
            last_edit: None,
        }
    }

    /// The slider selection as an interval.
    pub fn selection(&self) -> Option<TimeInterval> {
        self.slider_range
            .map(|(start, end)| TimeInterval::ordered(start, end))
    }

    fn commit(&mut self, edit: FilterEdit) {
        self.revision += 1;
        self.last_edit = Some(edit);
    }
}

/// The `execution_events` namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionEventsState {
    /// Canonical rows of the current page. Never filtered in place.
    pub elements: Vec<ExecutionEvent>,
    pub offset: u64,
    pub total_count: u64,
    pub loading: bool,
    pub error: Option<String>,
    /// Sequence number of the newest request.
    pub request_seq: u64,
    pub last_request: Option<FetchParams>,
}

impl ExecutionEventsState {
    /// Offset of the next page, if there is one.
    pub fn next_offset(&self, page_size: u64) -> Option<u64> {
        let next = self.offset + page_size.max(1);
        (next < self.total_count).then_some(next)
    }

    /// Offset of the previous page, if there is one.
    pub fn prev_offset(&self, page_size: u64) -> Option<u64> {
        (self.offset > 0).then(|| self.offset.saturating_sub(page_size.max(1)))
    }
}

/// Whole application state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub filters: FiltersState,
    pub execution_events: ExecutionEventsState,
}

/// Store actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Replace the date range; `None` is ignored.
    SetDateRange(Option<(i64, i64)>),
    SetMinDate(i64),
    SetMaxDate(i64),
    SetSliderRange(i64, i64),
    FetchExecutionEvents(FetchParams),
    FetchSucceeded {
        request_seq: u64,
        page: ExecutionEventsPage,
    },
    FetchFailed {
        request_seq: u64,
        message: String,
    },
}

/// Side effects requested by the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Issue the paged fetch; report back with the same `request_seq`.
    Fetch {
        request_seq: u64,
        params: FetchParams,
    },
}

/// Apply `action` to `state`.
pub fn reduce(state: &mut AppState, action: Action) -> Option<Effect> {
    let filters = &mut state.filters;
    let events = &mut state.execution_events;

    match action {
        Action::SetDateRange(None) => {
            debug!("dropping empty date range emission");
            None
        }
        Action::SetDateRange(Some((a, b))) => {
            let range = TimeInterval::ordered(a, b);
            filters.date_range = Some(range.bounds());
            filters.min_date = Some(range.start_ms());
            filters.max_date = Some(range.end_ms());
            filters.slider_range = Some(range.bounds());
            filters.commit(FilterEdit::DateRange);
            None
        }
        Action::SetMinDate(min) => {
            let previous = filters.slider_range.map(|(low, _)| low).or(filters.min_date);
            let high = filters
                .slider_range
                .map(|(_, high)| high)
                .or(filters.max_date)
                .unwrap_or(min);
            let selection = TimeInterval::ordered(min, high);
            filters.min_date = Some(min);
            filters.slider_range = Some(selection.bounds());
            filters.commit(FilterEdit::MinDate { previous });
            None
        }
        Action::SetMaxDate(max) => {
            let previous = filters.slider_range.map(|(_, high)| high).or(filters.max_date);
            let low = filters
                .slider_range
                .map(|(low, _)| low)
                .or(filters.min_date)
                .unwrap_or(max);
            let selection = TimeInterval::ordered(low, max);
            filters.max_date = Some(max);
            filters.slider_range = Some(selection.bounds());
            filters.commit(FilterEdit::MaxDate { previous });
            None
        }
        Action::SetSliderRange(a, b) => {
            let selection = TimeInterval::ordered(a, b);
            filters.slider_range = Some(selection.bounds());
            filters.min_date = Some(selection.start_ms());
            filters.max_date = Some(selection.end_ms());
            filters.commit(FilterEdit::SliderRange);
            None
        }
        Action::FetchExecutionEvents(params) => {
            events.request_seq += 1;
            events.loading = true;
            events.error = None;
            events.last_request = Some(params.clone());
            info!(
                request_seq = events.request_seq,
                start = %params.timestamp_start,
                end = %params.timestamp_end,
                offset = %params.offset,
                "fetching execution events"
            );
            Some(Effect::Fetch {
                request_seq: events.request_seq,
                params,
            })
        }
        Action::FetchSucceeded { request_seq, page } => {
            if request_seq != events.request_seq {
                debug!(request_seq, latest = events.request_seq, "discarding stale page");
                return None;
            }
            debug!(
                rows = page.elements.len(),
                total = page.total_count,
                "execution events received"
            );
            events.elements = page.elements;
            events.offset = page.offset;
            events.total_count = page.total_count;
            events.loading = false;
            None
        }
        Action::FetchFailed {
            request_seq,
            message,
        } => {
            if request_seq != events.request_seq {
                debug!(request_seq, latest = events.request_seq, "discarding stale failure");
                return None;
            }
            warn!(request_seq, error = %message, "execution events fetch failed");
            events.loading = false;
            events.error = Some(message);
            None
        }
    }
}

/// Store wrapper that broadcasts filter changes.
#[derive(Debug)]
pub struct Store {
    state: AppState,
    filters_tx: watch::Sender<FiltersState>,
}

impl Store {
    /// Create a store with the given filters.
    pub fn new(filters: FiltersState) -> Self {
        let (filters_tx, _) = watch::channel(filters.clone());
        Self {
            state: AppState {
                filters,
                execution_events: ExecutionEventsState::default(),
            },
            filters_tx,
        }
    }

    /// Current state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Subscribe to filter changes.
    ///
    /// The current value counts as already seen by the new receiver.
    pub fn subscribe_filters(&self) -> watch::Receiver<FiltersState> {
        self.filters_tx.subscribe()
    }

    /// Reduce `action` and broadcast the filters if they changed.
    pub fn dispatch(&mut self, action: Action) -> Option<Effect> {
        let revision = self.state.filters.revision;
        let effect = reduce(&mut self.state, action);
        if self.state.filters.revision != revision {
            self.filters_tx.send_replace(self.state.filters.clone());
        }
        effect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(rows: usize, offset: u64, total: u64) -> ExecutionEventsPage {
        let mut elements = crate::events::sample_events();
        elements.truncate(rows);
        ExecutionEventsPage {
            elements,
            offset,
            total_count: total,
        }
    }

    #[test]
    fn test_set_date_range_updates_every_slot() {
        let mut state = AppState::default();
        reduce(&mut state, Action::SetDateRange(Some((500, 100))));

        assert_eq!(state.filters.date_range, Some((100, 500)));
        assert_eq!(state.filters.min_date, Some(100));
        assert_eq!(state.filters.max_date, Some(500));
        assert_eq!(state.filters.slider_range, Some((100, 500)));
        assert_eq!(state.filters.last_edit, Some(FilterEdit::DateRange));
        assert_eq!(state.filters.revision, 1);
    }

    #[test]
    fn test_empty_date_range_is_dropped() {
        let mut state = AppState::default();
        reduce(&mut state, Action::SetDateRange(Some((1, 2))));
        let before = state.clone();

        assert_eq!(reduce(&mut state, Action::SetDateRange(None)), None);
        assert_eq!(state, before);
    }

    #[test]
    fn test_min_date_records_previous_low_endpoint() {
        let mut state = AppState::default();
        reduce(&mut state, Action::SetDateRange(Some((100, 500))));
        reduce(&mut state, Action::SetSliderRange(200, 400));
        reduce(&mut state, Action::SetMinDate(250));

        assert_eq!(
            state.filters.last_edit,
            Some(FilterEdit::MinDate {
                previous: Some(200)
            })
        );
        assert_eq!(state.filters.slider_range, Some((250, 400)));
        assert_eq!(state.filters.date_range, Some((100, 500)));
    }

    #[test]
    fn test_max_date_below_low_reorders_selection() {
        let mut state = AppState::default();
        reduce(&mut state, Action::SetDateRange(Some((100, 500))));
        reduce(&mut state, Action::SetMaxDate(50));

        assert_eq!(state.filters.slider_range, Some((50, 100)));
        assert_eq!(
            state.filters.last_edit,
            Some(FilterEdit::MaxDate {
                previous: Some(500)
            })
        );
    }

    #[test]
    fn test_fetch_returns_effect_and_tracks_sequence() {
        let mut state = AppState::default();
        let params = FetchParams::new(TimeInterval::ordered(1, 2), 3, 0);

        let effect = reduce(&mut state, Action::FetchExecutionEvents(params.clone()));

        assert_eq!(
            effect,
            Some(Effect::Fetch {
                request_seq: 1,
                params
            })
        );
        assert!(state.execution_events.loading);
    }

    #[test]
    fn test_stale_responses_are_discarded() {
        let mut state = AppState::default();
        let params = FetchParams::new(TimeInterval::ordered(1, 2), 3, 0);
        reduce(&mut state, Action::FetchExecutionEvents(params.clone()));
        reduce(&mut state, Action::FetchExecutionEvents(params));

        reduce(
            &mut state,
            Action::FetchSucceeded {
                request_seq: 1,
                page: page(3, 0, 3),
            },
        );
        assert!(state.execution_events.elements.is_empty());
        assert!(state.execution_events.loading);

        reduce(
            &mut state,
            Action::FetchSucceeded {
                request_seq: 2,
                page: page(5, 0, 12),
            },
        );
        assert_eq!(state.execution_events.elements.len(), 5);
        assert_eq!(state.execution_events.total_count, 12);
        assert!(!state.execution_events.loading);
    }

    #[test]
    fn test_failure_keeps_previous_rows() {
        let mut state = AppState::default();
        let params = FetchParams::new(TimeInterval::ordered(1, 2), 3, 0);
        reduce(&mut state, Action::FetchExecutionEvents(params.clone()));
        reduce(
            &mut state,
            Action::FetchSucceeded {
                request_seq: 1,
                page: page(2, 0, 2),
            },
        );
        reduce(&mut state, Action::FetchExecutionEvents(params));
        reduce(
            &mut state,
            Action::FetchFailed {
                request_seq: 2,
                message: "boom".into(),
            },
        );

        assert_eq!(state.execution_events.elements.len(), 2);
        assert_eq!(state.execution_events.error.as_deref(), Some("boom"));
        assert!(!state.execution_events.loading);
    }

    #[test]
    fn test_paging_offsets() {
        let events = ExecutionEventsState {
            offset: 10,
            total_count: 25,
            ..Default::default()
        };
        assert_eq!(events.next_offset(10), Some(20));
        assert_eq!(events.prev_offset(10), Some(0));

        let last = ExecutionEventsState {
            offset: 20,
            total_count: 25,
            ..Default::default()
        };
        assert_eq!(last.next_offset(10), None);
        assert_eq!(ExecutionEventsState::default().prev_offset(10), None);
    }

    #[test]
    fn test_store_broadcasts_filter_changes_only() {
        let mut store = Store::new(FiltersState::default());
        let mut rx = store.subscribe_filters();
        assert!(!rx.has_changed().unwrap());

        store.dispatch(Action::FetchExecutionEvents(FetchParams::new(
            TimeInterval::ordered(1, 2),
            3,
            0,
        )));
        assert!(!rx.has_changed().unwrap());

        store.dispatch(Action::SetSliderRange(10, 20));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().slider_range, Some((10, 20)));
    }
}

//! One-way binding from the store's filters to a [`TimeRangeSelector`].
//!
//! Store changes are projected into the selector through its silent path
//! only; the binding never dispatches. Edits the selector made itself are
//! acknowledged by revision so their broadcast is not applied twice.

use chrono::TimeZone;
use tokio::sync::watch;
use tracing::debug;

use crate::selector::{Propagation, TickUpdate, TimeRangeSelector};
use crate::store::{FilterEdit, FiltersState};

/// Tracks which filter revision the selector already reflects.
#[derive(Debug, Clone, Default)]
pub struct StoreBinding {
    last_revision: Option<u64>,
}

impl StoreBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revision the selector currently reflects.
    pub fn last_revision(&self) -> Option<u64> {
        self.last_revision
    }

    /// Mark `revision` as already reflected by the selector.
    pub fn acknowledge(&mut self, revision: u64) {
        self.last_revision = Some(revision);
    }

    /// Apply the receiver's value if it changed since last seen.
    pub fn follow<Tz: TimeZone>(
        &mut self,
        rx: &mut watch::Receiver<FiltersState>,
        selector: &mut TimeRangeSelector<Tz>,
    ) -> Option<Propagation> {
        // A closed channel still holds the last value; nothing new can arrive.
        if !rx.has_changed().unwrap_or(false) {
            return None;
        }
        let filters = rx.borrow_and_update().clone();
        self.apply(&filters, selector)
    }

    /// Project `filters` into `selector`.
    ///
    /// Returns `None` when the revision was already applied or the filters
    /// carry nothing to show.
    pub fn apply<Tz: TimeZone>(
        &mut self,
        filters: &FiltersState,
        selector: &mut TimeRangeSelector<Tz>,
    ) -> Option<Propagation> {
        if self.last_revision == Some(filters.revision) {
            return None;
        }
        self.last_revision = Some(filters.revision);

        // The watch channel keeps only the newest value, so an earlier range
        // change may hide behind a later min/max edit.
        let rebuilt = match filters.date_range {
            Some((start, end))
                if matches!(filters.last_edit, Some(FilterEdit::DateRange) | None)
                    || selector.interval().bounds() != (start, end) =>
            {
                selector.replace_interval(start, end);
                true
            }
            _ => false,
        };
        let edited = match filters.last_edit {
            Some(FilterEdit::MinDate { previous }) => {
                retarget(selector, previous, filters.min_date)
            }
            Some(FilterEdit::MaxDate { previous }) => {
                retarget(selector, previous, filters.max_date)
            }
            _ => TickUpdate::Unchanged,
        };
        let ticks = if rebuilt { TickUpdate::Rebuilt } else { edited };

        let Some((low, high)) = filters.slider_range.or(filters.date_range) else {
            debug!(revision = filters.revision, "filters carry no selection");
            return None;
        };
        let mut propagation = selector.project_selection(low, high);
        propagation.ticks = ticks;
        Some(propagation)
    }
}

fn retarget<Tz: TimeZone>(
    selector: &mut TimeRangeSelector<Tz>,
    previous: Option<i64>,
    new: Option<i64>,
) -> TickUpdate {
    match (previous, new) {
        (Some(old), Some(new)) if selector.replace_tick_value(old, new) => TickUpdate::Retargeted,
        (Some(_), Some(_)) => TickUpdate::Missed,
        _ => TickUpdate::Unchanged,
    }
}

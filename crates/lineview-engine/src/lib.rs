//! lineview-engine: Headless core of the execution events dashboard
//!
//! This crate provides everything below the terminal UI:
//! - Time intervals, tick sets and the synchronized time-range selector
//! - The store, its reducer and the store-to-selector binding
//! - Row filtering, the execution-events HTTP client and navigation targets
//! - Configuration

pub mod binding;
pub mod client;
pub mod config;
pub mod dates;
pub mod events;
pub mod filter;
pub mod interval;
pub mod navigation;
pub mod selector;
pub mod store;
pub mod ticks;

// Re-export commonly used types
pub use binding::StoreBinding;
pub use client::{parse_page, ApiError, EventSource, ExecutionEventsClient};
pub use config::{Config, ConfigError};
pub use dates::{
    format_picker_date, format_picker_range, format_slider_label, parse_picker_date,
    parse_picker_range, InputError,
};
pub use events::{sample_events, sample_page, ExecutionEvent, ExecutionEventsPage, FetchParams};
pub use filter::filter_events;
pub use interval::{IntervalError, TimeInterval};
pub use navigation::{
    CommandNavigator, MemoryNavigator, NavigationError, NavigationTarget, Navigator,
};
pub use selector::{Handle, Propagation, TickUpdate, TimeRangeSelector, View, ViewField};
pub use store::{
    reduce, Action, AppState, Effect, ExecutionEventsState, FilterEdit, FiltersState, Store,
};
pub use ticks::{build_ticks, Legend, Tick, TickSet, LEGEND_TICK_LIMIT};

/// Returns the engine version.
pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

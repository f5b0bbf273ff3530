//! Reusable widgets for the lineview dashboard.

pub mod events_table;
pub mod range_slider;
pub mod status_bar;
pub mod text_input;

pub use events_table::EventsTable;
pub use range_slider::RangeSlider;
pub use status_bar::{KeyHint, StatusBar};
pub use text_input::{TextInput, TextInputState};

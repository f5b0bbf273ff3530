//! Application state and update logic for the lineview dashboard.

use crate::event::{key_to_action, Action};
use crate::ui::widgets::TextInputState;
use chrono::{Local, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use lineview_engine::dates::{
    format_picker_date, format_picker_range, format_slider_label, parse_picker_date,
    parse_picker_range,
};
use lineview_engine::{
    filter_events, Action as StoreAction, ApiError, AppState, Config, Effect, ExecutionEvent,
    ExecutionEventsPage, FetchParams, FiltersState, Handle, NavigationTarget, Navigator, Store,
    StoreBinding, TickUpdate, TimeRangeSelector,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Ticks a notification stays visible.
const NOTIFICATION_TICKS: usize = 12;

/// The focused dashboard element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Slider,
    Range,
    From,
    To,
    Search,
    Table,
}

impl Focus {
    const ORDER: [Self; 6] = [
        Self::Slider,
        Self::Range,
        Self::From,
        Self::To,
        Self::Search,
        Self::Table,
    ];

    fn position(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    /// Next element in tab order.
    pub fn next(self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    /// Previous element in tab order.
    pub fn prev(self) -> Self {
        Self::ORDER[(self.position() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    /// Whether the element takes typed text.
    pub fn is_text(self) -> bool {
        matches!(self, Self::Range | Self::From | Self::To | Self::Search)
    }

    /// Mode label for the status bar.
    pub fn label(self) -> &'static str {
        match self {
            Self::Slider => "SLIDER",
            Self::Range => "RANGE",
            Self::From => "FROM",
            Self::To => "TO",
            Self::Search => "SEARCH",
            Self::Table => "TABLE",
        }
    }
}

/// Application state.
pub struct App {
    /// Whether the app should quit.
    pub should_quit: bool,

    /// Whether the help overlay is visible.
    pub show_help: bool,

    /// Focused element.
    pub focus: Focus,

    /// Slider handle moved by Left/Right.
    pub handle: Handle,

    /// The four synchronized time views and their ticks.
    pub selector: TimeRangeSelector<Local>,

    store: Store,
    filters_rx: watch::Receiver<FiltersState>,
    binding: StoreBinding,

    // === Text fields ===
    pub range_input: TextInputState,
    pub from_input: TextInputState,
    pub to_input: TextInputState,
    pub search_input: TextInputState,

    // === Table ===
    /// Indices of the page rows matching the search box.
    pub visible: Vec<usize>,

    /// Selected position within `visible`.
    pub selected_row: usize,

    /// Rows requested per page.
    pub page_size: u64,

    // === Navigation ===
    ui_base_url: String,
    navigator: Box<dyn Navigator>,

    /// Last URL navigated to.
    pub last_url: Option<String>,

    /// Where rows come from, for the status bar.
    pub source_label: String,

    /// Notification message (displayed temporarily, cleared after some ticks).
    pub notification: Option<String>,

    /// Ticks remaining until notification is cleared.
    notification_ttl: usize,

    /// Tick counter for animations.
    pub tick: usize,

    /// Effects waiting for the event loop.
    effects: Vec<Effect>,
}

impl App {
    /// Create a new app starting at the current time.
    pub fn new(
        config: &Config,
        navigator: Box<dyn Navigator>,
        source_label: impl Into<String>,
    ) -> Self {
        Self::with_selector(
            TimeRangeSelector::new(Local::now()),
            config,
            navigator,
            source_label,
        )
    }

    /// Create an app around an existing selector.
    ///
    /// The store is seeded from the selector and the first page is requested.
    pub fn with_selector(
        selector: TimeRangeSelector<Local>,
        config: &Config,
        navigator: Box<dyn Navigator>,
        source_label: impl Into<String>,
    ) -> Self {
        let selection = selector.selection();
        let filters = FiltersState {
            date_range: Some(selector.interval().bounds()),
            min_date: Some(selection.start_ms()),
            max_date: Some(selection.end_ms()),
            slider_range: Some(selection.bounds()),
            ..FiltersState::default()
        };
        let store = Store::new(filters);
        let filters_rx = store.subscribe_filters();
        let mut binding = StoreBinding::new();
        binding.acknowledge(store.state().filters.revision);

        let mut app = Self {
            should_quit: false,
            show_help: false,
            focus: Focus::default(),
            handle: Handle::default(),
            selector,
            store,
            filters_rx,
            binding,
            range_input: TextInputState::new(),
            from_input: TextInputState::new(),
            to_input: TextInputState::new(),
            search_input: TextInputState::new(),
            visible: Vec::new(),
            selected_row: 0,
            page_size: config.page_size(),
            ui_base_url: config.ui_base_url.clone(),
            navigator,
            last_url: None,
            source_label: source_label.into(),
            notification: None,
            notification_ttl: 0,
            tick: 0,
            effects: Vec::new(),
        };
        app.sync_inputs();
        app.request_page(0);
        app
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Current store state.
    pub fn state(&self) -> &AppState {
        self.store.state()
    }

    /// Canonical rows of the current page.
    pub fn page_rows(&self) -> &[ExecutionEvent] {
        &self.store.state().execution_events.elements
    }

    /// The row under the table cursor.
    pub fn selected_event(&self) -> Option<&ExecutionEvent> {
        let index = *self.visible.get(self.selected_row)?;
        self.page_rows().get(index)
    }

    pub fn is_loading(&self) -> bool {
        self.store.state().execution_events.loading
    }

    /// Value labels for the slider handles.
    pub fn slider_labels(&self) -> (String, String) {
        let (low, high) = self.selector.selection().bounds();
        (
            format_slider_label(low, &Local),
            format_slider_label(high, &Local),
        )
    }

    /// Take the effects produced since the last call.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    /// Handle a key press.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if !self.show_help && self.focus.is_text() && self.handle_text_key(key) {
            return;
        }
        self.handle_action(key_to_action(key));
    }

    /// Feed a key to the focused text field.
    ///
    /// Returns true if the key was consumed.
    fn handle_text_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return false;
        }
        let focus = self.focus;
        let Some(input) = self.input_mut(focus) else {
            return false;
        };
        match key.code {
            KeyCode::Char(c) => input.insert(c),
            KeyCode::Backspace => input.backspace(),
            KeyCode::Delete => input.delete(),
            KeyCode::Left => input.move_left(),
            KeyCode::Right => input.move_right(),
            KeyCode::Home => input.move_home(),
            KeyCode::End => input.move_end(),
            KeyCode::Enter => {
                self.commit_field(focus);
                return true;
            }
            _ => return false,
        }
        if focus == Focus::Search {
            self.refilter();
        }
        true
    }

    fn input_mut(&mut self, focus: Focus) -> Option<&mut TextInputState> {
        match focus {
            Focus::Range => Some(&mut self.range_input),
            Focus::From => Some(&mut self.from_input),
            Focus::To => Some(&mut self.to_input),
            Focus::Search => Some(&mut self.search_input),
            Focus::Slider | Focus::Table => None,
        }
    }

    /// Handle an action.
    pub fn handle_action(&mut self, action: Action) {
        // Global actions
        match action {
            Action::Quit => {
                if self.show_help {
                    self.show_help = false;
                } else {
                    self.should_quit = true;
                }
                return;
            }
            Action::Help => {
                self.show_help = !self.show_help;
                return;
            }
            _ => {}
        }

        // If help is showing, any key closes it
        if self.show_help {
            self.show_help = false;
            return;
        }

        match action {
            Action::NextFocus => self.focus = self.focus.next(),
            Action::PrevFocus => self.focus = self.focus.prev(),
            Action::Search => self.focus = Focus::Search,
            Action::NextPage => self.next_page(),
            Action::PrevPage => self.prev_page(),
            Action::Refresh => self.refresh(),
            _ => match self.focus {
                Focus::Slider => self.handle_slider_action(action),
                Focus::Range | Focus::From | Focus::To => self.handle_picker_action(action),
                Focus::Search => self.handle_search_action(action),
                Focus::Table => self.handle_table_action(action),
            },
        }
    }

    fn handle_slider_action(&mut self, action: Action) {
        match action {
            Action::Left => self.step_handle(-1),
            Action::Right => self.step_handle(1),
            Action::ToggleHandle | Action::Select => self.handle = self.handle.toggled(),
            _ => {}
        }
    }

    fn handle_picker_action(&mut self, action: Action) {
        if action == Action::Back {
            // Drop the unsubmitted edit
            self.sync_inputs();
        }
    }

    fn handle_search_action(&mut self, action: Action) {
        match action {
            Action::Back => {
                self.search_input.clear();
                self.refilter();
            }
            Action::Down => self.focus = Focus::Table,
            _ => {}
        }
    }

    fn handle_table_action(&mut self, action: Action) {
        match action {
            Action::Up => self.selected_row = self.selected_row.saturating_sub(1),
            Action::Down => {
                if self.selected_row + 1 < self.visible.len() {
                    self.selected_row += 1;
                }
            }
            Action::Left => self.prev_page(),
            Action::Right => self.next_page(),
            Action::Select => self.open_selected(),
            Action::Back => self.focus = Focus::Search,
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // Time range edits
    // ------------------------------------------------------------------

    /// Move the active slider handle by `steps` ticks.
    fn step_handle(&mut self, steps: isize) {
        let before = self.selector.selection();
        let Some(selection) = self.selector.stepped(self.handle, steps) else {
            return;
        };
        if selection == before {
            return;
        }
        // Moving a handle past the other one swaps their roles
        let crossed = match self.handle {
            Handle::Low => selection.end_ms() != before.end_ms(),
            Handle::High => selection.start_ms() != before.start_ms(),
        };
        if crossed {
            self.handle = self.handle.toggled();
        }

        let (low, high) = selection.bounds();
        self.selector.drag_slider(low, high);
        self.commit_filters(StoreAction::SetSliderRange(low, high));
    }

    /// Submit the text of a picker field.
    fn commit_field(&mut self, focus: Focus) {
        match focus {
            Focus::Range => match parse_picker_range(self.range_input.content(), &Local) {
                Ok((start, end)) => {
                    let bounds = (start.timestamp_millis(), end.timestamp_millis());
                    self.selector.pick_range(start, end);
                    self.commit_filters(StoreAction::SetDateRange(Some(bounds)));
                }
                Err(e) => self.set_notification(format!("Range: {e}")),
            },
            Focus::From => match parse_picker_date(self.from_input.content(), &Local) {
                Ok(date) => {
                    let ms = date.timestamp_millis();
                    let propagation = self.selector.pick_from(date);
                    if propagation.ticks == TickUpdate::Missed {
                        debug!(ms, "from date has no tick on its day");
                    }
                    self.commit_filters(StoreAction::SetMinDate(ms));
                }
                Err(e) => self.set_notification(format!("From: {e}")),
            },
            Focus::To => match parse_picker_date(self.to_input.content(), &Local) {
                Ok(date) => {
                    let ms = date.timestamp_millis();
                    let propagation = self.selector.pick_to(date);
                    if propagation.ticks == TickUpdate::Missed {
                        debug!(ms, "to date has no tick on its day");
                    }
                    self.commit_filters(StoreAction::SetMaxDate(ms));
                }
                Err(e) => self.set_notification(format!("To: {e}")),
            },
            Focus::Search => self.focus = Focus::Table,
            Focus::Slider | Focus::Table => {}
        }
    }

    /// Record a selector edit in the store and refetch from the first page.
    fn commit_filters(&mut self, action: StoreAction) {
        self.dispatch(action);
        // The selector already shows this revision
        self.binding.acknowledge(self.store.state().filters.revision);
        self.sync_inputs();
        self.request_page(0);
    }

    /// Dispatch a filter change that did not come from the selector.
    pub fn apply_store_action(&mut self, action: StoreAction) {
        self.dispatch(action);
        self.follow_store();
    }

    /// Project pending store changes into the selector.
    pub fn follow_store(&mut self) {
        if self
            .binding
            .follow(&mut self.filters_rx, &mut self.selector)
            .is_some()
        {
            self.sync_inputs();
        }
    }

    /// Rewrite the picker fields from the selector's views.
    fn sync_inputs(&mut self) {
        let (start, end) = self.selector.range().get();
        self.range_input.set(format_picker_range(
            start.timestamp_millis(),
            end.timestamp_millis(),
            &Local,
        ));
        self.from_input
            .set(format_picker_date(self.selector.from().get().timestamp_millis(), &Local));
        self.to_input
            .set(format_picker_date(self.selector.to().get().timestamp_millis(), &Local));
    }

    // ------------------------------------------------------------------
    // Rows
    // ------------------------------------------------------------------

    fn dispatch(&mut self, action: StoreAction) {
        if let Some(effect) = self.store.dispatch(action) {
            self.effects.push(effect);
        }
    }

    fn request_page(&mut self, offset: u64) {
        let params = FetchParams::new(
            self.selector.selection(),
            Utc::now().timestamp_millis(),
            offset,
        );
        self.dispatch(StoreAction::FetchExecutionEvents(params));
    }

    /// Params for another page of the current query.
    fn page_params(&self, offset: u64) -> FetchParams {
        self.store
            .state()
            .execution_events
            .last_request
            .as_ref()
            .map_or_else(
                || {
                    FetchParams::new(
                        self.selector.selection(),
                        Utc::now().timestamp_millis(),
                        offset,
                    )
                },
                |params| params.at_offset(offset),
            )
    }

    /// Fetch the next page, if any.
    pub fn next_page(&mut self) {
        match self.state().execution_events.next_offset(self.page_size) {
            Some(offset) => {
                let params = self.page_params(offset);
                self.dispatch(StoreAction::FetchExecutionEvents(params));
            }
            None => self.set_notification("Already on the last page"),
        }
    }

    /// Fetch the previous page, if any.
    pub fn prev_page(&mut self) {
        match self.state().execution_events.prev_offset(self.page_size) {
            Some(offset) => {
                let params = self.page_params(offset);
                self.dispatch(StoreAction::FetchExecutionEvents(params));
            }
            None => self.set_notification("Already on the first page"),
        }
    }

    /// Fetch the current page again with a fresh as-at time.
    pub fn refresh(&mut self) {
        let offset = self.state().execution_events.offset;
        self.request_page(offset);
    }

    /// Apply the outcome of a fetch effect.
    pub fn apply_fetch_result(
        &mut self,
        request_seq: u64,
        result: Result<ExecutionEventsPage, ApiError>,
    ) {
        let failure = result.as_ref().err().map(ToString::to_string);
        let action = match result {
            Ok(page) => StoreAction::FetchSucceeded { request_seq, page },
            Err(e) => StoreAction::FetchFailed {
                request_seq,
                message: e.to_string(),
            },
        };
        self.dispatch(action);

        let current = self.state().execution_events.request_seq == request_seq;
        if let (Some(message), true) = (failure, current) {
            self.set_notification(format!("Fetch failed: {message}"));
        }
        self.refilter();
    }

    /// Recompute the visible rows from the canonical page.
    fn refilter(&mut self) {
        self.visible = filter_events(self.page_rows(), self.search_input.content());
        self.selected_row = self.selected_row.min(self.visible.len().saturating_sub(1));
    }

    /// Navigate to the lineage overview of the selected row.
    pub fn open_selected(&mut self) {
        let Some(event) = self.selected_event() else {
            self.set_notification("No row selected");
            return;
        };
        let target = NavigationTarget::lineage_overview(&event.datasource, &event.application_id);

        let url = match target.resolve(&self.ui_base_url) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "cannot build lineage overview URL");
                self.set_notification(e.to_string());
                return;
            }
        };

        match self.navigator.navigate(&url) {
            Ok(()) => {
                info!(%url, "navigated to lineage overview");
                self.set_notification(format!("Opened {url}"));
            }
            Err(e) => {
                warn!(error = %e, %url, "navigation failed");
                self.set_notification(format!("Navigation failed: {e}"));
            }
        }
        self.last_url = Some(url.to_string());
    }

    // ------------------------------------------------------------------
    // Housekeeping
    // ------------------------------------------------------------------

    /// Set a temporary notification message.
    pub fn set_notification(&mut self, msg: impl Into<String>) {
        self.notification = Some(msg.into());
        self.notification_ttl = NOTIFICATION_TICKS;
    }

    /// Advance animations and expire notifications.
    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);

        if self.notification_ttl > 0 {
            self.notification_ttl -= 1;
            if self.notification_ttl == 0 {
                self.notification = None;
            }
        }
    }
}

#[cfg(test)]
impl App {
    /// App over 1-5 January 2024 (local time) with the first sample page loaded.
    pub fn new_for_test() -> Self {
        Self::new_for_test_with_config(&Config::default())
    }

    pub fn new_for_test_with_config(config: &Config) -> Self {
        use chrono::TimeZone;
        use lineview_engine::{MemoryNavigator, TimeInterval};

        let start = Local.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let end = Local.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap();
        let interval = TimeInterval::ordered(start.timestamp_millis(), end.timestamp_millis());
        let selector = TimeRangeSelector::with_interval(interval, Local);

        let mut app = Self::with_selector(
            selector,
            config,
            Box::new(MemoryNavigator::new()),
            "sample data",
        );
        app.answer_fetches();
        app
    }

    /// Resolve pending fetch effects from the sample rows.
    pub fn answer_fetches(&mut self) {
        for effect in self.take_effects() {
            let Effect::Fetch {
                request_seq,
                params,
            } = effect;
            let page = lineview_engine::sample_page(params.offset_value(), self.page_size);
            self.apply_fetch_result(request_seq, Ok(page));
        }
    }
}

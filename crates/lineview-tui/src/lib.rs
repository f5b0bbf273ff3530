//! lineview-tui: Terminal dashboard for lineage execution events
//!
//! This crate provides the TUI layer for lineview, including:
//! - The dashboard screen (range slider, date fields, search, events table)
//! - The application state that keeps the selector and store in sync
//! - Shared widgets (range slider, text input, events table, status bar)

mod app;
mod event;
mod screens;
#[cfg(test)]
pub mod test_utils;
mod ui;

use screens::Screen as ScreenTrait;

pub use app::{App, Focus};
pub use event::{Action, Event, EventHandler};
pub use lineview_engine;

use crossterm::{
    cursor::Show as ShowCursor,
    event::{DisableMouseCapture, EnableMouseCapture, MouseEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use lineview_engine::{
    ApiError, CommandNavigator, Config, Effect, EventSource, ExecutionEventsPage, MemoryNavigator,
    NavigationError, Navigator,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, stdout};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Outcome of one fetch task, tagged with its request sequence.
type FetchOutcome = (u64, Result<ExecutionEventsPage, ApiError>);

/// RAII guard for terminal state restoration.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), DisableMouseCapture, LeaveAlternateScreen, ShowCursor);
    }
}

/// Pick the navigator for row clicks.
///
/// Without an opener command, URLs are only recorded and shown.
pub fn navigator_for(config: &Config) -> Result<Box<dyn Navigator>, NavigationError> {
    if config.open_command.is_empty() {
        Ok(Box::new(MemoryNavigator::new()))
    } else {
        Ok(Box::new(CommandNavigator::new(config.open_command.clone())?))
    }
}

/// Run the TUI application.
///
/// This is the main entry point for the TUI. It sets up the terminal,
/// runs the event loop, and restores the terminal on exit.
pub async fn run_tui(
    config: Config,
    source: EventSource,
) -> Result<(), Box<dyn std::error::Error>> {
    let navigator = navigator_for(&config)?;

    // Setup terminal with RAII guard for cleanup
    enable_raw_mode()?;
    let _guard = TerminalGuard;

    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&config, navigator, source.describe());
    info!(source = %source.describe(), page_size = app.page_size, "dashboard started");

    let mut events = EventHandler::new(config.tick_rate());

    // Main loop
    let result = run_loop(&mut terminal, &mut app, &mut events, &source).await;

    // Restore cursor before guard drops
    terminal.show_cursor()?;

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
    source: &EventSource,
) -> Result<(), Box<dyn std::error::Error>> {
    let (fetch_tx, mut fetch_rx) = mpsc::unbounded_channel::<FetchOutcome>();
    let mut fetch_handles: Vec<JoinHandle<()>> = Vec::new();

    loop {
        // Start fetches requested since the last pass
        spawn_fetches(app, source, &fetch_tx, &mut fetch_handles);

        // Draw
        terminal.draw(|frame| {
            let area = frame.area();
            let buf = frame.buffer_mut();

            screens::dashboard::DashboardScreen.render(app, area, buf);

            // Render help overlay if visible
            if app.show_help {
                screens::render_help_overlay(area, buf);
            }
        })?;

        tokio::select! {
            Some(event) = events.next() => handle_event(app, event),
            Some((request_seq, result)) = fetch_rx.recv() => {
                app.apply_fetch_result(request_seq, result);
            }
            else => break,
        }

        // Filter changes dispatched by anyone but the selector
        app.follow_store();

        fetch_handles.retain(|handle| !handle.is_finished());

        if app.should_quit {
            // Abort any in-flight fetches
            for handle in fetch_handles {
                handle.abort();
            }
            break;
        }
    }

    Ok(())
}

fn handle_event(app: &mut App, event: Event) {
    match event {
        Event::Key(key) => app.handle_key(key),
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::ScrollUp => app.handle_action(Action::Up),
            MouseEventKind::ScrollDown => app.handle_action(Action::Down),
            _ => {}
        },
        Event::Tick => app.tick(),
        Event::Resize(_, _) => {
            // Terminal will handle resize automatically
        }
    }
}

fn spawn_fetches(
    app: &mut App,
    source: &EventSource,
    fetch_tx: &mpsc::UnboundedSender<FetchOutcome>,
    fetch_handles: &mut Vec<JoinHandle<()>>,
) {
    for effect in app.take_effects() {
        match effect {
            Effect::Fetch {
                request_seq,
                params,
            } => {
                let source = source.clone();
                let tx = fetch_tx.clone();
                let size = app.page_size;
                debug!(request_seq, "spawning fetch");
                fetch_handles.push(tokio::spawn(async move {
                    let result = source.fetch(&params, size).await;
                    // The loop may have exited; nothing to report to
                    let _ = tx.send((request_seq, result));
                }));
            }
        }
    }
}

/// Get the TUI version.
pub fn tui_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tui_version() {
        let version = tui_version();
        assert!(!version.is_empty());
        assert!(version.starts_with("0."));
    }

    #[test]
    fn test_navigator_for_without_command_records_urls() {
        let config = Config::default();
        let mut navigator = navigator_for(&config).unwrap();
        let url = lineview_engine::NavigationTarget::lineage_overview("s3://lake/x", "app-1")
            .resolve(&config.ui_base_url)
            .unwrap();

        assert!(navigator.navigate(&url).is_ok());
    }

    #[test]
    fn test_navigator_for_rejects_empty_program() {
        let config = Config {
            open_command: vec![String::new()],
            ..Config::default()
        };

        assert!(matches!(
            navigator_for(&config),
            Err(NavigationError::NoOpener)
        ));
    }
}

#[cfg(test)]
mod loop_tests {
    use super::*;
    use crate::test_utils::create_test_app;

    // ========================================================================
    // Fetch plumbing
    // ========================================================================

    #[tokio::test]
    async fn test_spawned_sample_fetch_reports_back() {
        let mut app = create_test_app();
        app.handle_action(Action::Refresh);

        let (tx, mut rx) = mpsc::unbounded_channel::<FetchOutcome>();
        let mut handles = Vec::new();
        spawn_fetches(&mut app, &EventSource::Sample, &tx, &mut handles);
        assert_eq!(handles.len(), 1);

        let (request_seq, result) = rx.recv().await.unwrap();
        assert_eq!(request_seq, 2);
        app.apply_fetch_result(request_seq, result);

        assert!(!app.is_loading());
        assert_eq!(app.page_rows().len(), 7);
    }

    #[test]
    fn test_scroll_moves_table_cursor() {
        use crossterm::event::{KeyModifiers, MouseEvent};

        let mut app = create_test_app();
        app.focus = Focus::Table;
        let scroll = MouseEvent {
            kind: MouseEventKind::ScrollDown,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        };

        handle_event(&mut app, Event::Mouse(scroll));

        assert_eq!(app.selected_row, 1);
    }

    #[test]
    fn test_quit_key_sets_should_quit() {
        use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

        let mut app = create_test_app();
        handle_event(
            &mut app,
            Event::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)),
        );

        assert!(app.should_quit);
    }
}

// Terminal UI: layout, input handling, and widget rendering.
//
// The TUI owns a `ViewState` holding the latest `AppSnapshot` plus purely
// local state (focus, selection, scroll, quit confirmation). The app
// orchestrator pushes `UiUpdate` messages over an mpsc channel; the TUI
// applies them and re-renders at ~30 fps.

pub mod input;
pub mod layout;
pub mod widgets;

use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::mpsc;

use crate::auth::AuthField;
use crate::protocol::{AppSnapshot, UiUpdate, UserCommand};
use crate::router::Route;

use layout::build_layout;

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local state for rendering.
pub struct ViewState {
    /// Latest state pushed by the app orchestrator.
    pub snapshot: AppSnapshot,
    /// Focused field on the auth screen.
    pub auth_focus: AuthField,
    /// Selected row (display order) on the scoreboard.
    pub selected_row: usize,
    /// Lines scrolled back from the bottom of the chat transcript.
    pub chat_scroll_back: usize,
    /// Whether the quit confirmation dialog is showing.
    pub confirm_quit: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            snapshot: AppSnapshot::default(),
            auth_focus: AuthField::Username,
            selected_row: 0,
            chat_scroll_back: 0,
            confirm_quit: false,
        }
    }
}

impl ViewState {
    /// Replace the snapshot. Local state that no longer fits the new
    /// snapshot is clamped or reset.
    pub fn apply_snapshot(&mut self, snapshot: AppSnapshot) {
        let route_changed = snapshot.route != self.snapshot.route;
        let transcript_grew =
            snapshot.chat.transcript().len() != self.snapshot.chat.transcript().len();

        if route_changed {
            self.auth_focus = AuthField::Username;
            self.selected_row = 0;
            self.chat_scroll_back = 0;
        }
        if transcript_grew {
            self.chat_scroll_back = 0;
        }
        if !AuthField::visible(snapshot.auth.mode).contains(&self.auth_focus) {
            self.auth_focus = AuthField::Username;
        }
        let rows = snapshot.scoreboard.entries().len();
        self.selected_row = self.selected_row.min(rows.saturating_sub(1));

        self.snapshot = snapshot;
    }

    pub fn route(&self) -> Route {
        self.snapshot.route
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState.
fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::Snapshot(snapshot) => state.apply_snapshot(*snapshot),
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the complete frame for the current screen.
pub fn render_frame(frame: &mut Frame, state: &ViewState) {
    let hint_visible =
        state.route() == Route::Home && state.snapshot.chat.hint().is_some();
    let layout = build_layout(frame.area(), hint_visible);

    widgets::status_bar::render(frame, layout.status_bar, state);

    match state.route() {
        Route::Welcome => widgets::welcome::render(frame, layout.body, state),
        Route::Login => widgets::login::render(frame, layout.body, state),
        Route::Home => widgets::chat::render(frame, layout.body, state),
        Route::Scoreboard => widgets::scoreboard::render(frame, layout.body, state),
    }

    if let (Some(area), Some(hint)) = (layout.hint_panel, state.snapshot.chat.hint()) {
        widgets::hint::render(frame, area, hint);
    }

    render_help_bar(frame, layout.help_bar, state.route());

    if state.confirm_quit {
        widgets::quit_confirm::render(frame, frame.area());
    }
}

/// Key reminders for `route`.
pub fn help_text(route: Route) -> &'static str {
    match route {
        Route::Welcome => " Enter:Sign in | F1-F4:Screens | Esc:Quit",
        Route::Login => {
            " Tab:Next field | Enter:Submit | ^T:Login/Signup | ^P:Show password | F1-F4:Screens"
        }
        Route::Home => {
            " Enter:Send | ^N:New question | ^S:Shift subject | ^H:Hint | PgUp/PgDn:Scroll | ^O:Logout"
        }
        Route::Scoreboard => {
            " Enter:Add | Up/Down:Select | +:Point | ^R:Reset | ^F:Refresh | ^O:Logout"
        }
    }
}

fn render_help_bar(frame: &mut Frame, area: ratatui::layout::Rect, route: Route) {
    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        help_text(route),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::DIM),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop.
///
/// 1. Initializes the terminal (raw mode, alternate screen).
/// 2. Installs a panic hook to restore the terminal on crash.
/// 3. Runs an async select loop: UI updates, keyboard input, render ticks.
/// 4. Restores the terminal on exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState::default();
    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let result = loop {
        tokio::select! {
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => apply_ui_update(&mut view_state, ui_update),
                    // App is shutting down
                    None => break Ok(()),
                }
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let quit = cmd == UserCommand::Quit;
                            let _ = cmd_tx.send(cmd).await;
                            if quit {
                                break Ok(());
                            }
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break Err(anyhow::Error::from(e)),
                    None => break Ok(()),
                }
            }

            _ = render_tick.tick() => {
                if let Err(e) = terminal.draw(|frame| render_frame(frame, &view_state)) {
                    break Err(e.into());
                }
            }
        }
    };

    ratatui::restore();
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

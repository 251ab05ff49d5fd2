// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages sent to the
// app orchestrator, or into local ViewState mutations (focus, selection,
// scrolling, quit confirmation).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::ViewState;
use crate::auth::AuthField;
use crate::protocol::{InputEdit, UserCommand};
use crate::router::Route;

/// Lines moved per PageUp/PageDown in the chat transcript.
const PAGE_SIZE: usize = 10;

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// app orchestrator. Returns `None` when it was handled locally or ignored.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // crossterm reports both press and release on some platforms.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    let ctrl = key_event.modifiers.contains(KeyModifiers::CONTROL);

    // Ctrl+C always quits immediately regardless of mode
    if ctrl && key_event.code == KeyCode::Char('c') {
        return Some(UserCommand::Quit);
    }

    if view_state.confirm_quit {
        return handle_confirm_quit(key_event, view_state);
    }

    // Global navigation
    match key_event.code {
        KeyCode::F(n @ 1..=4) => {
            let route = Route::ALL[usize::from(n - 1)];
            return Some(UserCommand::Navigate(route.path().to_string()));
        }
        KeyCode::Char('o') if ctrl => return Some(UserCommand::Logout),
        _ => {}
    }

    match view_state.route() {
        Route::Welcome => handle_welcome(key_event, view_state),
        Route::Login => handle_auth(key_event, view_state),
        Route::Home => handle_chat(key_event, view_state),
        Route::Scoreboard => handle_scoreboard(key_event, view_state),
    }
}

/// In quit confirmation mode `y`/`q` confirm, `n`/`Esc` cancel and every
/// other key is blocked.
fn handle_confirm_quit(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Char('q') | KeyCode::Char('Q') => {
            Some(UserCommand::Quit)
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            view_state.confirm_quit = false;
            None
        }
        _ => None,
    }
}

fn handle_welcome(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Enter => Some(UserCommand::Navigate("/signin".into())),
        KeyCode::Esc | KeyCode::Char('q') => {
            view_state.confirm_quit = true;
            None
        }
        _ => None,
    }
}

/// Map a key to an edit of a text box holding `current`. Esc on an empty box
/// opens the quit confirmation instead.
fn text_edit(key_event: &KeyEvent, current: &str, view_state: &mut ViewState) -> Option<InputEdit> {
    let plain = !key_event
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
    match key_event.code {
        KeyCode::Char(c) if plain => Some(InputEdit::Insert(c)),
        KeyCode::Backspace => Some(InputEdit::Backspace),
        KeyCode::Esc if !current.is_empty() => Some(InputEdit::Clear),
        KeyCode::Esc => {
            view_state.confirm_quit = true;
            None
        }
        _ => None,
    }
}

fn handle_auth(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    let ctrl = key_event.modifiers.contains(KeyModifiers::CONTROL);
    let fields = AuthField::visible(view_state.snapshot.auth.mode);

    match key_event.code {
        KeyCode::Tab | KeyCode::Down => {
            view_state.auth_focus = cycle_focus(fields, view_state.auth_focus, true);
            None
        }
        KeyCode::BackTab | KeyCode::Up => {
            view_state.auth_focus = cycle_focus(fields, view_state.auth_focus, false);
            None
        }
        KeyCode::Enter => Some(UserCommand::SubmitAuth),
        KeyCode::Char('t') if ctrl => {
            view_state.auth_focus = AuthField::Username;
            Some(UserCommand::ToggleAuthMode)
        }
        KeyCode::Char('p') if ctrl => Some(UserCommand::TogglePasswordVisibility),
        _ => {
            let focus = view_state.auth_focus;
            let current = auth_field_text(view_state, focus).to_string();
            text_edit(&key_event, &current, view_state)
                .map(|edit| UserCommand::EditAuth(focus, edit))
        }
    }
}

fn auth_field_text(view_state: &ViewState, field: AuthField) -> &str {
    let auth = &view_state.snapshot.auth;
    match field {
        AuthField::Username => &auth.username,
        AuthField::Password => &auth.password,
        AuthField::ConfirmPassword => &auth.confirm_password,
        AuthField::Grade => &auth.grade,
    }
}

/// Next (or previous) field after `current`, wrapping around.
fn cycle_focus(fields: &[AuthField], current: AuthField, forward: bool) -> AuthField {
    let len = fields.len();
    let index = fields.iter().position(|f| *f == current).unwrap_or(0);
    let next = if forward {
        (index + 1) % len
    } else {
        (index + len - 1) % len
    };
    fields[next]
}

fn handle_chat(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    let ctrl = key_event.modifiers.contains(KeyModifiers::CONTROL);

    match key_event.code {
        KeyCode::Enter => Some(UserCommand::SendMessage),
        KeyCode::Char('n') if ctrl => Some(UserCommand::NewQuestion),
        KeyCode::Char('s') if ctrl => Some(UserCommand::ShiftSubject),
        KeyCode::Char('h') if ctrl => Some(UserCommand::ToggleHint),
        KeyCode::PageUp => {
            view_state.chat_scroll_back = view_state.chat_scroll_back.saturating_add(PAGE_SIZE);
            None
        }
        KeyCode::PageDown => {
            view_state.chat_scroll_back = view_state.chat_scroll_back.saturating_sub(PAGE_SIZE);
            None
        }
        _ => {
            let current = view_state.snapshot.chat.input.clone();
            text_edit(&key_event, &current, view_state).map(UserCommand::EditChat)
        }
    }
}

fn handle_scoreboard(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    let ctrl = key_event.modifiers.contains(KeyModifiers::CONTROL);
    let rows = view_state.snapshot.scoreboard.entries().len();

    match key_event.code {
        KeyCode::Up => {
            view_state.selected_row = view_state.selected_row.saturating_sub(1);
            None
        }
        KeyCode::Down => {
            if view_state.selected_row + 1 < rows {
                view_state.selected_row += 1;
            }
            None
        }
        KeyCode::Char('+') => {
            let ranked = view_state.snapshot.scoreboard.ranked();
            ranked
                .get(view_state.selected_row)
                .map(|entry| UserCommand::IncrementScore(entry.name.clone()))
        }
        KeyCode::Enter => Some(UserCommand::AddUser),
        KeyCode::Char('r') if ctrl => Some(UserCommand::ResetScores),
        KeyCode::Char('f') if ctrl => Some(UserCommand::RefreshScoreboard),
        _ => {
            let current = view_state.snapshot.scoreboard.input.clone();
            text_edit(&key_event, &current, view_state).map(UserCommand::EditScoreboard)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthMode;
    use crate::tui::tests::view_on;
    use crossterm::event::KeyEventState;

    /// Helper to create a simple key press event.
    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    /// Helper to create a KeyEvent with Ctrl modifier.
    fn ctrl_key(c: char) -> KeyEvent {
        KeyEvent {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    // -- Global --

    #[test]
    fn ctrl_c_quits_everywhere() {
        for route in Route::ALL {
            let mut state = view_on(route);
            assert_eq!(handle_key(ctrl_key('c'), &mut state), Some(UserCommand::Quit));
        }
    }

    #[test]
    fn release_events_ignored() {
        let mut state = view_on(Route::Home);
        let mut event = key(KeyCode::Char('a'));
        event.kind = KeyEventKind::Release;
        assert_eq!(handle_key(event, &mut state), None);
    }

    #[test]
    fn function_keys_navigate() {
        let mut state = view_on(Route::Welcome);
        assert_eq!(
            handle_key(key(KeyCode::F(3)), &mut state),
            Some(UserCommand::Navigate("/home".into()))
        );
        assert_eq!(
            handle_key(key(KeyCode::F(4)), &mut state),
            Some(UserCommand::Navigate("/scoreboard".into()))
        );
        assert_eq!(handle_key(key(KeyCode::F(9)), &mut state), None);
    }

    #[test]
    fn ctrl_o_logs_out() {
        let mut state = view_on(Route::Home);
        assert_eq!(handle_key(ctrl_key('o'), &mut state), Some(UserCommand::Logout));
    }

    // -- Quit confirmation --

    #[test]
    fn esc_on_welcome_asks_to_quit() {
        let mut state = view_on(Route::Welcome);
        assert_eq!(handle_key(key(KeyCode::Esc), &mut state), None);
        assert!(state.confirm_quit);

        // Other keys are blocked while confirming.
        assert_eq!(handle_key(key(KeyCode::F(2)), &mut state), None);
        assert_eq!(handle_key(key(KeyCode::Char('n')), &mut state), None);
        assert!(!state.confirm_quit);

        state.confirm_quit = true;
        assert_eq!(
            handle_key(key(KeyCode::Char('y')), &mut state),
            Some(UserCommand::Quit)
        );
    }

    #[test]
    fn enter_on_welcome_goes_to_sign_in() {
        let mut state = view_on(Route::Welcome);
        assert_eq!(
            handle_key(key(KeyCode::Enter), &mut state),
            Some(UserCommand::Navigate("/signin".into()))
        );
    }

    #[test]
    fn esc_clears_text_before_quitting() {
        let mut state = view_on(Route::Home);
        state.snapshot.chat.input = "photosynthesis".into();
        assert_eq!(
            handle_key(key(KeyCode::Esc), &mut state),
            Some(UserCommand::EditChat(InputEdit::Clear))
        );
        assert!(!state.confirm_quit);

        state.snapshot.chat.input.clear();
        assert_eq!(handle_key(key(KeyCode::Esc), &mut state), None);
        assert!(state.confirm_quit);
    }

    // -- Auth --

    #[test]
    fn typing_goes_to_focused_field() {
        let mut state = view_on(Route::Login);
        assert_eq!(
            handle_key(key(KeyCode::Char('a')), &mut state),
            Some(UserCommand::EditAuth(AuthField::Username, InputEdit::Insert('a')))
        );
        handle_key(key(KeyCode::Tab), &mut state);
        assert_eq!(
            handle_key(key(KeyCode::Backspace), &mut state),
            Some(UserCommand::EditAuth(AuthField::Password, InputEdit::Backspace))
        );
    }

    #[test]
    fn tab_cycles_visible_fields() {
        let mut state = view_on(Route::Login);
        handle_key(key(KeyCode::Tab), &mut state);
        assert_eq!(state.auth_focus, AuthField::Password);
        handle_key(key(KeyCode::Tab), &mut state);
        assert_eq!(state.auth_focus, AuthField::Username);
        handle_key(key(KeyCode::BackTab), &mut state);
        assert_eq!(state.auth_focus, AuthField::Password);

        state.snapshot.auth.mode = AuthMode::Signup;
        handle_key(key(KeyCode::Tab), &mut state);
        handle_key(key(KeyCode::Tab), &mut state);
        assert_eq!(state.auth_focus, AuthField::Grade);
    }

    #[test]
    fn auth_shortcuts() {
        let mut state = view_on(Route::Login);
        state.auth_focus = AuthField::Password;
        assert_eq!(
            handle_key(ctrl_key('t'), &mut state),
            Some(UserCommand::ToggleAuthMode)
        );
        assert_eq!(state.auth_focus, AuthField::Username);
        assert_eq!(
            handle_key(ctrl_key('p'), &mut state),
            Some(UserCommand::TogglePasswordVisibility)
        );
        assert_eq!(
            handle_key(key(KeyCode::Enter), &mut state),
            Some(UserCommand::SubmitAuth)
        );
    }

    // -- Chat --

    #[test]
    fn chat_shortcuts() {
        let mut state = view_on(Route::Home);
        assert_eq!(handle_key(key(KeyCode::Enter), &mut state), Some(UserCommand::SendMessage));
        assert_eq!(handle_key(ctrl_key('n'), &mut state), Some(UserCommand::NewQuestion));
        assert_eq!(handle_key(ctrl_key('s'), &mut state), Some(UserCommand::ShiftSubject));
        assert_eq!(handle_key(ctrl_key('h'), &mut state), Some(UserCommand::ToggleHint));
        assert_eq!(
            handle_key(key(KeyCode::Char('x')), &mut state),
            Some(UserCommand::EditChat(InputEdit::Insert('x')))
        );
    }

    #[test]
    fn chat_scroll_is_local() {
        let mut state = view_on(Route::Home);
        assert_eq!(handle_key(key(KeyCode::PageUp), &mut state), None);
        assert_eq!(state.chat_scroll_back, PAGE_SIZE);
        handle_key(key(KeyCode::PageDown), &mut state);
        handle_key(key(KeyCode::PageDown), &mut state);
        assert_eq!(state.chat_scroll_back, 0);
    }

    #[test]
    fn unbound_ctrl_keys_do_not_type() {
        let mut state = view_on(Route::Home);
        assert_eq!(handle_key(ctrl_key('z'), &mut state), None);
    }

    // -- Scoreboard --

    #[test]
    fn plus_increments_selected_row() {
        let mut state = view_on(Route::Scoreboard);
        handle_key(key(KeyCode::Down), &mut state);
        let expected = state.snapshot.scoreboard.ranked()[1].name.clone();
        assert_eq!(
            handle_key(key(KeyCode::Char('+')), &mut state),
            Some(UserCommand::IncrementScore(expected))
        );
    }

    #[test]
    fn selection_stays_in_bounds() {
        let mut state = view_on(Route::Scoreboard);
        handle_key(key(KeyCode::Up), &mut state);
        assert_eq!(state.selected_row, 0);
        for _ in 0..10 {
            handle_key(key(KeyCode::Down), &mut state);
        }
        assert_eq!(state.selected_row, 3);
    }

    #[test]
    fn scoreboard_shortcuts() {
        let mut state = view_on(Route::Scoreboard);
        assert_eq!(handle_key(key(KeyCode::Enter), &mut state), Some(UserCommand::AddUser));
        assert_eq!(handle_key(ctrl_key('r'), &mut state), Some(UserCommand::ResetScores));
        assert_eq!(
            handle_key(ctrl_key('f'), &mut state),
            Some(UserCommand::RefreshScoreboard)
        );
        assert_eq!(
            handle_key(key(KeyCode::Char('D')), &mut state),
            Some(UserCommand::EditScoreboard(InputEdit::Insert('D')))
        );
    }
}

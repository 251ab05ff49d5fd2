// Login/signup form widget.
//
// Username and password always; confirm password and grade in signup mode.
// The focused field is highlighted, passwords are masked unless shown, and
// the form's error (or a submitting indicator) sits under the fields.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::auth::{AuthField, AuthForm, AuthMode, AuthStatus};
use crate::tui::ViewState;

/// Width of the form box.
const FORM_WIDTH: u16 = 60;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let form = &state.snapshot.auth;
    let title = match form.mode {
        AuthMode::Login => " Sign in ",
        AuthMode::Signup => " Create account ",
    };

    let mut lines = vec![Line::from("")];
    for field in AuthField::visible(form.mode) {
        lines.push(field_line(form, *field, *field == state.auth_focus));
        lines.push(Line::from(""));
    }
    lines.push(status_line(form));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        match form.mode {
            AuthMode::Login => "No account yet? Press Ctrl+T to sign up.",
            AuthMode::Signup => "Already registered? Press Ctrl+T to sign in.",
        },
        Style::default().fg(Color::Gray),
    )));

    let [column] = Layout::horizontal([Constraint::Length(FORM_WIDTH.min(area.width))])
        .flex(ratatui::layout::Flex::Center)
        .areas(area);

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title),
    );
    frame.render_widget(paragraph, column);
}

pub fn field_label(field: AuthField) -> &'static str {
    match field {
        AuthField::Username => "Username",
        AuthField::Password => "Password",
        AuthField::ConfirmPassword => "Confirm password",
        AuthField::Grade => "Grade (optional)",
    }
}

/// Text shown for `field`, masked for passwords unless the form shows them.
pub fn display_value(form: &AuthForm, field: AuthField) -> String {
    let (value, secret) = match field {
        AuthField::Username => (&form.username, false),
        AuthField::Password => (&form.password, true),
        AuthField::ConfirmPassword => (&form.confirm_password, true),
        AuthField::Grade => (&form.grade, false),
    };
    if secret && !form.show_password {
        "*".repeat(value.chars().count())
    } else {
        value.clone()
    }
}

fn field_line(form: &AuthForm, field: AuthField, focused: bool) -> Line<'static> {
    let label_style = if focused {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let cursor = if focused { "_" } else { "" };
    Line::from(vec![
        Span::styled(format!(" {:<18}", field_label(field)), label_style),
        Span::raw(format!("{}{}", display_value(form, field), cursor)),
    ])
}

fn status_line(form: &AuthForm) -> Line<'static> {
    match &form.status {
        AuthStatus::Error(message) => Line::from(Span::styled(
            format!(" {message}"),
            Style::default().fg(Color::Red),
        )),
        AuthStatus::Submitting => Line::from(Span::styled(
            match form.mode {
                AuthMode::Login => " Signing in...",
                AuthMode::Signup => " Creating account...",
            },
            Style::default().fg(Color::Yellow),
        )),
        AuthStatus::LoggedIn | AuthStatus::LoggedOut => Line::from(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Route;
    use crate::tui::tests::{render_to_string, view_on};

    #[test]
    fn password_masked_until_shown() {
        let mut state = view_on(Route::Login);
        state.snapshot.auth.password = "secret99".into();
        assert_eq!(
            display_value(&state.snapshot.auth, AuthField::Password),
            "********"
        );
        state.snapshot.auth.show_password = true;
        assert_eq!(
            display_value(&state.snapshot.auth, AuthField::Password),
            "secret99"
        );
    }

    #[test]
    fn login_mode_hides_signup_fields() {
        let state = view_on(Route::Login);
        let text = render_to_string(&state, 100, 24);
        assert!(text.contains("Sign in"));
        assert!(text.contains("Username"));
        assert!(!text.contains("Confirm password"));
    }

    #[test]
    fn signup_mode_shows_all_fields() {
        let mut state = view_on(Route::Login);
        state.snapshot.auth.mode = AuthMode::Signup;
        let text = render_to_string(&state, 100, 24);
        assert!(text.contains("Create account"));
        assert!(text.contains("Confirm password"));
        assert!(text.contains("Grade"));
    }

    #[test]
    fn error_is_rendered() {
        let mut state = view_on(Route::Login);
        state.snapshot.auth.status = AuthStatus::Error("Passwords do not match".into());
        let text = render_to_string(&state, 100, 24);
        assert!(text.contains("Passwords do not match"));
    }
}

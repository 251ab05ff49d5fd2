// Status bar widget: product name, screen tabs, signed-in user, backend mode.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::router::Route;
use crate::tui::ViewState;

/// Render the status bar into the given area.
///
/// Layout: [name] [screen tabs] | [user] | [backend indicator]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut spans = vec![Span::styled(
        " Bons.ai ",
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
    )];

    spans.extend(route_spans(state.route()));
    spans.push(Span::styled("| ", Style::default().fg(Color::Gray)));

    let session = &state.snapshot.session;
    if session.is_authenticated() {
        spans.push(Span::styled(
            session.display_name.clone(),
            Style::default().fg(Color::White),
        ));
    } else {
        spans.push(Span::styled(
            "Signed out",
            Style::default().fg(Color::Gray),
        ));
    }

    spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));
    let (dot, color, label) = backend_indicator(state.snapshot.online);
    spans.push(Span::styled(format!("{dot} "), Style::default().fg(color)));
    spans.push(Span::styled(label, Style::default().fg(Color::White)));

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// Dot, colour and label for the backend mode.
pub fn backend_indicator(online: bool) -> (&'static str, Color, &'static str) {
    if online {
        ("●", Color::Green, "Online")
    } else {
        ("●", Color::Yellow, "Offline tutor")
    }
}

/// One `[F<n>:Title]` span per screen, current screen highlighted.
pub fn route_spans(active: Route) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    for (i, route) in Route::ALL.iter().enumerate() {
        let style = if *route == active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(format!("[F{}:{}]", i + 1, route.title()), style));
        spans.push(Span::raw(" "));
    }
    spans
}

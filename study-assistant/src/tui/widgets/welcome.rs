// Welcome screen: product name, short blurb, and how to get started.

use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::tui::ViewState;

const BLURB: &str = "Pick a topic, get a question, answer it and see how you did. \
Ask for a hint whenever you are stuck and keep score with your friends.";

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let session = &state.snapshot.session;
    let action = if session.is_authenticated() {
        format!("Signed in as {}. Press F3 to start studying.", session.display_name)
    } else {
        "Press Enter to sign in or create an account.".to_string()
    };

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Bons.ai",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Your AI study assistant",
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
        Line::from(BLURB),
        Line::from(""),
        Line::from(Span::styled(
            action,
            Style::default().fg(Color::Yellow),
        )),
    ];

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Welcome"));
    frame.render_widget(paragraph, area);
}

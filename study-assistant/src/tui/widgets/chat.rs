// Chat screen widget: transcript, feedback line, and input box.
//
// The transcript sticks to the bottom unless the user has scrolled back.

use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::chat::{plain_text, ChatPhase, ChatState, ChatTurn, Feedback, Speaker};
use crate::tui::ViewState;

/// Shown above the input box before a topic is chosen.
pub const EMPTY_TITLE: &str = "Which topic do you want to learn?";

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let chat = &state.snapshot.chat;
    let [transcript_area, feedback_area, input_area] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(1),
        Constraint::Length(3),
    ])
    .areas(area);

    render_transcript(frame, transcript_area, chat, state.chat_scroll_back);

    if let Some(line) = feedback_line(chat) {
        frame.render_widget(Paragraph::new(line), feedback_area);
    }

    render_input(frame, input_area, chat);
}

fn render_transcript(frame: &mut Frame, area: Rect, chat: &ChatState, scroll_back: usize) {
    let title = match chat.topic() {
        Some(topic) => format!(" Studying: {topic} "),
        None => " Study ".to_string(),
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    if chat.transcript().is_empty() {
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                EMPTY_TITLE,
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Type a topic below and press Enter.",
                Style::default().fg(Color::Gray),
            )),
        ];
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let inner_width = area.width.saturating_sub(2);
    let inner_height = usize::from(area.height.saturating_sub(2));
    let paragraph =
        Paragraph::new(transcript_lines(chat.transcript())).wrap(Wrap { trim: false });
    // Counted before the block is attached so only the inner area is measured.
    let total = paragraph.line_count(inner_width);
    let offset = total
        .saturating_sub(inner_height)
        .saturating_sub(scroll_back);

    let paragraph = paragraph
        .scroll((u16::try_from(offset).unwrap_or(u16::MAX), 0))
        .block(block);
    frame.render_widget(paragraph, area);
}

/// Transcript as styled lines: a header per turn, then its text.
pub fn transcript_lines(turns: &[ChatTurn]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for turn in turns {
        let (name, color) = match turn.speaker {
            Speaker::User => ("You", Color::Cyan),
            Speaker::Assistant => ("Bons.ai", Color::Green),
        };
        let color = if turn.is_error { Color::Red } else { color };
        lines.push(Line::from(vec![
            Span::styled(
                name,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", turn.at.format("%H:%M")),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
        let text_style = if turn.is_error {
            Style::default().fg(Color::Red)
        } else {
            Style::default()
        };
        for text in plain_text(&turn.text).lines() {
            lines.push(Line::from(Span::styled(text.to_string(), text_style)));
        }
        lines.push(Line::from(""));
    }
    lines
}

/// Status under the transcript: waiting indicator or answer feedback.
pub fn feedback_line(chat: &ChatState) -> Option<Line<'static>> {
    if chat.is_waiting() {
        let text = match chat.phase() {
            ChatPhase::AwaitingEvaluation => " Checking your answer...",
            _ => " Preparing a question...",
        };
        return Some(Line::from(Span::styled(
            text,
            Style::default().fg(Color::Yellow),
        )));
    }
    let score = chat
        .last_score()
        .map(|score| format!(" ({score:.0}/100)"))
        .unwrap_or_default();
    let line = match chat.feedback()? {
        Feedback::Correct => Line::from(Span::styled(
            format!(" ✓ Correct!{score} Press Ctrl+N for a new question."),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Feedback::Wrong => Line::from(Span::styled(
            format!(" ✗ Not quite{score}. Try again, or press Ctrl+H for a hint."),
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        )),
        Feedback::Unscored => Line::from(Span::styled(
            " Answer checked (no score available). Press Ctrl+N for a new question.",
            Style::default().fg(Color::Gray),
        )),
    };
    Some(line)
}

fn render_input(frame: &mut Frame, area: Rect, chat: &ChatState) {
    let title = if chat.phase() == ChatPhase::Idle {
        " Topic "
    } else {
        " Your answer "
    };
    let style = if chat.is_waiting() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::White)
    };
    let paragraph = Paragraph::new(format!("{}_", chat.input))
        .style(style)
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(paragraph, area);
}

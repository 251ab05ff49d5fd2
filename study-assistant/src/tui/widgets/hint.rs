// Hint side panel for the chat screen.

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::chat::plain_text;

pub fn render(frame: &mut Frame, area: Rect, hint: &str) {
    let paragraph = Paragraph::new(plain_text(hint))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Hint (Ctrl+H to close) "),
        );
    frame.render_widget(paragraph, area);
}

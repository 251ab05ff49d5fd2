// Scoreboard widget: ranked table, add-user box, and notice line.
//
// Rows are in ranking order. The signed-in user's row is highlighted and the
// selected row carries the `>>` marker.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use ratatui::Frame;

use crate::scoreboard::Scoreboard;
use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let board = &state.snapshot.scoreboard;
    let [table_area, notice_area, input_area] = Layout::vertical([
        Constraint::Min(4),
        Constraint::Length(1),
        Constraint::Length(3),
    ])
    .areas(area);

    render_table(frame, table_area, board, state.selected_row, state.snapshot.online);

    if let Some(line) = notice_line(board) {
        frame.render_widget(Paragraph::new(line), notice_area);
    }

    let input = Paragraph::new(format!("{}_", board.input)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Add a friend (Enter) "),
    );
    frame.render_widget(input, input_area);
}

fn render_table(frame: &mut Frame, area: Rect, board: &Scoreboard, selected: usize, online: bool) {
    let header = Row::new(vec![Cell::from("#"), Cell::from("Name"), Cell::from("Score")]).style(
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = board
        .ranked()
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            let style = if board.is_current_user(&entry.name) {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Green)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(format!("{}", i + 1)),
                Cell::from(entry.name),
                Cell::from(entry.score.to_string()),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Min(16),
        Constraint::Length(7),
    ];

    let title = match (online, board.is_busy()) {
        (true, true) => " Scoreboard (syncing...) ",
        (true, false) => " Scoreboard ",
        (false, _) => " Scoreboard (local) ",
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol(">> ");

    let mut table_state = TableState::default().with_selected(Some(selected));
    frame.render_stateful_widget(table, area, &mut table_state);
}

/// The board's notice, shown in yellow.
pub fn notice_line(board: &Scoreboard) -> Option<Line<'static>> {
    board.notice.as_ref().map(|notice| {
        Line::from(Span::styled(
            format!(" {notice}"),
            Style::default().fg(Color::Yellow),
        ))
    })
}

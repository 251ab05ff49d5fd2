// Screen layout: panel arrangement and sizing.
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +-------------------------------+------------------+
// | Body                          | Hint (35%, chat  |
// |                               | screen only)     |
// +-------------------------------+------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Resolved screen areas.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Top row: product name, screen, signed-in user, backend mode.
    pub status_bar: Rect,
    /// The current screen.
    pub body: Rect,
    /// Right-hand hint panel, present only while a hint is shown.
    pub hint_panel: Option<Rect>,
    /// Bottom row: keyboard shortcut hints.
    pub help_bar: Rect,
}

/// Build the layout from the available terminal area.
pub fn build_layout(area: Rect, hint_visible: bool) -> AppLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Min(3),    // body
            Constraint::Length(1), // help bar
        ])
        .split(area);

    let status_bar = vertical[0];
    let middle = vertical[1];
    let help_bar = vertical[2];

    if !hint_visible {
        return AppLayout {
            status_bar,
            body: middle,
            hint_panel: None,
            help_bar,
        };
    }

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(middle);

    AppLayout {
        status_bar,
        body: horizontal[0],
        hint_panel: Some(horizontal[1]),
        help_bar,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_area() -> Rect {
        Rect::new(0, 0, 120, 40)
    }

    #[test]
    fn bars_are_one_row() {
        let layout = build_layout(test_area(), false);
        assert_eq!(layout.status_bar.height, 1);
        assert_eq!(layout.help_bar.height, 1);
        assert_eq!(layout.status_bar.y, 0);
        assert_eq!(layout.help_bar.y, 39);
    }

    #[test]
    fn body_fills_without_hint() {
        let layout = build_layout(test_area(), false);
        assert_eq!(layout.body.width, 120);
        assert_eq!(layout.body.height, 38);
        assert!(layout.hint_panel.is_none());
    }

    #[test]
    fn hint_splits_body() {
        let layout = build_layout(test_area(), true);
        let hint = layout.hint_panel.unwrap();
        assert_eq!(layout.body.width + hint.width, 120);
        assert!(hint.width < layout.body.width);
        assert_eq!(hint.x, layout.body.x + layout.body.width);
        assert_eq!(hint.height, layout.body.height);
    }

    #[test]
    fn no_overlap_between_rows() {
        let layout = build_layout(test_area(), true);
        assert_eq!(layout.status_bar.y + layout.status_bar.height, layout.body.y);
        assert_eq!(layout.body.y + layout.body.height, layout.help_bar.y);
    }
}

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::{AppState, NARROW_WIDTH_THRESHOLD};

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let narrow = area.width < NARROW_WIDTH_THRESHOLD;

    let hints: &[(&str, &str)] = if state.is_finished() {
        &[("o", "open"), ("q", "quit")]
    } else if narrow {
        &[("o", "open"), ("r", "refresh"), ("q", "quit")]
    } else {
        &[
            ("o", "open in browser"),
            ("r", "refresh now"),
            ("Esc", "dismiss error"),
            ("q", "quit"),
        ]
    };

    let mut spans: Vec<Span> = Vec::new();
    for (i, (key, desc)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(*key, Style::default().fg(Color::Cyan)));
        spans.push(Span::styled(
            format!(" {desc}"),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let footer = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(footer, area);
}

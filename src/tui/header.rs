use crate::app::AppState;
use crate::tui::{spinner_frame, status_color};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let mut spans = vec![
        Span::styled(
            format!(
                " dpw v{}+{} ",
                env!("CARGO_PKG_VERSION"),
                env!("BUILD_NUMBER")
            ),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("│ "),
        Span::styled(
            format!(
                "project {} · pipeline {}",
                state.config.project_id, state.config.pipeline_id
            ),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            format!("[{}]", state.status.label()),
            Style::default().fg(status_color(state.status)),
        ),
    ];

    // Loading spinner or poll countdown
    if state.is_loading {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            format!("{}", spinner_frame(state.spinner_frame)),
            Style::default().fg(Color::Yellow),
        ));
    } else if state.next_poll_in > 0 {
        spans.push(Span::styled(
            format!(" {}s", state.next_poll_in),
            Style::default().fg(Color::DarkGray),
        ));
    }

    // Error indicator
    if state.error_message().is_some() {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            "!",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray)),
    );

    f.render_widget(header, area);
}

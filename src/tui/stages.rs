use crate::app::{AppState, PipelineStatus, StageStatus, UNKNOWN_STAGE_LABEL};
use crate::machine::Outcome;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let inner_width = area.width.saturating_sub(2) as usize;

    if state.stage_views.is_empty() && !state.is_finished() {
        let msg = if state.is_loading {
            "Waiting for the first status response…"
        } else {
            "No stage data yet"
        };
        let para = Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::NONE));
        f.render_widget(para, area);
        return;
    }

    let mut lines: Vec<Line> = Vec::new();

    for view in &state.stage_views {
        let (icon, icon_color) = stage_icon(view.status);
        let is_running = view.status == StageStatus::Running;

        let percent = format!("{:>4}", format!("{}%", view.percent));
        // icon + spaces + percent column
        let name_max = inner_width.saturating_sub(UnicodeWidthStr::width(icon) + percent.len() + 4);
        let name = truncate(&view.name, name_max);

        let name_style = if is_running {
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };

        lines.push(Line::from(vec![
            Span::styled(format!(" {icon} "), Style::default().fg(icon_color)),
            Span::styled(name, name_style),
            Span::raw(" "),
            Span::styled(percent, Style::default().fg(Color::DarkGray)),
        ]));
    }

    if state.status == PipelineStatus::Manual && !state.is_finished() {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            " pipeline is waiting for a manual action",
            Style::default().fg(Color::Magenta),
        )));
    }

    if let Some(message) = &state.unavailable {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            format!(" {message}"),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    } else if let Some(outcome) = state.outcome {
        let (icon, text, color) = match outcome {
            Outcome::Succeeded => ("✓", "Pipeline succeeded", Color::Green),
            Outcome::Failed => ("✗", "Pipeline failed", Color::Red),
            Outcome::Neutral => ("⊘", "Pipeline ended", Color::DarkGray),
        };
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            format!(" {icon} {text}"),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        if let Some(summary) = &state.closing_summary {
            lines.push(Line::from(Span::styled(
                format!("   last stage: {summary}"),
                Style::default().fg(Color::Gray),
            )));
        }
    }

    let list = Paragraph::new(lines).block(Block::default().borders(Borders::NONE));
    f.render_widget(list, area);
}

fn stage_icon(status: StageStatus) -> (&'static str, Color) {
    match status {
        StageStatus::Completed => ("✓", Color::Green),
        StageStatus::Failed => ("✗", Color::Red),
        StageStatus::Canceled => ("⊘", Color::Yellow),
        StageStatus::Running => ("⟳", Color::Yellow),
        StageStatus::Queued | StageStatus::Pending => ("·", Color::DarkGray),
    }
}

fn truncate(s: &str, max_width: usize) -> String {
    let s = if s.is_empty() { UNKNOWN_STAGE_LABEL } else { s };
    if UnicodeWidthStr::width(s) <= max_width {
        s.to_string()
    } else {
        let mut result = String::new();
        let mut width = 0;
        for c in s.chars() {
            let cw = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
            if width + cw + 1 > max_width {
                result.push('…');
                break;
            }
            result.push(c);
            width += cw;
        }
        result
    }
}

pub mod footer;
pub mod header;
pub mod render;
pub mod stages;

use crate::app::PipelineStatus;
use ratatui::style::Color;

const BRAILLE_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

pub fn spinner_frame(idx: usize) -> char {
    BRAILLE_FRAMES[idx % BRAILLE_FRAMES.len()]
}

/// Shared color treatment for the overall status word.
pub fn status_color(status: PipelineStatus) -> Color {
    match status {
        PipelineStatus::Success => Color::Green,
        PipelineStatus::Failed => Color::Red,
        PipelineStatus::Running => Color::Yellow,
        PipelineStatus::Canceled | PipelineStatus::Skipped => Color::DarkGray,
        PipelineStatus::Manual => Color::Magenta,
        PipelineStatus::Pending => Color::DarkGray,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_wraps_around() {
        assert_eq!(spinner_frame(0), spinner_frame(BRAILLE_FRAMES.len()));
    }

    #[test]
    fn spinner_frames_are_braille() {
        for i in 0..BRAILLE_FRAMES.len() {
            let ch = spinner_frame(i);
            assert!(
                ('\u{2800}'..='\u{28FF}').contains(&ch),
                "char {ch:?} not in Braille range"
            );
        }
    }

    #[test]
    fn large_index_no_panic() {
        let _ = spinner_frame(usize::MAX);
    }

    #[test]
    fn terminal_statuses_have_distinct_success_failure_colors() {
        assert_ne!(
            status_color(PipelineStatus::Success),
            status_color(PipelineStatus::Failed)
        );
    }
}

#![allow(dead_code)]

use dpw::app::{AppState, PipelineSnapshot, PipelineStatus, StageSnapshot, StageStatus};

pub fn stage(name: &str, status: StageStatus, percent: f64) -> StageSnapshot {
    StageSnapshot {
        name: Some(name.to_string()),
        status,
        percent: Some(percent),
    }
}

pub fn running_snapshot(percent: f64, stages: Vec<StageSnapshot>) -> PipelineSnapshot {
    PipelineSnapshot {
        status: PipelineStatus::Running,
        percent: Some(percent),
        running_stage: stages
            .iter()
            .find(|s| s.status == StageStatus::Running)
            .and_then(|s| s.name.clone()),
        total_stages: Some(stages.len() as u32),
        completed_stages: Some(
            stages
                .iter()
                .filter(|s| s.status == StageStatus::Completed)
                .count() as u32,
        ),
        stages,
        web_url: Some("https://gitlab.example/group/proj/-/pipelines/77".to_string()),
    }
}

pub fn terminal_snapshot(status: PipelineStatus, stages: Vec<StageSnapshot>) -> PipelineSnapshot {
    PipelineSnapshot {
        status,
        percent: Some(100.0),
        running_stage: None,
        total_stages: Some(stages.len() as u32),
        completed_stages: Some(stages.len() as u32),
        stages,
        web_url: None,
    }
}

/// State after applying each snapshot in order, as the event loop would.
pub fn state_after(snapshots: &[PipelineSnapshot]) -> AppState {
    let mut state = AppState::new(321, 77);
    for snapshot in snapshots {
        state.apply_snapshot(snapshot, 4_000);
    }
    state
}

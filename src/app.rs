use crate::machine::Outcome;
use crate::reconcile::{self, StageView};

// UI constants
pub const SPINNER_FRAME_COUNT: usize = 10;
pub const NARROW_WIDTH_THRESHOLD: u16 = 60;
pub const ERROR_TTL_SECS: u64 = 10;

/// Label rendered for a stage the backend reports without a name.
pub const UNKNOWN_STAGE_LABEL: &str = "unknown";

/// Overall pipeline status as reported by the status endpoint.
///
/// `#[serde(other)]` folds any vocabulary word we do not know (e.g. a future
/// `scheduled`) into `Pending`, so an unknown status degrades to "keep
/// polling" instead of a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Running,
    Success,
    Failed,
    Canceled,
    Skipped,
    Manual,
    #[serde(other)]
    Pending,
}

/// Per-stage status. Unknown strings normalize to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Canceled,
    #[serde(other)]
    Pending,
}

impl PipelineStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Skipped => "skipped",
            Self::Manual => "manual",
        }
    }
}

impl StageStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
        }
    }
}

/// One stage as reported in a status response. Identity is positional: the
/// index in [`PipelineSnapshot::stages`] is the stage's identity, not its
/// name. Percent is kept raw here and clamped at reconcile time.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSnapshot {
    pub name: Option<String>,
    pub status: StageStatus,
    pub percent: Option<f64>,
}

impl Default for StageSnapshot {
    fn default() -> Self {
        Self {
            name: None,
            status: StageStatus::Pending,
            percent: None,
        }
    }
}

/// One successful status query. Produced fresh per poll cycle, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSnapshot {
    pub status: PipelineStatus,
    /// Source-reported percent, un-clamped. Never trusted for direct UI use.
    pub percent: Option<f64>,
    pub running_stage: Option<String>,
    pub total_stages: Option<u32>,
    pub completed_stages: Option<u32>,
    pub stages: Vec<StageSnapshot>,
    pub web_url: Option<String>,
}

impl Default for PipelineSnapshot {
    fn default() -> Self {
        Self {
            status: PipelineStatus::Pending,
            percent: None,
            running_stage: None,
            total_stages: None,
            completed_stages: None,
            stages: Vec::new(),
            web_url: None,
        }
    }
}

impl PipelineSnapshot {
    /// Clamped overall percent for display. Falls back to the stage counters
    /// when the backend omits `percent` (its percent mapping is coarse; the
    /// counters are the finer signal).
    pub fn overall_percent(&self) -> u8 {
        if let Some(p) = self.percent {
            return reconcile::clamp_percent(p);
        }
        match (self.completed_stages, self.total_stages) {
            (Some(done), Some(total)) if total > 0 => {
                reconcile::clamp_percent(f64::from(done) * 100.0 / f64::from(total))
            }
            _ => 0,
        }
    }
}

/// Immutable configuration set at startup.
pub struct AppConfig {
    pub project_id: u64,
    pub pipeline_id: u64,
}

/// View-side state owned by the main event loop. The stage-view cache is the
/// single mutable rendered representation; it belongs to the currently active
/// polling session and is reset whenever a new session starts.
pub struct AppState {
    pub config: AppConfig,

    // Pipeline view
    pub status: PipelineStatus,
    pub percent: u8,
    pub running_stage: Option<String>,
    pub completed_stages: Option<u32>,
    pub total_stages: Option<u32>,
    pub stage_views: Vec<StageView>,
    pub pipeline_url: Option<String>,

    // Terminal outcome
    pub outcome: Option<Outcome>,
    pub closing_summary: Option<String>,
    pub unavailable: Option<String>,

    // Polling
    pub last_poll: Option<std::time::Instant>,
    pub poll_delay_ms: u64,
    pub next_poll_in: u64,

    // Transient UI
    pub is_loading: bool,
    pub spinner_frame: usize,
    pub error: Option<(String, std::time::Instant)>,
    pub should_quit: bool,
    pub desktop_notify: bool,
}

impl AppState {
    pub fn new(project_id: u64, pipeline_id: u64) -> Self {
        Self {
            config: AppConfig {
                project_id,
                pipeline_id,
            },
            status: PipelineStatus::Pending,
            percent: 0,
            running_stage: None,
            completed_stages: None,
            total_stages: None,
            stage_views: Vec::new(),
            pipeline_url: None,
            outcome: None,
            closing_summary: None,
            unavailable: None,
            last_poll: None,
            poll_delay_ms: 0,
            next_poll_in: 0,
            is_loading: true,
            spinner_frame: 0,
            error: None,
            should_quit: false,
            desktop_notify: true,
        }
    }

    /// Apply one snapshot to the view: overall status wholesale, then the
    /// positional stage diff.
    pub fn apply_snapshot(&mut self, snapshot: &PipelineSnapshot, next_delay_ms: u64) {
        self.status = snapshot.status;
        self.percent = snapshot.overall_percent();
        self.running_stage.clone_from(&snapshot.running_stage);
        self.completed_stages = snapshot.completed_stages;
        self.total_stages = snapshot.total_stages;
        if snapshot.web_url.is_some() {
            self.pipeline_url.clone_from(&snapshot.web_url);
        }

        let ops = reconcile::reconcile(&self.stage_views, &snapshot.stages);
        reconcile::apply(&mut self.stage_views, &ops);

        self.is_loading = false;
        self.clear_error();
        self.last_poll = Some(std::time::Instant::now());
        self.poll_delay_ms = next_delay_ms;
        self.next_poll_in = next_delay_ms.div_ceil(1000);
    }

    /// Record the terminal outcome; no further snapshots will arrive.
    pub fn finish(&mut self, outcome: Outcome, summary: Option<String>) {
        self.outcome = Some(outcome);
        self.closing_summary = summary;
        self.is_loading = false;
        self.next_poll_in = 0;
    }

    /// The error budget is exhausted: degrade to a displayed message.
    pub fn set_unavailable(&mut self, message: String) {
        self.unavailable = Some(message);
        self.is_loading = false;
        self.next_poll_in = 0;
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some() || self.unavailable.is_some()
    }

    /// Reset the view for a fresh session so stale positional identities
    /// never leak into a new pipeline.
    pub fn reset_for_new_session(&mut self, project_id: u64, pipeline_id: u64) {
        self.config.project_id = project_id;
        self.config.pipeline_id = pipeline_id;
        self.status = PipelineStatus::Pending;
        self.percent = 0;
        self.running_stage = None;
        self.completed_stages = None;
        self.total_stages = None;
        self.stage_views.clear();
        self.pipeline_url = None;
        self.outcome = None;
        self.closing_summary = None;
        self.unavailable = None;
        self.last_poll = None;
        self.poll_delay_ms = 0;
        self.next_poll_in = 0;
        self.is_loading = true;
    }

    pub fn advance_spinner(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAME_COUNT;
    }

    pub fn set_error(&mut self, msg: String) {
        self.error = Some((msg, std::time::Instant::now()));
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn prune_error(&mut self) {
        if let Some((_, ts)) = &self.error {
            if ts.elapsed().as_secs() >= ERROR_TTL_SECS {
                self.error = None;
            }
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|(msg, _)| msg.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::Outcome;

    fn stage(name: &str, status: StageStatus, percent: f64) -> StageSnapshot {
        StageSnapshot {
            name: Some(name.to_string()),
            status,
            percent: Some(percent),
        }
    }

    fn snapshot(status: PipelineStatus, percent: Option<f64>) -> PipelineSnapshot {
        PipelineSnapshot {
            status,
            percent,
            running_stage: None,
            total_stages: None,
            completed_stages: None,
            stages: Vec::new(),
            web_url: None,
        }
    }

    #[test]
    fn default_snapshot_is_pending_and_empty() {
        let snap = PipelineSnapshot::default();
        assert_eq!(snap.status, PipelineStatus::Pending);
        assert!(snap.stages.is_empty());
        assert_eq!(snap.overall_percent(), 0);
    }

    #[test]
    fn overall_percent_clamps_reported_value() {
        assert_eq!(snapshot(PipelineStatus::Running, Some(150.0)).overall_percent(), 100);
        assert_eq!(snapshot(PipelineStatus::Running, Some(-5.0)).overall_percent(), 0);
        assert_eq!(snapshot(PipelineStatus::Running, Some(42.0)).overall_percent(), 42);
    }

    #[test]
    fn overall_percent_derived_from_stage_counts() {
        let mut s = snapshot(PipelineStatus::Running, None);
        s.completed_stages = Some(3);
        s.total_stages = Some(4);
        assert_eq!(s.overall_percent(), 75);
    }

    #[test]
    fn overall_percent_defaults_to_zero() {
        assert_eq!(snapshot(PipelineStatus::Pending, None).overall_percent(), 0);
    }

    #[test]
    fn overall_percent_zero_total_does_not_divide() {
        let mut s = snapshot(PipelineStatus::Running, None);
        s.completed_stages = Some(0);
        s.total_stages = Some(0);
        assert_eq!(s.overall_percent(), 0);
    }

    #[test]
    fn apply_snapshot_replaces_status_wholesale() {
        let mut state = AppState::new(1, 2);
        state.apply_snapshot(&snapshot(PipelineStatus::Running, Some(10.0)), 4000);
        assert_eq!(state.status, PipelineStatus::Running);
        // A regressing status from the backend is accepted as-is.
        state.apply_snapshot(&snapshot(PipelineStatus::Pending, Some(5.0)), 4000);
        assert_eq!(state.status, PipelineStatus::Pending);
        assert_eq!(state.percent, 5);
    }

    #[test]
    fn apply_snapshot_builds_stage_views() {
        let mut state = AppState::new(1, 2);
        let mut s = snapshot(PipelineStatus::Running, Some(40.0));
        s.stages = vec![
            stage("terraform", StageStatus::Completed, 100.0),
            stage("cluster_setup", StageStatus::Running, 40.0),
        ];
        state.apply_snapshot(&s, 4000);
        assert_eq!(state.stage_views.len(), 2);
        assert_eq!(state.stage_views[0].name, "terraform");
        assert_eq!(state.stage_views[1].status, StageStatus::Running);
    }

    #[test]
    fn apply_snapshot_clears_error_and_loading() {
        let mut state = AppState::new(1, 2);
        state.set_error("transient".to_string());
        state.apply_snapshot(&snapshot(PipelineStatus::Running, None), 5000);
        assert!(state.error_message().is_none());
        assert!(!state.is_loading);
        assert_eq!(state.next_poll_in, 5);
    }

    #[test]
    fn web_url_sticks_once_seen() {
        let mut state = AppState::new(1, 2);
        let mut s = snapshot(PipelineStatus::Running, None);
        s.web_url = Some("https://gitlab.example/p/-/pipelines/9".to_string());
        state.apply_snapshot(&s, 4000);
        // Later snapshot without the URL must not erase it.
        state.apply_snapshot(&snapshot(PipelineStatus::Running, None), 4000);
        assert!(state.pipeline_url.is_some());
    }

    #[test]
    fn finish_records_outcome() {
        let mut state = AppState::new(1, 2);
        state.finish(Outcome::Succeeded, Some("deploy".to_string()));
        assert!(state.is_finished());
        assert_eq!(state.closing_summary.as_deref(), Some("deploy"));
        assert_eq!(state.next_poll_in, 0);
    }

    #[test]
    fn unavailable_is_terminal_for_the_view() {
        let mut state = AppState::new(1, 2);
        state.set_unavailable("status unavailable".to_string());
        assert!(state.is_finished());
    }

    #[test]
    fn reset_clears_stage_cache() {
        let mut state = AppState::new(1, 2);
        let mut s = snapshot(PipelineStatus::Running, None);
        s.stages = vec![stage("build", StageStatus::Running, 10.0)];
        state.apply_snapshot(&s, 4000);
        state.finish(Outcome::Failed, None);

        state.reset_for_new_session(3, 4);
        assert!(state.stage_views.is_empty());
        assert!(state.outcome.is_none());
        assert_eq!(state.config.project_id, 3);
        assert_eq!(state.status, PipelineStatus::Pending);
        assert!(state.is_loading);
    }

    #[test]
    fn error_lifecycle() {
        let mut state = AppState::new(1, 2);
        assert!(state.error_message().is_none());
        state.set_error("something broke".to_string());
        assert_eq!(state.error_message(), Some("something broke"));
        state.clear_error();
        assert!(state.error_message().is_none());
    }

    #[test]
    fn spinner_wraps() {
        let mut state = AppState::new(1, 2);
        for _ in 0..SPINNER_FRAME_COUNT {
            state.advance_spinner();
        }
        assert_eq!(state.spinner_frame, 0);
    }
}

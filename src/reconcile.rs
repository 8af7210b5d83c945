use crate::app::{StageSnapshot, StageStatus, UNKNOWN_STAGE_LABEL};

/// The materialized on-screen representation of one stage, keyed by position.
/// Caches the last-applied status and percent so unchanged stages produce no
/// ops (and keep whatever entry treatment they were rendered with).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageView {
    pub position: usize,
    pub name: String,
    pub status: StageStatus,
    pub percent: u8,
}

/// One rendering operation produced by [`reconcile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOp {
    /// No prior view exists at this position.
    Create(StageView),
    /// A view exists and its status or percent changed. Only those two
    /// fields are applied; the name keeps its positional identity.
    Update(StageView),
}

/// Clamp a raw source percent for display: [0, 100], non-finite values
/// default to 0. The raw value is never trusted for direct UI use.
pub fn clamp_percent(raw: f64) -> u8 {
    if raw.is_finite() {
        raw.clamp(0.0, 100.0).round() as u8
    } else {
        0
    }
}

/// Positional diff of the incoming stage list against the previously rendered
/// views. Identity is the position, not the name: if the backend removes,
/// inserts, or reorders stages mid-pipeline, updates will be misattributed —
/// that input is unsupported and no detection is attempted.
pub fn reconcile(previous: &[StageView], incoming: &[StageSnapshot]) -> Vec<StageOp> {
    incoming
        .iter()
        .enumerate()
        .filter_map(|(position, snap)| {
            let view = StageView {
                position,
                name: snap
                    .name
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_STAGE_LABEL.to_string()),
                status: snap.status,
                percent: clamp_percent(snap.percent.unwrap_or(0.0)),
            };
            match previous.get(position) {
                None => Some(StageOp::Create(view)),
                Some(prev) if prev.status != view.status || prev.percent != view.percent => {
                    Some(StageOp::Update(view))
                }
                Some(_) => None,
            }
        })
        .collect()
}

/// Apply ops to the view cache. Creates append in position order; updates
/// touch only the cached status and percent.
pub fn apply(views: &mut Vec<StageView>, ops: &[StageOp]) {
    for op in ops {
        match op {
            StageOp::Create(view) => {
                debug_assert_eq!(view.position, views.len());
                views.push(view.clone());
            }
            StageOp::Update(view) => {
                if let Some(existing) = views.get_mut(view.position) {
                    existing.status = view.status;
                    existing.percent = view.percent;
                }
            }
        }
    }
}

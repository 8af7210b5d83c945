//! Wire schema for the operator backend and its one-shot normalization.
//!
//! The backend's response shapes are duck-typed; everything is validated and
//! normalized here, once, so nothing downstream has to trust the wire:
//! unknown status strings fold to `pending`, a non-array `stages` field
//! becomes an empty list, and malformed stage entries become pending
//! placeholders. An application-level failure (`success: false`) is the one
//! thing that is *not* normalized — it surfaces as a query failure.

use crate::app::{PipelineSnapshot, PipelineStatus, StageSnapshot, StageStatus};
use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
struct StatusResponse {
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default = "pending_status")]
    status: PipelineStatus,
    #[serde(default)]
    percent: Option<f64>,
    #[serde(default)]
    running_stage: Option<String>,
    #[serde(default)]
    total_stages: Option<u32>,
    #[serde(default)]
    completed_stages: Option<u32>,
    #[serde(default, deserialize_with = "lenient_stages")]
    stages: Vec<StageSnapshot>,
    #[serde(default)]
    web_url: Option<String>,
}

fn pending_status() -> PipelineStatus {
    PipelineStatus::Pending
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct WireStage {
    name: Option<String>,
    status: Option<StageStatus>,
    percent: Option<f64>,
}

/// Accepts any JSON value where `stages` should be: a non-array normalizes
/// to an empty list and a malformed element to a pending placeholder, rather
/// than failing the whole query.
fn lenient_stages<'de, D>(deserializer: D) -> Result<Vec<StageSnapshot>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let Some(items) = value.as_array() else {
        return Ok(Vec::new());
    };
    Ok(items
        .iter()
        .map(|item| {
            let wire: WireStage = serde_json::from_value(item.clone()).unwrap_or_default();
            StageSnapshot {
                name: wire.name,
                status: wire.status.unwrap_or(StageStatus::Pending),
                percent: wire.percent,
            }
        })
        .collect())
}

pub fn parse_status(json: &str) -> Result<PipelineSnapshot> {
    let resp: StatusResponse = serde_json::from_str(json)?;
    if !resp.success {
        return Err(eyre!(resp
            .error
            .unwrap_or_else(|| "status endpoint reported failure".to_string())));
    }
    Ok(PipelineSnapshot {
        status: resp.status,
        percent: resp.percent,
        running_stage: resp.running_stage,
        total_stages: resp.total_stages,
        completed_stages: resp.completed_stages,
        stages: resp.stages,
        web_url: resp.web_url,
    })
}

/// Body of the provisioning submit POST.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProvisionRequest {
    pub choice: String,
    pub title: String,
    pub desc: String,
    pub subnet: String,
    pub flavor: String,
    pub cloud_project_id: String,
}

/// What a successful submit hands back: the pair that identifies the
/// pipeline to poll, plus browse URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReceipt {
    pub project_id: u64,
    pub pipeline_id: u64,
    pub project_url: Option<String>,
    pub pipeline_url: Option<String>,
}

#[derive(Deserialize)]
struct SubmitResponse {
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    project_id: Option<u64>,
    #[serde(default)]
    pipeline_id: Option<u64>,
    #[serde(default)]
    project_url: Option<String>,
    #[serde(default)]
    pipeline_url: Option<String>,
}

pub fn parse_submit(json: &str) -> Result<ProvisionReceipt> {
    let resp: SubmitResponse = serde_json::from_str(json)?;
    if !resp.success {
        return Err(eyre!(resp
            .error
            .unwrap_or_else(|| "provisioning request rejected".to_string())));
    }
    let (Some(project_id), Some(pipeline_id)) = (resp.project_id, resp.pipeline_id) else {
        return Err(eyre!("submit response missing project_id/pipeline_id"));
    };
    Ok(ProvisionReceipt {
        project_id,
        pipeline_id,
        project_url: resp.project_url,
        pipeline_url: resp.pipeline_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RUNNING_JSON: &str = r#"{
        "success": true,
        "status": "running",
        "percent": 42,
        "running_stage": "cluster_setup",
        "total_stages": 5,
        "completed_stages": 2,
        "stages": [
            {"name": "terraform", "status": "completed", "percent": 100},
            {"name": "cluster_setup", "status": "running", "percent": 42}
        ],
        "web_url": "https://gitlab.example/g/p/-/pipelines/77"
    }"#;

    #[test]
    fn parse_running_pipeline() {
        let snap = parse_status(RUNNING_JSON).unwrap();
        assert_eq!(snap.status, PipelineStatus::Running);
        assert_eq!(snap.percent, Some(42.0));
        assert_eq!(snap.running_stage.as_deref(), Some("cluster_setup"));
        assert_eq!(snap.total_stages, Some(5));
        assert_eq!(snap.completed_stages, Some(2));
        assert_eq!(snap.stages.len(), 2);
        assert_eq!(snap.stages[0].name.as_deref(), Some("terraform"));
        assert_eq!(snap.stages[1].status, StageStatus::Running);
        assert!(snap.web_url.is_some());
    }

    #[test]
    fn parse_all_pipeline_status_strings() {
        let cases = [
            ("pending", PipelineStatus::Pending),
            ("running", PipelineStatus::Running),
            ("success", PipelineStatus::Success),
            ("failed", PipelineStatus::Failed),
            ("canceled", PipelineStatus::Canceled),
            ("skipped", PipelineStatus::Skipped),
            ("manual", PipelineStatus::Manual),
        ];
        for (s, expected) in &cases {
            let json = format!(r#"{{"success": true, "status": "{s}", "stages": []}}"#);
            let snap = parse_status(&json).unwrap();
            assert_eq!(snap.status, *expected, "status string: {s}");
        }
    }

    #[test]
    fn unknown_pipeline_status_normalizes_to_pending() {
        let json = r#"{"success": true, "status": "scheduled", "stages": []}"#;
        assert_eq!(parse_status(json).unwrap().status, PipelineStatus::Pending);
    }

    #[test]
    fn missing_status_defaults_to_pending() {
        let json = r#"{"success": true}"#;
        let snap = parse_status(json).unwrap();
        assert_eq!(snap.status, PipelineStatus::Pending);
        assert!(snap.stages.is_empty());
    }

    #[test]
    fn unknown_stage_status_normalizes_to_pending() {
        let json = r#"{"success": true, "status": "running",
            "stages": [{"name": "x", "status": "brand_new_thing", "percent": 1}]}"#;
        let snap = parse_status(json).unwrap();
        assert_eq!(snap.stages[0].status, StageStatus::Pending);
    }

    #[test]
    fn all_stage_status_strings() {
        let cases = [
            ("pending", StageStatus::Pending),
            ("queued", StageStatus::Queued),
            ("running", StageStatus::Running),
            ("completed", StageStatus::Completed),
            ("failed", StageStatus::Failed),
            ("canceled", StageStatus::Canceled),
        ];
        for (s, expected) in &cases {
            let json =
                format!(r#"{{"success": true, "stages": [{{"name": "a", "status": "{s}"}}]}}"#);
            let snap = parse_status(&json).unwrap();
            assert_eq!(snap.stages[0].status, *expected, "stage status: {s}");
        }
    }

    #[test]
    fn non_array_stages_normalizes_to_empty() {
        let json = r#"{"success": true, "status": "running", "stages": "oops"}"#;
        assert!(parse_status(json).unwrap().stages.is_empty());
        let json = r#"{"success": true, "status": "running", "stages": {"a": 1}}"#;
        assert!(parse_status(json).unwrap().stages.is_empty());
    }

    #[test]
    fn malformed_stage_entry_becomes_pending_placeholder() {
        let json = r#"{"success": true, "stages": ["not an object", {"name": "ok"}]}"#;
        let snap = parse_status(json).unwrap();
        assert_eq!(snap.stages.len(), 2);
        assert_eq!(snap.stages[0].status, StageStatus::Pending);
        assert!(snap.stages[0].name.is_none());
        assert_eq!(snap.stages[1].name.as_deref(), Some("ok"));
    }

    #[test]
    fn missing_percent_is_none_not_failure() {
        let json = r#"{"success": true, "status": "running",
            "stages": [{"name": "a", "status": "running"}]}"#;
        let snap = parse_status(json).unwrap();
        assert_eq!(snap.percent, None);
        assert_eq!(snap.stages[0].percent, None);
    }

    #[test]
    fn out_of_range_percent_survives_the_boundary_raw() {
        // Clamping belongs to the reconciler, not the parser.
        let json = r#"{"success": true, "status": "running", "percent": 250,
            "stages": [{"name": "a", "status": "running", "percent": -5}]}"#;
        let snap = parse_status(json).unwrap();
        assert_eq!(snap.percent, Some(250.0));
        assert_eq!(snap.stages[0].percent, Some(-5.0));
    }

    #[test]
    fn application_failure_is_a_query_failure() {
        let json = r#"{"success": false, "error": "pipeline not found"}"#;
        let err = parse_status(json).unwrap_err();
        assert!(err.to_string().contains("pipeline not found"));
    }

    #[test]
    fn application_failure_without_message() {
        let json = r#"{"success": false}"#;
        let err = parse_status(json).unwrap_err();
        assert!(err.to_string().contains("failure"));
    }

    #[test]
    fn invalid_json_is_a_query_failure() {
        assert!(parse_status("not json").is_err());
    }

    #[test]
    fn parse_submit_happy_path() {
        let json = r#"{
            "success": true,
            "project_id": 321,
            "pipeline_id": 77,
            "project_url": "https://gitlab.example/g/p",
            "pipeline_url": "https://gitlab.example/g/p/-/pipelines/77"
        }"#;
        let receipt = parse_submit(json).unwrap();
        assert_eq!(receipt.project_id, 321);
        assert_eq!(receipt.pipeline_id, 77);
        assert!(receipt.pipeline_url.is_some());
    }

    #[test]
    fn parse_submit_rejected() {
        let json = r#"{"success": false, "error": "subnet already in use"}"#;
        let err = parse_submit(json).unwrap_err();
        assert!(err.to_string().contains("subnet already in use"));
    }

    #[test]
    fn parse_submit_missing_ids_is_an_error() {
        let json = r#"{"success": true, "project_url": "https://gitlab.example/g/p"}"#;
        assert!(parse_submit(json).is_err());
    }
}

use std::fmt;

use chrono::{DateTime, Utc};
use ctb_core::ApiError;
use serde::{Deserialize, Serialize};

use crate::error::UploadError;
use crate::spec::RunId;

/// Workflow step a run is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UploadStep {
    #[default]
    Idle,
    EnsureEntity,
    PrepareUpload,
    DownloadSourcePayload,
    TransferPayload,
    NotifyFinished,
    SubmitToCollection,
    Done,
}

impl UploadStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStep::Idle => "idle",
            UploadStep::EnsureEntity => "ensure_entity",
            UploadStep::PrepareUpload => "prepare_upload",
            UploadStep::DownloadSourcePayload => "download_source_payload",
            UploadStep::TransferPayload => "transfer_payload",
            UploadStep::NotifyFinished => "notify_finished",
            UploadStep::SubmitToCollection => "submit_to_collection",
            UploadStep::Done => "done",
        }
    }
}

impl fmt::Display for UploadStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a finished run ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Termination {
    Succeeded,
    /// The user asked for it.
    Cancelled,
    Failed(UploadError),
}

/// State of the latest run of an `UploadSession`.
///
/// Reset when a run starts; only the session writes it, callers get copies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub run_id: Option<RunId>,
    pub step: UploadStep,
    pub done: bool,
    pub cancelled: bool,
    /// Primary failure. Always `None` for cancelled runs.
    pub error: Option<UploadError>,
    /// Upload ratio in [0, 1] while the payload transfer runs, else 0.
    pub progress: f32,
    /// Best-effort calls that failed without deciding the outcome, such as
    /// the abort notification of a cancelled run.
    pub secondary_errors: Vec<UploadError>,
    pub creation_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl UploadOutcome {
    /// `None` while the run is still going.
    pub fn termination(&self) -> Option<Termination> {
        if !self.done {
            return None;
        }
        Some(if self.cancelled {
            Termination::Cancelled
        } else if let Some(error) = &self.error {
            Termination::Failed(error.clone())
        } else {
            Termination::Succeeded
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self.termination(), Some(Termination::Succeeded))
    }

    /// How the run ended as backend-style error items; empty on success and
    /// while the run is still going.
    pub fn api_errors(&self) -> Vec<ApiError> {
        match self.termination() {
            Some(Termination::Cancelled) => vec![ApiError::upload_cancelled()],
            Some(Termination::Failed(error)) => error.to_api_errors(),
            Some(Termination::Succeeded) | None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn termination_prefers_cancellation() {
        let mut outcome = UploadOutcome::default();
        assert_eq!(outcome.termination(), None);

        outcome.done = true;
        assert!(outcome.is_success());

        outcome.error = Some(UploadError::transport("reset"));
        assert_eq!(
            outcome.termination(),
            Some(Termination::Failed(UploadError::transport("reset")))
        );

        outcome.cancelled = true;
        assert_eq!(outcome.termination(), Some(Termination::Cancelled));
        assert_eq!(outcome.api_errors()[0].status, ctb_core::UPLOAD_CANCELLED_STATUS);
    }

    #[test]
    fn outcome_serializes_for_reporting() {
        let outcome = UploadOutcome {
            step: UploadStep::Done,
            done: true,
            error: Some(UploadError::internal("Response code '403' and body ''")),
            creation_id: Some("c1".to_string()),
            ..UploadOutcome::default()
        };

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["step"], "Done");
        assert_eq!(json["creation_id"], "c1");
        assert_eq!(
            json["error"]["Internal"]["message"],
            "Response code '403' and body ''"
        );

        let back: UploadOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(back, outcome);
    }
}

//! Wire types exchanged with the lesson service.

use serde::{Deserialize, Serialize};

/// Status value the service reports when an analysis session has begun.
pub const ANALYSIS_STARTED: &str = "started";

/// Body of `POST /generate_lesson`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonRequest {
    /// Identifier of the user the lesson is generated for.
    pub user_id: String,
    /// Free-text description of the speech issue.
    pub speech_issue: String,
}

impl LessonRequest {
    /// Creates a new lesson request.
    #[must_use]
    pub fn new(user_id: impl Into<String>, speech_issue: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            speech_issue: speech_issue.into(),
        }
    }
}

/// Successful response of `POST /generate_lesson`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedLesson {
    /// The generated lesson plan text.
    pub lesson: String,

    /// Server-side path of the rendered PDF, when the service produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
}

/// Response of `POST /start-analysis`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStatus {
    /// Status reported by the service; `"started"` signals success.
    pub status: String,
}

impl AnalysisStatus {
    /// Creates a status with the given value.
    #[must_use]
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }

    /// Returns `true` if the service reports the analysis as started.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.status == ANALYSIS_STARTED
    }
}

/// Error body the service returns alongside non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub(crate) error: String,
}

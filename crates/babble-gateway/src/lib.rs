//! Babble Request Gateway
//!
//! Thin transport to the remote lesson service. The [`RequestGateway`] trait
//! is the seam the session layer depends on; [`HttpGateway`] is the
//! production implementation.

pub mod error;
pub mod http;
pub mod types;

use async_trait::async_trait;

pub use error::{RequestError, RequestErrorKind, Result};
pub use http::HttpGateway;
pub use types::{AnalysisStatus, GeneratedLesson, LessonRequest, ANALYSIS_STARTED};

/// The two remote operations a session can issue.
///
/// Both are non-idempotent from the caller's point of view: implementations
/// issue exactly one outbound call per invocation and never retry.
#[async_trait]
pub trait RequestGateway: Send + Sync {
    /// Requests a generated lesson for `issue_description`.
    ///
    /// Callers must not pass an empty description.
    async fn generate_lesson(
        &self,
        user_id: &str,
        issue_description: &str,
    ) -> Result<GeneratedLesson>;

    /// Asks the service to begin a speech-analysis session.
    async fn start_analysis(&self) -> Result<AnalysisStatus>;
}

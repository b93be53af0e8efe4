//! Session state and its transition function.
//!
//! A session runs two independent state machines:
//!
//! - lesson generation: `Idle` -> `Generating` -> `Ready` (or back to `Idle` on failure)
//! - analysis start: `Idle` -> `Running` -> `Idle`
//!
//! Neither has a terminal state. [`SessionState`] can only be changed through
//! [`transition`], a pure function of the current state and one
//! [`SessionEvent`].

use babble_gateway::AnalysisStatus;
use serde::{Deserialize, Serialize};

use crate::error::ErrorInfo;
use crate::guard::OperationKind;

// ============================================================================
// RequestId
// ============================================================================

/// Sequence number identifying one issued remote call.
///
/// Issued in strictly increasing order by the owning session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(u64);

impl RequestId {
    /// Wraps a raw sequence number.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw sequence number.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// Phases
// ============================================================================

/// Phase of the lesson-generation machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonPhase {
    /// No lesson and nothing in flight.
    Idle,
    /// A generation request is outstanding.
    Generating,
    /// A lesson is available.
    Ready,
}

/// Phase of the analysis machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisPhase {
    /// Nothing in flight.
    Idle,
    /// An analysis-start request is outstanding.
    Running,
}

// ============================================================================
// Notice
// ============================================================================

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// Something went as expected.
    Info,
    /// Something the user should act on; not recorded as an error.
    Warning,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Severity of the notice.
    pub level: NoticeLevel,
    /// Text shown to the user.
    pub message: String,
}

impl Notice {
    /// Creates an informational notice.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    /// Creates a warning notice.
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

/// Shown when the service confirms the analysis has begun.
pub const ANALYSIS_STARTED_NOTICE: &str = "AI Speech Analysis has started!";

/// Shown when the service answers but does not start the analysis.
pub const ANALYSIS_NOT_STARTED_NOTICE: &str = "Failed to start the analysis.";

// ============================================================================
// SessionEvent
// ============================================================================

/// Inputs to [`transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A lesson request passed validation and claimed its guard.
    LessonRequested {
        /// The request being issued.
        request: RequestId,
    },
    /// The gateway returned a lesson.
    LessonGenerated {
        /// The request this completes.
        request: RequestId,
        /// The lesson text.
        lesson: String,
    },
    /// The gateway call for a lesson failed.
    LessonFailed {
        /// The request this completes.
        request: RequestId,
        /// What went wrong.
        error: ErrorInfo,
    },
    /// An analysis start claimed its guard.
    AnalysisRequested {
        /// The request being issued.
        request: RequestId,
    },
    /// The gateway answered the analysis start.
    AnalysisAnswered {
        /// The request this completes.
        request: RequestId,
        /// Status reported by the service.
        status: AnalysisStatus,
    },
    /// The gateway call for an analysis start failed.
    AnalysisFailed {
        /// The request this completes.
        request: RequestId,
        /// What went wrong.
        error: ErrorInfo,
    },
}

impl SessionEvent {
    /// The operation kind this event belongs to.
    #[must_use]
    pub const fn operation(&self) -> OperationKind {
        match self {
            Self::LessonRequested { .. }
            | Self::LessonGenerated { .. }
            | Self::LessonFailed { .. } => OperationKind::Lesson,
            Self::AnalysisRequested { .. }
            | Self::AnalysisAnswered { .. }
            | Self::AnalysisFailed { .. } => OperationKind::Analysis,
        }
    }

    /// The request this event refers to.
    #[must_use]
    pub const fn request(&self) -> RequestId {
        match self {
            Self::LessonRequested { request }
            | Self::LessonGenerated { request, .. }
            | Self::LessonFailed { request, .. }
            | Self::AnalysisRequested { request }
            | Self::AnalysisAnswered { request, .. }
            | Self::AnalysisFailed { request, .. } => *request,
        }
    }
}

// ============================================================================
// SessionState
// ============================================================================

/// Everything the view renders from.
///
/// Created empty when a session starts and discarded with it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    lesson_text: Option<String>,
    last_error: Option<ErrorInfo>,
    lesson_in_flight: bool,
    analysis_in_flight: bool,
    lesson_request: Option<RequestId>,
    analysis_request: Option<RequestId>,
}

impl SessionState {
    /// Creates an empty state with both machines idle.
    ///
    /// # Examples
    ///
    /// ```
    /// use babble_session::{LessonPhase, SessionState};
    ///
    /// let state = SessionState::new();
    /// assert_eq!(state.lesson_phase(), LessonPhase::Idle);
    /// assert!(state.lesson_text().is_none());
    /// assert!(state.last_error().is_none());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current lesson, present only after a successful generation.
    #[must_use]
    pub fn lesson_text(&self) -> Option<&str> {
        self.lesson_text.as_deref()
    }

    /// The most recent failure, if it has not been cleared by a new operation.
    #[must_use]
    pub const fn last_error(&self) -> Option<&ErrorInfo> {
        self.last_error.as_ref()
    }

    /// Whether a lesson request is outstanding.
    #[must_use]
    pub const fn lesson_in_flight(&self) -> bool {
        self.lesson_in_flight
    }

    /// Whether an analysis start is outstanding.
    #[must_use]
    pub const fn analysis_in_flight(&self) -> bool {
        self.analysis_in_flight
    }

    /// The most recently issued request of `kind`.
    #[must_use]
    pub const fn latest_request(&self, kind: OperationKind) -> Option<RequestId> {
        match kind {
            OperationKind::Lesson => self.lesson_request,
            OperationKind::Analysis => self.analysis_request,
        }
    }

    /// Whether an operation of `kind` is outstanding.
    #[must_use]
    pub const fn in_flight(&self, kind: OperationKind) -> bool {
        match kind {
            OperationKind::Lesson => self.lesson_in_flight,
            OperationKind::Analysis => self.analysis_in_flight,
        }
    }

    /// Current phase of the lesson machine.
    #[must_use]
    pub const fn lesson_phase(&self) -> LessonPhase {
        if self.lesson_in_flight {
            LessonPhase::Generating
        } else if self.lesson_text.is_some() {
            LessonPhase::Ready
        } else {
            LessonPhase::Idle
        }
    }

    /// Current phase of the analysis machine.
    #[must_use]
    pub const fn analysis_phase(&self) -> AnalysisPhase {
        if self.analysis_in_flight {
            AnalysisPhase::Running
        } else {
            AnalysisPhase::Idle
        }
    }

    /// Returns `true` if `request` completes the outstanding call of `kind`.
    fn is_current(&self, kind: OperationKind, request: RequestId) -> bool {
        self.in_flight(kind) && self.latest_request(kind) == Some(request)
    }
}

/// Applies `event` to `state`.
///
/// Returns the next state and, for analysis answers, the notice to show.
/// A completion that does not match the latest outstanding request of its
/// kind leaves the state untouched. So does a request event for a kind that
/// is already in flight.
#[must_use]
pub fn transition(state: SessionState, event: &SessionEvent) -> (SessionState, Option<Notice>) {
    let kind = event.operation();
    let request = event.request();

    match event {
        SessionEvent::LessonRequested { .. } | SessionEvent::AnalysisRequested { .. } => {
            if state.in_flight(kind) {
                return (state, None);
            }
        }
        _ => {
            if !state.is_current(kind, request) {
                return (state, None);
            }
        }
    }

    let mut next = state;
    let notice = match event {
        SessionEvent::LessonRequested { request } => {
            next.last_error = None;
            next.lesson_text = None;
            next.lesson_in_flight = true;
            next.lesson_request = Some(*request);
            None
        }
        SessionEvent::LessonGenerated { lesson, .. } => {
            next.lesson_text = Some(lesson.clone());
            next.lesson_in_flight = false;
            None
        }
        SessionEvent::LessonFailed { error, .. } => {
            next.last_error = Some(error.clone());
            next.lesson_in_flight = false;
            None
        }
        SessionEvent::AnalysisRequested { request } => {
            next.last_error = None;
            next.analysis_in_flight = true;
            next.analysis_request = Some(*request);
            None
        }
        SessionEvent::AnalysisAnswered { status, .. } => {
            next.analysis_in_flight = false;
            if status.is_started() {
                Some(Notice::info(ANALYSIS_STARTED_NOTICE))
            } else {
                Some(Notice::warning(ANALYSIS_NOT_STARTED_NOTICE))
            }
        }
        SessionEvent::AnalysisFailed { error, .. } => {
            next.last_error = Some(error.clone());
            next.analysis_in_flight = false;
            None
        }
    };

    (next, notice)
}

// ============================================================================
// Tests
// ============================================================================

//! The session orchestrator.
//!
//! A [`Session`] owns one [`SessionState`] and drives both state machines:
//! it validates user input, claims the operation guard, issues the gateway
//! call on a spawned task, and applies the result when it comes back through
//! that operation's completion channel.
//!
//! Each gateway call runs on its own task so that a panic inside the gateway
//! still settles the operation, as a failure.
//!
//! Calls have no timeout. A gateway call that never settles keeps its guard
//! claimed, and further requests of that kind are rejected as busy, for the
//! rest of the session.

use std::collections::VecDeque;
use std::sync::Arc;

use babble_gateway::{AnalysisStatus, GeneratedLesson, RequestError, RequestGateway};
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tracing::{debug, info, warn};

use crate::error::{ErrorInfo, ValidationError};
use crate::guard::{OperationGuard, OperationKind, OperationPermit};
use crate::identity::{resolve_user_id, AuthClient};
use crate::state::{transition, Notice, RequestId, SessionEvent, SessionState};
use crate::view::SessionView;

/// What happened to a user-triggered operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The call was issued under this request id.
    Started(RequestId),
    /// An operation of the same kind is already in flight; nothing was done.
    Busy,
}

/// Result of one gateway call, waiting to be applied to the session.
///
/// Holds the operation's permit so the guard stays claimed until the result
/// has been applied.
#[derive(Debug)]
pub struct Completion {
    request: RequestId,
    outcome: Outcome,
    permit: OperationPermit,
}

#[derive(Debug)]
enum Outcome {
    Lesson(Result<GeneratedLesson, RequestError>),
    Analysis(Result<AnalysisStatus, RequestError>),
}

impl Completion {
    /// The request this completes.
    #[must_use]
    pub const fn request(&self) -> RequestId {
        self.request
    }

    /// The operation kind this completes.
    #[must_use]
    pub const fn operation(&self) -> OperationKind {
        self.permit.kind()
    }
}

/// One user's session: state, guards, and completion channels.
pub struct Session {
    state: SessionState,
    gateway: Arc<dyn RequestGateway>,
    user_id: String,
    lesson_guard: OperationGuard,
    analysis_guard: OperationGuard,
    last_request: u64,
    lesson_tx: mpsc::UnboundedSender<Completion>,
    lesson_rx: mpsc::UnboundedReceiver<Completion>,
    analysis_tx: mpsc::UnboundedSender<Completion>,
    analysis_rx: mpsc::UnboundedReceiver<Completion>,
    notices: VecDeque<Notice>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("user_id", &self.user_id)
            .field("last_request", &self.last_request)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Starts an empty session for the user reported by `auth`.
    pub fn new(gateway: Arc<dyn RequestGateway>, auth: &dyn AuthClient) -> Self {
        let (lesson_tx, lesson_rx) = mpsc::unbounded_channel();
        let (analysis_tx, analysis_rx) = mpsc::unbounded_channel();
        let user_id = resolve_user_id(auth);
        debug!(%user_id, "Session started");

        Self {
            state: SessionState::new(),
            gateway,
            user_id,
            lesson_guard: OperationGuard::new(OperationKind::Lesson),
            analysis_guard: OperationGuard::new(OperationKind::Analysis),
            last_request: 0,
            lesson_tx,
            lesson_rx,
            analysis_tx,
            analysis_rx,
            notices: VecDeque::new(),
        }
    }

    /// The current state.
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// The current state projected for rendering.
    #[must_use]
    pub fn view(&self) -> SessionView {
        SessionView::project(&self.state)
    }

    /// The user id sent with lesson requests.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The lesson to hand to the exporter, or `""` when there is none.
    #[must_use]
    pub fn lesson_for_export(&self) -> &str {
        self.state.lesson_text().unwrap_or_default()
    }

    /// Returns `true` while any operation is outstanding.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.lesson_guard.is_claimed() || self.analysis_guard.is_claimed()
    }

    /// Removes and returns the queued notices, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    /// Requests a lesson for `issue`.
    ///
    /// A blank issue is rejected before anything else happens and queues a
    /// warning notice. A request while a lesson is already being generated
    /// returns [`Dispatch::Busy`].
    pub fn request_lesson(&mut self, issue: &str) -> Result<Dispatch, ValidationError> {
        let issue = issue.trim();
        if issue.is_empty() {
            debug!("Rejected lesson request with an empty issue");
            self.notices
                .push_back(Notice::warning(ValidationError::EmptyIssue.to_string()));
            return Err(ValidationError::EmptyIssue);
        }

        let Some(permit) = self.lesson_guard.try_acquire() else {
            debug!("Lesson already being generated, ignoring request");
            return Ok(Dispatch::Busy);
        };

        let request = self.next_request_id();
        if !self.begin(&SessionEvent::LessonRequested { request }) {
            return Ok(Dispatch::Busy);
        }
        info!(%request, user_id = %self.user_id, "Generating lesson");

        let gateway = Arc::clone(&self.gateway);
        let tx = self.lesson_tx.clone();
        let user_id = self.user_id.clone();
        let issue = issue.to_string();
        tokio::spawn(async move {
            let call = tokio::spawn(async move { gateway.generate_lesson(&user_id, &issue).await });
            let result = call.await.unwrap_or_else(|e| Err(task_failure(&e)));
            // A closed channel means the session is gone; the permit drops with the message.
            let _ = tx.send(Completion {
                request,
                outcome: Outcome::Lesson(result),
                permit,
            });
        });

        Ok(Dispatch::Started(request))
    }

    /// Asks the service to start a speech analysis.
    ///
    /// Returns [`Dispatch::Busy`] if an analysis start is already outstanding.
    pub fn start_analysis(&mut self) -> Dispatch {
        let Some(permit) = self.analysis_guard.try_acquire() else {
            debug!("Analysis already starting, ignoring request");
            return Dispatch::Busy;
        };

        let request = self.next_request_id();
        if !self.begin(&SessionEvent::AnalysisRequested { request }) {
            return Dispatch::Busy;
        }
        info!(%request, "Starting analysis");

        let gateway = Arc::clone(&self.gateway);
        let tx = self.analysis_tx.clone();
        tokio::spawn(async move {
            let call = tokio::spawn(async move { gateway.start_analysis().await });
            let result = call.await.unwrap_or_else(|e| Err(task_failure(&e)));
            let _ = tx.send(Completion {
                request,
                outcome: Outcome::Analysis(result),
                permit,
            });
        });

        Dispatch::Started(request)
    }

    /// Waits for the next completion of either operation kind.
    ///
    /// Pends forever when nothing is in flight; use [`Session::settle_next`]
    /// to avoid that.
    pub async fn recv_completion(&mut self) -> Option<Completion> {
        tokio::select! {
            Some(completion) = self.lesson_rx.recv() => Some(completion),
            Some(completion) = self.analysis_rx.recv() => Some(completion),
            else => None,
        }
    }

    /// Applies a completion to the state and releases its guard.
    ///
    /// Returns `false` if the completion was stale and therefore discarded.
    pub fn apply_completion(&mut self, completion: Completion) -> bool {
        let Completion {
            request,
            outcome,
            permit,
        } = completion;
        let kind = permit.kind();
        let current = self.state.in_flight(kind) && self.state.latest_request(kind) == Some(request);

        let event = match outcome {
            Outcome::Lesson(Ok(lesson)) => SessionEvent::LessonGenerated {
                request,
                lesson: lesson.lesson,
            },
            Outcome::Lesson(Err(error)) => SessionEvent::LessonFailed {
                request,
                error: ErrorInfo::from_request_error(kind, &error),
            },
            Outcome::Analysis(Ok(status)) => SessionEvent::AnalysisAnswered { request, status },
            Outcome::Analysis(Err(error)) => SessionEvent::AnalysisFailed {
                request,
                error: ErrorInfo::from_request_error(kind, &error),
            },
        };

        if current {
            log_settled(&event);
            self.apply(&event);
        } else {
            debug!(%request, %kind, "Discarding stale completion");
        }

        drop(permit);
        current
    }

    /// Receives and applies the next completion.
    ///
    /// Returns `false` immediately when nothing is in flight.
    pub async fn settle_next(&mut self) -> bool {
        if !self.has_pending() {
            return false;
        }
        match self.recv_completion().await {
            Some(completion) => self.apply_completion(completion),
            None => false,
        }
    }

    /// Applies completions until nothing is in flight.
    pub async fn settle_all(&mut self) {
        while self.has_pending() {
            if let Some(completion) = self.recv_completion().await {
                self.apply_completion(completion);
            }
        }
    }

    fn next_request_id(&mut self) -> RequestId {
        self.last_request += 1;
        RequestId::new(self.last_request)
    }

    /// Applies a request event and reports whether the state accepted it.
    fn begin(&mut self, event: &SessionEvent) -> bool {
        let kind = event.operation();
        let request = event.request();
        self.apply(event);
        let accepted = self.state.latest_request(kind) == Some(request);
        if !accepted {
            warn!(%request, %kind, "State still shows an operation in flight, ignoring request");
        }
        accepted
    }

    fn apply(&mut self, event: &SessionEvent) {
        let (next, notice) = transition(std::mem::take(&mut self.state), event);
        self.state = next;
        if let Some(notice) = notice {
            self.notices.push_back(notice);
        }
    }
}

/// Error recorded when the task running a gateway call panics or is cancelled.
fn task_failure(error: &JoinError) -> RequestError {
    RequestError::network(format!("request task ended unexpectedly: {error}"))
}

fn log_settled(event: &SessionEvent) {
    let request = event.request();
    match event {
        SessionEvent::LessonGenerated { lesson, .. } => {
            info!(%request, chars = lesson.chars().count(), "Lesson generated");
        }
        SessionEvent::AnalysisAnswered { status, .. } => {
            info!(%request, status = %status.status, "Analysis start answered");
        }
        SessionEvent::LessonFailed { error, .. } | SessionEvent::AnalysisFailed { error, .. } => {
            warn!(
                %request,
                operation = %error.operation,
                kind = %error.kind,
                detail = %error.detail,
                "Operation failed"
            );
        }
        SessionEvent::LessonRequested { .. } | SessionEvent::AnalysisRequested { .. } => {}
    }
}

// ============================================================================
// Tests
// ============================================================================

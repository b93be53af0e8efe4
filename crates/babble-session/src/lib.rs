//! Babble Session Orchestration
//!
//! Drives the user-triggered, long-running operations of a Babble session:
//! lesson generation and speech-analysis start. Each operation kind is
//! serialized by its own guard, results flow back through per-kind
//! completion channels, and all state changes go through one pure
//! transition function.

pub mod config;
pub mod error;
pub mod guard;
pub mod identity;
pub mod session;
pub mod state;
pub mod view;

pub use config::Config;
pub use error::{BabbleError, ErrorInfo, Result, ValidationError};
pub use guard::{OperationGuard, OperationKind, OperationPermit};
pub use identity::{resolve_user_id, AuthClient, StaticAuthClient, PLACEHOLDER_USER_ID};
pub use session::{Completion, Dispatch, Session};
pub use state::{
    transition, AnalysisPhase, LessonPhase, Notice, NoticeLevel, RequestId, SessionEvent,
    SessionState, ANALYSIS_NOT_STARTED_NOTICE, ANALYSIS_STARTED_NOTICE,
};
pub use view::{ButtonView, SessionView};

//! Per-operation re-entrancy guard.
//!
//! An [`OperationGuard`] is a boolean claim on one operation kind. Claiming
//! it yields an [`OperationPermit`]; the claim is released when the permit is
//! dropped, so every exit path (success, failure, a panicking task, or a
//! session dropped while a call is outstanding) releases it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

/// The two long-running operations a session can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Lesson generation.
    Lesson,
    /// Speech-analysis start.
    Analysis,
}

impl OperationKind {
    /// Message shown to the user when this operation fails.
    #[must_use]
    pub const fn failure_message(&self) -> &'static str {
        match self {
            Self::Lesson => "Failed to generate lesson. Please try again.",
            Self::Analysis => "Failed to start AI Speech Analysis. Please try again.",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lesson => write!(f, "lesson"),
            Self::Analysis => write!(f, "analysis"),
        }
    }
}

/// Re-entrancy lock for a single operation kind.
///
/// Clones share the same claim.
#[derive(Debug, Clone)]
pub struct OperationGuard {
    kind: OperationKind,
    claimed: Arc<AtomicBool>,
}

impl OperationGuard {
    /// Creates an unclaimed guard for `kind`.
    #[must_use]
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            claimed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Claims the guard.
    ///
    /// Returns `None` without side effects if the guard is already claimed.
    ///
    /// # Examples
    ///
    /// ```
    /// use babble_session::{OperationGuard, OperationKind};
    ///
    /// let guard = OperationGuard::new(OperationKind::Lesson);
    /// let permit = guard.try_acquire();
    /// assert!(permit.is_some());
    /// assert!(guard.try_acquire().is_none());
    ///
    /// drop(permit);
    /// assert!(!guard.is_claimed());
    /// ```
    pub fn try_acquire(&self) -> Option<OperationPermit> {
        self.claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| {
                trace!(kind = %self.kind, "Guard claimed");
                OperationPermit {
                    kind: self.kind,
                    claimed: Arc::clone(&self.claimed),
                }
            })
    }

    /// Returns `true` while a permit for this guard is alive.
    #[must_use]
    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }

    /// The operation kind this guard protects.
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        self.kind
    }
}

/// Proof that an [`OperationGuard`] is claimed. Releases the claim on drop.
#[derive(Debug)]
pub struct OperationPermit {
    kind: OperationKind,
    claimed: Arc<AtomicBool>,
}

impl OperationPermit {
    /// The operation kind this permit was issued for.
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        self.kind
    }
}

impl Drop for OperationPermit {
    fn drop(&mut self) {
        self.claimed.store(false, Ordering::Release);
        trace!(kind = %self.kind, "Guard released");
    }
}

//! Identity capability consumed by a session.
//!
//! Account creation and login live elsewhere; a session only needs the
//! identifier of the signed-in user.

use tracing::debug;

/// Identifier used when no user is signed in.
pub const PLACEHOLDER_USER_ID: &str = "test_user";

/// Supplies the identifier of the authenticated user.
pub trait AuthClient: Send + Sync {
    /// Returns the signed-in user's identifier, if any.
    fn current_user_id(&self) -> Option<String>;
}

/// An [`AuthClient`] with a fixed answer.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthClient {
    user_id: Option<String>,
}

impl StaticAuthClient {
    /// A client reporting `user_id` as signed in.
    #[must_use]
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    /// A client reporting nobody as signed in.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { user_id: None }
    }
}

impl From<Option<String>> for StaticAuthClient {
    fn from(user_id: Option<String>) -> Self {
        Self { user_id }
    }
}

impl AuthClient for StaticAuthClient {
    fn current_user_id(&self) -> Option<String> {
        self.user_id.clone()
    }
}

/// Resolves the user id to send with requests.
///
/// Falls back to [`PLACEHOLDER_USER_ID`] when the client reports no user or a
/// blank one.
///
/// # Examples
///
/// ```
/// use babble_session::{resolve_user_id, StaticAuthClient, PLACEHOLDER_USER_ID};
///
/// assert_eq!(resolve_user_id(&StaticAuthClient::signed_in("ada")), "ada");
/// assert_eq!(resolve_user_id(&StaticAuthClient::anonymous()), PLACEHOLDER_USER_ID);
/// ```
pub fn resolve_user_id(auth: &dyn AuthClient) -> String {
    match auth.current_user_id() {
        Some(id) if !id.trim().is_empty() => id.trim().to_string(),
        _ => {
            debug!(
                user_id = PLACEHOLDER_USER_ID,
                "No signed-in user, using placeholder"
            );
            PLACEHOLDER_USER_ID.to_string()
        }
    }
}

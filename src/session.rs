//! Session-derived authorization state.
//!
//! `SessionMirror` follows an externally delivered session status and keeps a
//! local `AuthState` in step with it. It only mirrors what the access
//! middleware already decided and must not be used to gate anything.

use serde::Serialize;
use ts_rs::TS;

use crate::{auth::IdentityToken, models::SessionUser};

/// Status reported by the session source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum SessionStatus {
    Loading,
    Authenticated,
    Unauthenticated,
}

/// SessionSnapshot
///
/// One observation of the external session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub user: Option<SessionUser>,
}

impl SessionSnapshot {
    pub fn loading() -> Self {
        Self {
            status: SessionStatus::Loading,
            user: None,
        }
    }

    pub fn unauthenticated() -> Self {
        Self {
            status: SessionStatus::Unauthenticated,
            user: None,
        }
    }

    pub fn authenticated(user: SessionUser) -> Self {
        Self {
            status: SessionStatus::Authenticated,
            user: Some(user),
        }
    }

    /// Snapshot of a request whose identity has already been resolved.
    pub fn from_identity(identity: Option<&IdentityToken>) -> Self {
        match identity {
            Some(token) => Self::authenticated(token.session_user()),
            None => Self::unauthenticated(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum MirrorState {
    Loading,
    Authenticated(SessionUser),
    Unauthenticated,
}

/// AuthState
///
/// What consumers read: `{ user, isAuthenticated, isLoading, error }`.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AuthState {
    pub user: Option<SessionUser>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// SessionMirror
///
/// States are `Loading`, `Authenticated(user)` and `Unauthenticated`. It
/// starts in `Loading` and only moves when the external status changes:
///
/// * authenticated status carrying a user → `Authenticated(user)`
/// * unauthenticated status → `Unauthenticated`
/// * authenticated status without a user, or loading → no transition
#[derive(Debug, Clone)]
pub struct SessionMirror {
    state: MirrorState,
    last_status: SessionStatus,
    error: Option<String>,
}

impl Default for SessionMirror {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionMirror {
    pub fn new() -> Self {
        Self {
            state: MirrorState::Loading,
            last_status: SessionStatus::Loading,
            error: None,
        }
    }

    /// Feeds one observation of the external session into the mirror.
    pub fn reconcile(&mut self, snapshot: &SessionSnapshot) {
        match (snapshot.status, &snapshot.user) {
            (SessionStatus::Authenticated, Some(user)) => {
                let changed = match &self.state {
                    MirrorState::Authenticated(current) => current != user,
                    _ => true,
                };
                if changed {
                    self.state = MirrorState::Authenticated(user.clone());
                    self.error = None;
                }
            }
            (SessionStatus::Unauthenticated, _) => {
                self.state = MirrorState::Unauthenticated;
                self.error = None;
            }
            (SessionStatus::Authenticated, None) => {
                tracing::debug!("authenticated session without a user record; state kept");
            }
            (SessionStatus::Loading, _) => {}
        }
        self.last_status = snapshot.status;
    }

    /// Records an error from the session source without leaving the current state.
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn state(&self) -> AuthState {
        let user = match &self.state {
            MirrorState::Authenticated(user) => Some(user.clone()),
            _ => None,
        };

        AuthState {
            is_authenticated: user.is_some(),
            user,
            is_loading: self.last_status == SessionStatus::Loading
                || self.state == MirrorState::Loading,
            error: self.error.clone(),
        }
    }
}

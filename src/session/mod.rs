//! Session state for the signed-in user.
//!
//! `SessionState` is a cheap cloneable handle. It is created by the caller
//! and injected into every store that needs to read or mirror into it.

mod intent;
mod reducer;
mod state;

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;

use crate::mvi::Reducer;

pub use intent::SessionIntent;
pub use reducer::SessionReducer;
pub use state::{SessionSnapshot, SessionUser};

/// Shared handle to the session of the authenticated user.
///
/// Readers take a read lock; every write goes through [`SessionReducer`]
/// and is published to subscribers before the lock is released.
#[derive(Clone)]
pub struct SessionState {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    state: RwLock<SessionSnapshot>,
    changes: watch::Sender<SessionSnapshot>,
}

impl SessionState {
    /// Create a signed-out session.
    pub fn new() -> Self {
        let (changes, _) = watch::channel(SessionSnapshot::default());
        Self {
            inner: Arc::new(SessionInner {
                state: RwLock::new(SessionSnapshot::default()),
                changes,
            }),
        }
    }

    pub fn signed_in(user: SessionUser) -> Self {
        let session = Self::new();
        session.sign_in(user);
        session
    }

    pub fn sign_in(&self, user: SessionUser) {
        tracing::info!(username = %user.username, "Session signed in");
        self.dispatch(SessionIntent::SignedIn { user });
    }

    pub fn sign_out(&self) {
        tracing::info!("Session signed out");
        self.dispatch(SessionIntent::SignedOut);
    }

    pub fn current(&self) -> Option<SessionUser> {
        self.inner.state.read().user.clone()
    }

    pub fn username(&self) -> Option<String> {
        self.inner.state.read().username().map(str::to_string)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.read().clone()
    }

    /// Subscribe to session changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.changes.subscribe()
    }

    pub fn dispatch(&self, intent: SessionIntent) {
        self.transact(|session| {
            *session = SessionReducer::reduce(std::mem::take(session), intent);
        });
    }

    /// Run `f` with the session read lock held.
    pub(crate) fn read<R>(&self, f: impl FnOnce(&SessionSnapshot) -> R) -> R {
        let guard = self.inner.state.read();
        f(&*guard)
    }

    /// Run `f` with the session write lock held, then publish the result.
    ///
    /// Stores use this to mutate their own state inside the same critical
    /// section, so the session is always locked before any store lock.
    pub(crate) fn transact<R>(&self, f: impl FnOnce(&mut SessionSnapshot) -> R) -> R {
        let mut guard = self.inner.state.write();
        let result = f(&mut *guard);
        self.inner.changes.send_if_modified(|published| {
            if *published == *guard {
                false
            } else {
                *published = guard.clone();
                true
            }
        });
        result
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_signed_out() {
        let session = SessionState::new();
        assert!(session.current().is_none());
        assert!(session.username().is_none());
    }

    #[test]
    fn clones_share_state() {
        let session = SessionState::new();
        let other = session.clone();
        session.sign_in(SessionUser::new("bob", "Bob"));
        assert_eq!(other.username().as_deref(), Some("bob"));
    }

    #[test]
    fn subscribers_see_changes() {
        let session = SessionState::new();
        let mut rx = session.subscribe();
        session.sign_in(SessionUser::new("bob", "Bob"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().username(), Some("bob"));

        session.dispatch(SessionIntent::DisplayNameChanged {
            username: "carol".into(),
            display_name: "Carol".into(),
        });
        assert!(!rx.has_changed().unwrap());
    }
}

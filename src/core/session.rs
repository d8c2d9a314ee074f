//! Explicit session context.
//!
//! Store operations take a [`Session`] argument instead of reading ambient
//! global auth state. The [`SessionTracker`] owns the current session and
//! notifies registered listeners when it changes (sign-in, sign-out), which
//! is the only way session changes propagate.

/// The authenticated user on whose behalf store operations run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque user identifier from the auth collaborator
    pub user_id: String,
}

impl Session {
    /// Creates a session for the given user id.
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Callback invoked with the new session value (None on sign-out).
type SessionListener = Box<dyn FnMut(Option<&Session>)>;

/// Holds the current session and the change-listener registry.
#[derive(Default)]
pub struct SessionTracker {
    current: Option<Session>,
    listeners: Vec<SessionListener>,
}

impl SessionTracker {
    /// Creates an empty tracker with no active session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current session, if a user is signed in.
    #[must_use]
    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// Replaces the current session and notifies every listener.
    pub fn set_session(&mut self, session: Option<Session>) {
        self.current = session;
        let current = self.current.clone();
        for listener in &mut self.listeners {
            listener(current.as_ref());
        }
    }

    /// Registers a listener invoked on every session change.
    pub fn on_session_change(&mut self, listener: impl FnMut(Option<&Session>) + 'static) {
        self.listeners.push(Box::new(listener));
    }
}

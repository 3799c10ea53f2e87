use crate::session::error::{SessionError, SessionResult};
use crate::session::types::{SessionEvent, SessionState};
use parking_lot::RwLock;
use std::sync::Arc;

/// Explicit session state machine: `Idle -> Uploading -> terminal`.
///
/// Clones share the same underlying state, so the manager, the worker task
/// and the handle all observe one session.
#[derive(Clone)]
pub struct SessionMachine {
    state: Arc<RwLock<SessionState>>,
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionMachine {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState::Idle)),
        }
    }

    /// Get current state
    pub fn current_state(&self) -> SessionState {
        self.state.read().clone()
    }

    /// Transition state based on event
    ///
    /// `Cancel` in a terminal state is an accepted no-op: cancelling a
    /// settled session signals nothing. Every other out-of-order event is a
    /// transition error.
    pub fn transition(&self, event: SessionEvent) -> SessionResult<SessionState> {
        let mut state = self.state.write();

        let new_state = match (&*state, &event) {
            // Issuing the transport call
            (SessionState::Idle, SessionEvent::Start) => SessionState::Uploading,

            // Settlement
            (SessionState::Uploading, SessionEvent::Complete) => SessionState::Succeeded,
            (SessionState::Uploading, SessionEvent::Fail) => SessionState::Failed,
            (SessionState::Uploading, SessionEvent::Cancel) => SessionState::Cancelled,

            // Cancelling an already-settled session is a no-op
            (s, SessionEvent::Cancel) if s.is_terminal() => s.clone(),

            _ => {
                return Err(SessionError::InvalidTransition(format!(
                    "cannot handle {:?} in state {:?}",
                    event, *state
                )));
            }
        };

        *state = new_state.clone();
        Ok(new_state)
    }
}

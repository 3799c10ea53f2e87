use crate::session::{SessionInfo, SessionMachine, SessionState, SettledOutcome, UploadEvent};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Owner-facing handle for one upload session.
///
/// Clones share the session: state, cancellation capability and outcome are
/// all common. The event receiver can be taken exactly once.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    session_id: String,
    filename: String,
    created_at: i64,
    machine: SessionMachine,
    cancel: CancellationToken,
    events: RwLock<Option<mpsc::UnboundedReceiver<UploadEvent>>>,
    outcome: RwLock<Option<SettledOutcome>>,
}

impl SessionHandle {
    pub(crate) fn new(
        filename: String,
        machine: SessionMachine,
        cancel: CancellationToken,
        events: mpsc::UnboundedReceiver<UploadEvent>,
    ) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                session_id: uuid::Uuid::new_v4().to_string(),
                filename,
                created_at: chrono::Utc::now().timestamp(),
                machine,
                cancel,
                events: RwLock::new(Some(events)),
                outcome: RwLock::new(None),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.session_id
    }

    pub fn state(&self) -> SessionState {
        self.inner.machine.current_state()
    }

    /// Settled outcome, present once the session reaches a terminal state.
    pub fn outcome(&self) -> Option<SettledOutcome> {
        self.inner.outcome.read().clone()
    }

    /// Request abortion of the in-flight transfer.
    ///
    /// Idempotent, and a no-op once the session has settled. Safe to call at
    /// any point in the session's life.
    pub fn cancel(&self) {
        if self.state().is_terminal() {
            return;
        }
        self.inner.cancel.cancel();
    }

    /// Take the event receiver (can only be taken once).
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<UploadEvent>> {
        self.inner.events.write().take()
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.inner.session_id.clone(),
            filename: self.inner.filename.clone(),
            state: self.state(),
            created_at: self.inner.created_at,
        }
    }

    pub(crate) fn machine(&self) -> &SessionMachine {
        &self.inner.machine
    }

    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    pub(crate) fn record_outcome(&self, outcome: SettledOutcome) {
        *self.inner.outcome.write() = Some(outcome);
    }
}

use crate::manager::handle::SessionHandle;
use crate::session::{
    ProgressSink, SessionEvent, SessionMachine, SettledOutcome, UploadError, UploadEvent,
    UploadReceipt, UploadResult,
};
use crate::transport::{UploadRequest, UploadTransport};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Drives single file transfers from submission to terminal state.
///
/// A manager owns one upload slot: at most one session is in flight at a
/// time, and starting a new upload first cancels the previous session's
/// capability. Each call returns its own [`SessionHandle`]; there is no
/// shared mutable cancel function reused across requests.
pub struct UploadManager {
    transport: Arc<dyn UploadTransport>,
    current: Mutex<Option<SessionHandle>>,
}

impl UploadManager {
    pub fn new(transport: Arc<dyn UploadTransport>) -> Self {
        Self {
            transport,
            current: Mutex::new(None),
        }
    }

    /// Start an upload. Validates the request, retires the previous session,
    /// and transitions the new session to `Uploading` before returning; the
    /// transport call itself runs on a spawned task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_upload(&self, request: UploadRequest) -> UploadResult<SessionHandle> {
        request.validate()?;

        let mut slot = self.current.lock();

        // One in-flight request per slot: the old capability is invoked
        // before the new request is issued.
        if let Some(prev) = slot.take() {
            if prev.state().is_uploading() {
                tracing::warn!(
                    session_id = %prev.id(),
                    "cancelling in-flight session before starting a new upload"
                );
            }
            prev.cancel();
        }

        let machine = SessionMachine::new();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let handle = SessionHandle::new(
            request.file.name.clone(),
            machine.clone(),
            cancel.clone(),
            events_rx,
        );

        // Fresh machine: Idle -> Uploading, synchronous with this call.
        machine
            .transition(SessionEvent::Start)
            .map_err(|e| UploadError::InvalidInput(e.to_string()))?;

        tracing::debug!(
            session_id = %handle.id(),
            filename = %request.file.name,
            size = request.file.size(),
            endpoint = %request.endpoint,
            "starting upload session"
        );

        self.spawn_worker(request, handle.clone(), events_tx, cancel);

        *slot = Some(handle.clone());
        Ok(handle)
    }

    /// Request cancellation of a session. No-op once it has settled.
    pub fn cancel(&self, handle: &SessionHandle) {
        handle.cancel();
    }

    /// Handle of the most recently started session, if any.
    pub fn current_session(&self) -> Option<SessionHandle> {
        self.current.lock().clone()
    }

    fn spawn_worker(
        &self,
        request: UploadRequest,
        handle: SessionHandle,
        events_tx: mpsc::UnboundedSender<UploadEvent>,
        cancel: CancellationToken,
    ) {
        let transport = self.transport.clone();
        let sink = ProgressSink::new(events_tx.clone());

        tokio::spawn(async move {
            let session_id = handle.id().to_string();

            let settled: SettledOutcome = match transport.send(request, sink, cancel).await {
                Ok(reply) => UploadReceipt::from_reply(&reply),
                Err(err) => Err(UploadError::from(err)),
            };

            let event = match &settled {
                Ok(receipt) => {
                    tracing::debug!(session_id = %session_id, artifact_id = %receipt.id, "upload succeeded");
                    SessionEvent::Complete
                }
                Err(err) if err.is_cancelled() => {
                    tracing::debug!(session_id = %session_id, "upload cancelled");
                    SessionEvent::Cancel
                }
                Err(err) => {
                    tracing::warn!(session_id = %session_id, error = %err, "upload failed");
                    SessionEvent::Fail
                }
            };

            if let Err(e) = handle.machine().transition(event) {
                tracing::warn!(session_id = %session_id, "settlement dropped: {e}");
                return;
            }

            // Terminal state and outcome are visible before the final event.
            handle.record_outcome(settled.clone());
            let _ = events_tx.send(UploadEvent::Settled(settled));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionState;
    use crate::transport::{FilePayload, ServerReply, TransportError, TransportResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Transport that never settles until its cancel token fires.
    struct PendingTransport {
        sends: AtomicUsize,
    }

    impl PendingTransport {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sends: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl UploadTransport for PendingTransport {
        async fn send(
            &self,
            _request: UploadRequest,
            _progress: ProgressSink,
            cancel: CancellationToken,
        ) -> TransportResult<ServerReply> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            cancel.cancelled().await;
            Err(TransportError::Cancelled)
        }
    }

    fn request(data: &[u8]) -> UploadRequest {
        UploadRequest::new(
            FilePayload::new("model.zip", "application/zip", data.to_vec()),
            "/api/upload/",
        )
    }

    #[tokio::test]
    async fn test_empty_file_fails_before_transport() {
        let transport = PendingTransport::new();
        let manager = UploadManager::new(transport.clone());

        let result = manager.start_upload(request(b""));
        assert!(matches!(result, Err(UploadError::InvalidInput(_))));
        assert_eq!(transport.sends.load(Ordering::SeqCst), 0);
        assert!(manager.current_session().is_none());
    }

    #[tokio::test]
    async fn test_start_is_synchronously_uploading() {
        let manager = UploadManager::new(PendingTransport::new());

        let handle = manager.start_upload(request(b"payload")).unwrap();
        assert_eq!(handle.state(), SessionState::Uploading);
        assert!(handle.outcome().is_none());
    }

    #[tokio::test]
    async fn test_current_session_tracks_latest() {
        let manager = UploadManager::new(PendingTransport::new());

        let first = manager.start_upload(request(b"a")).unwrap();
        let second = manager.start_upload(request(b"b")).unwrap();

        let current = manager.current_session().unwrap();
        assert_eq!(current.id(), second.id());
        assert_ne!(first.id(), second.id());
    }

    #[tokio::test]
    async fn test_events_can_only_be_taken_once() {
        let manager = UploadManager::new(PendingTransport::new());

        let handle = manager.start_upload(request(b"payload")).unwrap();
        assert!(handle.take_events().is_some());
        assert!(handle.take_events().is_none());
    }
}

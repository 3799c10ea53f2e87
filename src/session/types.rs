use crate::session::error::UploadError;
use crate::transport::ServerReply;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Uploading,
    Succeeded,
    Failed,
    Cancelled,
}

impl SessionState {
    pub fn is_uploading(&self) -> bool {
        matches!(self, SessionState::Uploading)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Succeeded | SessionState::Failed | SessionState::Cancelled
        )
    }
}

/// Events driving the session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Start,
    Complete,
    Fail,
    Cancel,
}

/// Terminal resolution of a session: a server receipt or a structured error.
pub type SettledOutcome = Result<UploadReceipt, UploadError>;

/// Events delivered to the session's subscriber, in order: zero or more
/// `Progress` ticks (non-decreasing), then exactly one `Settled`.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    Progress(u8),
    Settled(SettledOutcome),
}

/// Server acknowledgement for a stored upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadReceipt {
    pub id: String,
}

impl UploadReceipt {
    /// Interpret a raw server reply as a settled outcome.
    ///
    /// The backend wraps every response in a JSON envelope with a `status`
    /// field; `"OK"` carries the stored-artifact identifier either at the top
    /// level (`id`) or nested under `result` (`id` / `model_id`). Anything
    /// else is an application-level rejection.
    pub fn from_reply(reply: &ServerReply) -> SettledOutcome {
        if !reply.is_success() {
            return Err(UploadError::Application {
                message: format!("server returned HTTP {}", reply.status),
                code: Some(reply.status.to_string()),
            });
        }

        let envelope: ResponseEnvelope =
            serde_json::from_slice(&reply.body).map_err(|e| UploadError::Application {
                message: format!("unparseable response envelope: {e}"),
                code: None,
            })?;

        if envelope.status != "OK" {
            return Err(UploadError::Application {
                message: envelope
                    .message
                    .unwrap_or_else(|| format!("server reported status {:?}", envelope.status)),
                code: envelope.code.or(Some(envelope.status)),
            });
        }

        let id = envelope
            .id
            .or_else(|| envelope.result.as_ref().and_then(|r| r.id.clone()))
            .or_else(|| envelope.result.as_ref().and_then(|r| r.model_id.clone()));

        match id {
            Some(id) => Ok(UploadReceipt { id }),
            None => Err(UploadError::Application {
                message: "response envelope is missing an artifact identifier".to_string(),
                code: None,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResponseEnvelope {
    status: String,
    id: Option<String>,
    message: Option<String>,
    code: Option<String>,
    result: Option<ResultPayload>,
}

#[derive(Debug, Deserialize)]
struct ResultPayload {
    id: Option<String>,
    model_id: Option<String>,
}

/// Snapshot of a session for display purposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub filename: String,
    pub state: SessionState,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn reply(status: u16, body: &str) -> ServerReply {
        ServerReply {
            status,
            body: Bytes::copy_from_slice(body.as_bytes()),
        }
    }

    #[test]
    fn test_receipt_from_nested_result_id() {
        let outcome =
            UploadReceipt::from_reply(&reply(200, r#"{"status":"OK","result":{"id":"m-1"}}"#));
        assert_eq!(outcome.unwrap().id, "m-1");
    }

    #[test]
    fn test_receipt_from_top_level_id() {
        let outcome = UploadReceipt::from_reply(&reply(200, r#"{"status":"OK","id":"f-42"}"#));
        assert_eq!(outcome.unwrap().id, "f-42");
    }

    #[test]
    fn test_receipt_from_model_id() {
        let outcome = UploadReceipt::from_reply(&reply(
            201,
            r#"{"status":"OK","result":{"model_id":"m-7"}}"#,
        ));
        assert_eq!(outcome.unwrap().id, "m-7");
    }

    #[test]
    fn test_logical_rejection_carries_message_and_code() {
        let outcome = UploadReceipt::from_reply(&reply(
            200,
            r#"{"status":"ERROR","message":"unsupported archive","code":"E_FORMAT"}"#,
        ));
        match outcome {
            Err(UploadError::Application { message, code }) => {
                assert_eq!(message, "unsupported archive");
                assert_eq!(code.as_deref(), Some("E_FORMAT"));
            }
            other => panic!("expected application error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_2xx_is_application_error() {
        let outcome = UploadReceipt::from_reply(&reply(500, "internal error"));
        match outcome {
            Err(UploadError::Application { code, .. }) => {
                assert_eq!(code.as_deref(), Some("500"));
            }
            other => panic!("expected application error, got {other:?}"),
        }
    }

    #[test]
    fn test_garbage_body_is_application_error() {
        let outcome = UploadReceipt::from_reply(&reply(200, "<html>not json</html>"));
        assert!(matches!(outcome, Err(UploadError::Application { .. })));
    }

    #[test]
    fn test_ok_without_identifier_is_rejected() {
        let outcome = UploadReceipt::from_reply(&reply(200, r#"{"status":"OK"}"#));
        assert!(matches!(outcome, Err(UploadError::Application { .. })));
    }

    #[test]
    fn test_terminal_states() {
        assert!(!SessionState::Idle.is_terminal());
        assert!(!SessionState::Uploading.is_terminal());
        assert!(SessionState::Succeeded.is_terminal());
        assert!(SessionState::Failed.is_terminal());
        assert!(SessionState::Cancelled.is_terminal());
    }
}

pub mod error;
pub mod http;
pub mod types;

pub use error::{TransportError, TransportResult};
pub use http::HttpTransport;
pub use types::{FilePayload, ServerReply, UploadRequest, FILE_FIELD};

use crate::session::ProgressSink;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Transport seam: issues one multipart upload, reporting byte-level progress
/// through the sink and aborting cooperatively when the token fires.
///
/// Implementations must return `TransportError::Cancelled` when the token is
/// observed, and must not touch the sink after returning.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    async fn send(
        &self,
        request: UploadRequest,
        progress: ProgressSink,
        cancel: CancellationToken,
    ) -> TransportResult<ServerReply>;
}

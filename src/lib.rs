pub mod manager;
pub mod session;
pub mod transport;

pub use manager::{SessionHandle, UploadManager};
pub use session::{
    ProgressSink, SessionInfo, SessionState, SettledOutcome, UploadError, UploadEvent,
    UploadReceipt, UploadResult,
};
pub use transport::{FilePayload, HttpTransport, UploadRequest, UploadTransport};

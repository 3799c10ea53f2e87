pub mod error;
pub mod machine;
pub mod progress;
pub mod types;

pub use error::{SessionError, SessionResult, UploadError, UploadResult};
pub use machine::SessionMachine;
pub use progress::{percent, ProgressSink};
pub use types::{
    SessionEvent, SessionInfo, SessionState, SettledOutcome, UploadEvent, UploadReceipt,
};

mod handle;
mod manager;

pub use handle::SessionHandle;
pub use manager::UploadManager;

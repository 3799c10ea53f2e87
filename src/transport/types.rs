use crate::session::error::UploadError;
use bytes::Bytes;

/// Multipart field name the backend expects the file under.
pub const FILE_FIELD: &str = "file";

/// In-memory file payload plus metadata. Provided once at session creation,
/// immutable thereafter.
#[derive(Debug, Clone)]
pub struct FilePayload {
    pub name: String,
    pub mime: String,
    pub data: Bytes,
}

impl FilePayload {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            data: data.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Everything needed to issue one multipart upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file: FilePayload,
    pub endpoint: String,
    pub auth_token: Option<String>,
    /// Additional scalar form fields sent beside the file.
    pub fields: Vec<(String, String)>,
}

impl UploadRequest {
    pub fn new(file: FilePayload, endpoint: impl Into<String>) -> Self {
        Self {
            file,
            endpoint: endpoint.into(),
            auth_token: None,
            fields: Vec::new(),
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Precondition checks, run before any network activity.
    pub fn validate(&self) -> Result<(), UploadError> {
        if self.file.data.is_empty() {
            return Err(UploadError::InvalidInput(format!(
                "file {:?} is empty",
                self.file.name
            )));
        }
        if self.file.name.trim().is_empty() {
            return Err(UploadError::InvalidInput("file has no name".to_string()));
        }
        if self.endpoint.trim().is_empty() {
            return Err(UploadError::InvalidInput(
                "destination endpoint is empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Raw server reply: HTTP status plus unparsed body. Envelope interpretation
/// happens in the session layer.
#[derive(Debug, Clone)]
pub struct ServerReply {
    pub status: u16,
    pub body: Bytes,
}

impl ServerReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

use crate::session::ProgressSink;
use crate::transport::error::{TransportError, TransportResult};
use crate::transport::types::{ServerReply, UploadRequest, FILE_FIELD};
use crate::transport::UploadTransport;
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const DEFAULT_BODY_CHUNK: usize = 64 * 1024;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP(S) transport: multipart/form-data POST with the file under the
/// `file` field, streamed in chunks so upload progress can be observed.
pub struct HttpTransport {
    client: reqwest::Client,
    body_chunk_size: usize,
}

impl HttpTransport {
    pub fn new() -> TransportResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        Ok(Self::with_client(client))
    }

    /// Use a caller-configured client (proxies, TLS settings, timeouts).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            body_chunk_size: DEFAULT_BODY_CHUNK,
        }
    }

    /// List previously stored uploads. Returns the raw JSON the server sent.
    pub async fn fetch_uploads(
        &self,
        endpoint: &str,
        auth_token: Option<&str>,
    ) -> TransportResult<serde_json::Value> {
        let mut builder = self.client.get(endpoint);
        if let Some(token) = auth_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::RequestFailed(e.to_string()))?;

        response
            .json()
            .await
            .map_err(|e| TransportError::BodyError(e.to_string()))
    }

    /// Chunked body stream that reports the cumulative byte count through the
    /// sink as each chunk is handed to the connection.
    fn body_stream(
        &self,
        data: Bytes,
        progress: ProgressSink,
    ) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
        let total = data.len() as u64;
        let chunk_size = self.body_chunk_size.max(1);

        let mut chunks = Vec::with_capacity(data.len() / chunk_size + 1);
        let mut offset = 0;
        while offset < data.len() {
            let end = usize::min(offset + chunk_size, data.len());
            chunks.push(data.slice(offset..end));
            offset = end;
        }

        let mut sent = 0u64;
        futures::stream::iter(chunks).map(move |chunk| {
            sent += chunk.len() as u64;
            progress.report(sent, Some(total));
            Ok::<Bytes, std::io::Error>(chunk)
        })
    }
}

#[async_trait]
impl UploadTransport for HttpTransport {
    async fn send(
        &self,
        request: UploadRequest,
        progress: ProgressSink,
        cancel: CancellationToken,
    ) -> TransportResult<ServerReply> {
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }

        let total = request.file.size();
        let body = reqwest::Body::wrap_stream(self.body_stream(request.file.data.clone(), progress));

        let part = Part::stream_with_length(body, total)
            .file_name(request.file.name.clone())
            .mime_str(&request.file.mime)
            .map_err(|e| {
                TransportError::InvalidRequest(format!(
                    "bad mime type {:?}: {e}",
                    request.file.mime
                ))
            })?;

        let mut form = Form::new().part(FILE_FIELD, part);
        for (name, value) in request.fields {
            form = form.text(name, value);
        }

        let mut builder = self.client.post(&request.endpoint).multipart(form);
        if let Some(token) = &request.auth_token {
            builder = builder.bearer_auth(token);
        }

        let response = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(endpoint = %request.endpoint, "upload aborted in flight");
                return Err(TransportError::Cancelled);
            }
            result = builder.send() => {
                result.map_err(|e| TransportError::RequestFailed(e.to_string()))?
            }
        };

        let status = response.status().as_u16();
        let body = tokio::select! {
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            result = response.bytes() => {
                result.map_err(|e| TransportError::BodyError(e.to_string()))?
            }
        };

        Ok(ServerReply { status, body })
    }
}

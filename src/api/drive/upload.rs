use super::{
    client::{GraphClient, RequestOptions},
    endpoints::upload_target,
};
use crate::error::{ApiError, Result};
use crate::transport::{HttpRequest, HttpResponse, RequestBody};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

/// Largest payload sent as a single PUT; anything bigger uses a session.
pub const SIMPLE_UPLOAD_MAX_BYTES: usize = 4 * 1024 * 1024;
/// Bytes per session PUT. A multiple of 320 KiB as Graph requires.
pub const UPLOAD_CHUNK_SIZE: usize = 10 * 1024 * 1024;
/// Time allowed for one simple PUT or one session chunk.
pub const UPLOAD_TRANSFER_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadStrategy {
    Simple,
    Session,
}

impl UploadStrategy {
    pub fn for_len(len: usize) -> Self {
        if len <= SIMPLE_UPLOAD_MAX_BYTES {
            UploadStrategy::Simple
        } else {
            UploadStrategy::Session
        }
    }
}

/// Half-open byte range `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// `bytes {start}-{end-1}/{total}`; an empty range has no last byte
    /// and renders as `bytes */{total}`.
    pub fn content_range(&self, total: usize) -> String {
        if self.is_empty() {
            return format!("bytes */{total}");
        }
        format!("bytes {}-{}/{}", self.start, self.end - 1, total)
    }
}

/// Progress through one chunked upload. Lives only for the duration of the
/// upload and is dropped on completion or the first failed chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadSession {
    pub upload_url: String,
    pub file_size: usize,
    pub cursor: usize,
}

impl UploadSession {
    pub fn new(upload_url: impl Into<String>, file_size: usize) -> Self {
        Self {
            upload_url: upload_url.into(),
            file_size,
            cursor: 0,
        }
    }

    pub fn next_range(&self, chunk_size: usize) -> Option<ByteRange> {
        if self.cursor >= self.file_size || chunk_size == 0 {
            return None;
        }
        Some(ByteRange {
            start: self.cursor,
            end: self.cursor.saturating_add(chunk_size).min(self.file_size),
        })
    }

    pub fn advance(&mut self, range: ByteRange) {
        self.cursor = range.end;
    }
}

/// Every range a session over `file_size` bytes sends, in order.
pub fn chunk_ranges(file_size: usize, chunk_size: usize) -> Vec<ByteRange> {
    let mut session = UploadSession::new(String::new(), file_size);
    let mut ranges = Vec::new();
    while let Some(range) = session.next_range(chunk_size) {
        ranges.push(range);
        session.advance(range);
    }
    ranges
}

/// A file to place in a drive folder.
#[derive(Clone, Copy, Debug)]
pub struct UploadRequest<'a> {
    pub drive_id: &'a str,
    pub folder_path: &'a str,
    pub file_name: &'a str,
    pub data: &'a [u8],
    pub mime_type: &'a str,
}

/// Uploads with a single PUT or through an upload session depending on size,
/// returning Graph's response for the stored item.
pub async fn upload_file(client: &GraphClient, request: UploadRequest<'_>) -> Result<Value> {
    match UploadStrategy::for_len(request.data.len()) {
        UploadStrategy::Simple => simple_upload(client, request).await,
        UploadStrategy::Session => session_upload(client, request, UPLOAD_CHUNK_SIZE).await,
    }
}

async fn simple_upload(client: &GraphClient, request: UploadRequest<'_>) -> Result<Value> {
    let target = upload_target(request.drive_id, request.folder_path, request.file_name);
    let response = client
        .request(
            Method::PUT,
            &target.content_endpoint(),
            RequestBody::Bytes(request.data.to_vec()),
            &RequestOptions::default()
                .header("Content-Type", request.mime_type)
                .timeout(client.transfer_timeout(UPLOAD_TRANSFER_TIMEOUT)),
        )
        .await?;
    info!(
        file_name = request.file_name,
        bytes = request.data.len(),
        "uploaded file with a single request"
    );
    Ok(response)
}

#[derive(Debug, Deserialize)]
struct UploadSessionDto {
    #[serde(rename = "uploadUrl")]
    upload_url: Option<String>,
}

async fn session_upload(
    client: &GraphClient,
    request: UploadRequest<'_>,
    chunk_size: usize,
) -> Result<Value> {
    let target = upload_target(request.drive_id, request.folder_path, request.file_name);
    let created = client
        .request(
            Method::POST,
            &target.upload_session_endpoint(),
            RequestBody::Json(json!({
                "item": {
                    "@microsoft.graph.conflictBehavior": "replace",
                    "name": request.file_name,
                }
            })),
            &RequestOptions::default(),
        )
        .await?;

    let upload_url = serde_json::from_value::<UploadSessionDto>(created)
        .ok()
        .and_then(|dto| dto.upload_url)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ApiError::transport("upload session response is missing uploadUrl"))?;

    let mut session = UploadSession::new(upload_url, request.data.len());
    let last = send_chunks(client, &mut session, request.data, chunk_size).await?;
    info!(
        file_name = request.file_name,
        bytes = session.file_size,
        "uploaded file through an upload session"
    );
    Ok(final_chunk_json(&last))
}

/// PUTs each range in turn; the first failure aborts the session.
async fn send_chunks(
    client: &GraphClient,
    session: &mut UploadSession,
    data: &[u8],
    chunk_size: usize,
) -> Result<HttpResponse> {
    let mut last = None;
    while let Some(range) = session.next_range(chunk_size) {
        let chunk = &data[range.start..range.end];
        debug!(
            range = %range.content_range(session.file_size),
            "sending upload chunk"
        );
        let request = HttpRequest::new(Method::PUT, session.upload_url.as_str())
            .header("Content-Length", chunk.len().to_string())
            .header("Content-Range", range.content_range(session.file_size))
            .body(RequestBody::Bytes(chunk.to_vec()))
            .timeout(client.transfer_timeout(UPLOAD_TRANSFER_TIMEOUT));
        last = Some(client.send_unauthenticated(request).await?);
        session.advance(range);
    }
    last.ok_or_else(|| ApiError::transport("upload session had nothing to send").into())
}

fn final_chunk_json(response: &HttpResponse) -> Value {
    match response.json::<Value>() {
        Ok(value @ Value::Object(_)) => value,
        _ => json!({ "statusCode": response.status }),
    }
}

//! Backend contracts and their HTTP implementation.
//!
//! [`UploadBackend`] is the seam the stateful components talk through; [`ApiClient`]
//! implements it over reqwest, and tests substitute in-memory fakes.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::Either;
use futures::{stream, TryStreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use smartship_core::constants::{SESSION_URL_PATH, UPLOAD_FIELD_NAME, UPLOAD_PATH_PREFIX};
use smartship_core::{FileCandidate, FileSource, SessionDescriptor};
use tokio_util::io::ReaderStream;

use crate::error::{BackendError, BackendResult};
use crate::{error_message_from_body, ApiClient};

/// Chunk size used when streaming in-memory payloads, so progress ticks stay granular.
const MEMORY_CHUNK_SIZE: usize = 64 * 1024;

/// Bytes handed to the transport so far for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub transferred: u64,
    /// Sum of the payload sizes, when known before sending.
    pub total: Option<u64>,
}

/// Called from the request body stream as chunks are consumed.
pub type TransferCallback = Arc<dyn Fn(TransferProgress) + Send + Sync>;

/// The two backend operations the pipeline depends on.
#[async_trait]
pub trait UploadBackend: Send + Sync {
    /// `GET /session-url`
    async fn fetch_session(&self) -> BackendResult<SessionDescriptor>;

    /// `POST /upload/{session_id}` with every file as a repeated `files` part.
    ///
    /// Returns once the server answered with a success status. A non-success status
    /// is reported as [`BackendError::Status`] carrying the body's `error` field.
    async fn upload_files(
        &self,
        session_id: &str,
        files: &[FileCandidate],
        on_progress: TransferCallback,
    ) -> BackendResult<()>;
}

type ChunkStream =
    Either<ReaderStream<tokio::fs::File>, stream::Iter<std::vec::IntoIter<io::Result<Bytes>>>>;

async fn open_chunks(file: &FileCandidate) -> BackendResult<ChunkStream> {
    match &file.raw {
        FileSource::Path(path) => {
            let handle = tokio::fs::File::open(path)
                .await
                .map_err(|source| BackendError::File {
                    name: file.name.clone(),
                    source,
                })?;
            Ok(Either::Left(ReaderStream::new(handle)))
        }
        FileSource::Memory(data) => {
            let chunks: Vec<io::Result<Bytes>> = (0..data.len())
                .step_by(MEMORY_CHUNK_SIZE)
                .map(|start| Ok(data.slice(start..(start + MEMORY_CHUNK_SIZE).min(data.len()))))
                .collect();
            Ok(Either::Right(stream::iter(chunks)))
        }
    }
}

/// The session id is taken from an already-escaped URL path segment. Decode it once
/// so escaping is applied exactly once on the way back out.
fn upload_path_segment(session_id: &str) -> String {
    match urlencoding::decode(session_id) {
        Ok(decoded) => urlencoding::encode(&decoded).into_owned(),
        Err(_) => session_id.to_string(),
    }
}

impl ApiClient {
    /// Build the multipart form, wiring every part's body through the shared byte counter.
    async fn build_upload_form(
        &self,
        files: &[FileCandidate],
        on_progress: TransferCallback,
    ) -> BackendResult<Form> {
        let total: u64 = files.iter().map(|f| f.size_bytes).sum();
        let total = (total > 0).then_some(total);
        let counter = Arc::new(AtomicU64::new(0));

        let mut form = Form::new();
        for file in files {
            let chunks = open_chunks(file).await?;
            let counter = Arc::clone(&counter);
            let callback = Arc::clone(&on_progress);
            let counted = chunks.inspect_ok(move |chunk| {
                let len = chunk.len() as u64;
                let transferred = counter.fetch_add(len, Ordering::Relaxed) + len;
                callback(TransferProgress { transferred, total });
            });

            let part = Part::stream_with_length(Body::wrap_stream(counted), file.size_bytes)
                .file_name(file.name.clone())
                .mime_str(&file.mime_type)
                .map_err(|e| {
                    BackendError::InvalidRequest(format!(
                        "invalid content type '{}' for {}: {}",
                        file.mime_type, file.name, e
                    ))
                })?;
            form = form.part(UPLOAD_FIELD_NAME, part);
        }

        Ok(form)
    }
}

#[async_trait]
impl UploadBackend for ApiClient {
    async fn fetch_session(&self) -> BackendResult<SessionDescriptor> {
        self.get(SESSION_URL_PATH).await
    }

    async fn upload_files(
        &self,
        session_id: &str,
        files: &[FileCandidate],
        on_progress: TransferCallback,
    ) -> BackendResult<()> {
        let path = format!("{}/{}", UPLOAD_PATH_PREFIX, upload_path_segment(session_id));
        let form = self.build_upload_form(files, on_progress).await?;

        tracing::debug!(
            session_id = %session_id,
            file_count = files.len(),
            "Sending multipart upload"
        );

        let response = self
            .client()
            .post(self.build_url(&path))
            .multipart(form)
            .send()
            .await
            .map_err(BackendError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: error_message_from_body(&body),
            });
        }

        Ok(())
    }
}

//! Remote batch-completion service client.
//!
//! This module defines the `BatchClient` trait covering the capability set a
//! batch job needs from the remote service - file upload, batch registration,
//! batch retrieval, and file-content download - enabling testability with a
//! scripted mock implementation. Each `BatchJob` owns an explicitly
//! constructed client handle; there is no shared global session.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SheafError};

/// Handle to an uploaded file resource on the remote service.
#[derive(Debug, Clone, Deserialize)]
pub struct FileHandle {
    pub id: String,
}

/// Remote view of a batch task.
///
/// `status` is an open string owned by the remote service; see
/// `JobStatus::from_remote` for the local mapping.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteBatch {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub output_file_id: Option<String>,
    #[serde(default)]
    pub error_file_id: Option<String>,
}

/// Capability set consumed from the remote batch service.
#[async_trait]
pub trait BatchClient: Send + Sync {
    /// Upload a request file. `purpose` tags the upload for the service
    /// (always "batch" for batch input files).
    async fn upload_file(&self, data: Vec<u8>, purpose: &str) -> Result<FileHandle>;

    /// Register a batch task referencing an uploaded request file.
    async fn create_batch(
        &self,
        input_file_id: &str,
        endpoint: &str,
        completion_window: &str,
        metadata: Option<serde_json::Value>,
    ) -> Result<RemoteBatch>;

    /// Fetch the current remote state of a batch task.
    async fn retrieve_batch(&self, job_id: &str) -> Result<RemoteBatch>;

    /// Download the content of a result file.
    async fn file_content(&self, file_id: &str) -> Result<String>;
}

// ============================================================================
// Production implementation using reqwest
// ============================================================================

#[derive(Serialize)]
struct CreateBatchRequest<'a> {
    input_file_id: &'a str,
    endpoint: &'a str,
    completion_window: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<serde_json::Value>,
}

/// Client for an OpenAI-style batch API.
#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    organization: Option<String>,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, "https://api.openai.com")
    }

    /// Point the client at a different base URL (tests, proxies).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            organization: None,
        }
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key);
        if let Some(organization) = &self.organization {
            builder = builder.header("OpenAI-Organization", organization);
        }
        builder
    }

    /// Surface non-2xx responses as a service error carrying status and body.
    async fn checked(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let url = response.url().clone();
        let body = response.text().await.unwrap_or_default();
        tracing::error!(status = status.as_u16(), url = %url, body = %body, "batch service returned an error");
        Err(SheafError::Service {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl BatchClient for OpenAiClient {
    #[tracing::instrument(skip(self, data), fields(bytes = data.len()))]
    async fn upload_file(&self, data: Vec<u8>, purpose: &str) -> Result<FileHandle> {
        let part = reqwest::multipart::Part::bytes(data)
            .file_name("batch_requests.jsonl")
            .mime_str("application/jsonl")?;
        let form = reqwest::multipart::Form::new()
            .text("purpose", purpose.to_string())
            .part("file", part);

        let response = self
            .request(reqwest::Method::POST, "/v1/files")
            .multipart(form)
            .send()
            .await?;
        let handle: FileHandle = Self::checked(response).await?.json().await?;

        tracing::info!(file_id = %handle.id, "uploaded request file");
        Ok(handle)
    }

    #[tracing::instrument(skip(self, metadata))]
    async fn create_batch(
        &self,
        input_file_id: &str,
        endpoint: &str,
        completion_window: &str,
        metadata: Option<serde_json::Value>,
    ) -> Result<RemoteBatch> {
        let response = self
            .request(reqwest::Method::POST, "/v1/batches")
            .json(&CreateBatchRequest {
                input_file_id,
                endpoint,
                completion_window,
                metadata,
            })
            .send()
            .await?;
        let batch: RemoteBatch = Self::checked(response).await?.json().await?;

        tracing::info!(job_id = %batch.id, status = %batch.status, "registered batch task");
        Ok(batch)
    }

    async fn retrieve_batch(&self, job_id: &str) -> Result<RemoteBatch> {
        let response = self
            .request(reqwest::Method::GET, &format!("/v1/batches/{job_id}"))
            .send()
            .await?;
        let batch: RemoteBatch = Self::checked(response).await?.json().await?;
        Ok(batch)
    }

    async fn file_content(&self, file_id: &str) -> Result<String> {
        let response = self
            .request(reqwest::Method::GET, &format!("/v1/files/{file_id}/content"))
            .send()
            .await?;
        let content = Self::checked(response).await?.text().await?;
        Ok(content)
    }
}

// ============================================================================
// Test/mock implementation
// ============================================================================

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

#[derive(Default)]
struct MockState {
    uploads: Vec<(Vec<u8>, String)>,
    created: Vec<(String, String, String)>,
    retrievals: VecDeque<RemoteBatch>,
    retrieve_calls: usize,
    file_contents: HashMap<String, String>,
    fail_upload: bool,
    fail_create: bool,
}

/// Scripted mock of the remote batch service.
///
/// Retrieval responses are consumed in FIFO order; the last scripted response
/// repeats, so a poll loop observes a stable remote state once transitions
/// run out.
#[derive(Clone, Default)]
pub struct MockBatchClient {
    state: Arc<Mutex<MockState>>,
}

impl MockBatchClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next remote state returned by `retrieve_batch`.
    pub fn push_remote_state(&self, batch: RemoteBatch) {
        self.state.lock().retrievals.push_back(batch);
    }

    /// Script the content served for a result file id.
    pub fn set_file_content(&self, file_id: &str, content: &str) {
        self.state
            .lock()
            .file_contents
            .insert(file_id.to_string(), content.to_string());
    }

    /// Make the next `upload_file` call fail.
    pub fn fail_next_upload(&self) {
        self.state.lock().fail_upload = true;
    }

    /// Make the next `create_batch` call fail.
    pub fn fail_next_create(&self) {
        self.state.lock().fail_create = true;
    }

    /// Payloads passed to `upload_file`, with their purposes.
    pub fn uploads(&self) -> Vec<(Vec<u8>, String)> {
        self.state.lock().uploads.clone()
    }

    /// (input_file_id, endpoint, completion_window) triples passed to
    /// `create_batch`.
    pub fn created_batches(&self) -> Vec<(String, String, String)> {
        self.state.lock().created.clone()
    }

    /// Number of `retrieve_batch` calls made so far.
    pub fn retrieve_calls(&self) -> usize {
        self.state.lock().retrieve_calls
    }
}

#[async_trait]
impl BatchClient for MockBatchClient {
    async fn upload_file(&self, data: Vec<u8>, purpose: &str) -> Result<FileHandle> {
        let mut state = self.state.lock();
        if state.fail_upload {
            state.fail_upload = false;
            return Err(SheafError::Service {
                status: 500,
                body: "scripted upload failure".to_string(),
            });
        }
        state.uploads.push((data, purpose.to_string()));
        Ok(FileHandle {
            id: format!("file-{}", state.uploads.len()),
        })
    }

    async fn create_batch(
        &self,
        input_file_id: &str,
        endpoint: &str,
        completion_window: &str,
        _metadata: Option<serde_json::Value>,
    ) -> Result<RemoteBatch> {
        let mut state = self.state.lock();
        if state.fail_create {
            state.fail_create = false;
            return Err(SheafError::Service {
                status: 500,
                body: "scripted registration failure".to_string(),
            });
        }
        state.created.push((
            input_file_id.to_string(),
            endpoint.to_string(),
            completion_window.to_string(),
        ));
        Ok(RemoteBatch {
            id: format!("batch-{}", state.created.len()),
            status: "validating".to_string(),
            output_file_id: None,
            error_file_id: None,
        })
    }

    async fn retrieve_batch(&self, job_id: &str) -> Result<RemoteBatch> {
        let mut state = self.state.lock();
        state.retrieve_calls += 1;
        if state.retrievals.len() > 1 {
            let batch = state.retrievals.pop_front().unwrap();
            return Ok(batch);
        }
        match state.retrievals.front() {
            Some(batch) => Ok(batch.clone()),
            None => Err(SheafError::Service {
                status: 404,
                body: format!("no scripted state for batch {job_id}"),
            }),
        }
    }

    async fn file_content(&self, file_id: &str) -> Result<String> {
        let state = self.state.lock();
        match state.file_contents.get(file_id) {
            Some(content) => Ok(content.clone()),
            None => Err(SheafError::Service {
                status: 404,
                body: format!("no scripted content for file {file_id}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_upload_file_sends_bearer_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/files"))
            .and(header("Authorization", "Bearer test-key"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "file-abc"})),
            )
            .mount(&server)
            .await;

        let client = OpenAiClient::with_base_url("test-key", server.uri());
        let handle = client
            .upload_file(b"{}\n".to_vec(), "batch")
            .await
            .unwrap();
        assert_eq!(handle.id, "file-abc");
    }

    #[tokio::test]
    async fn test_create_batch_posts_input_file_reference() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/batches"))
            .and(body_partial_json(serde_json::json!({
                "input_file_id": "file-abc",
                "endpoint": "/v1/chat/completions",
                "completion_window": "24h",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "batch-1",
                "status": "validating",
            })))
            .mount(&server)
            .await;

        let client = OpenAiClient::with_base_url("test-key", server.uri());
        let batch = client
            .create_batch("file-abc", "/v1/chat/completions", "24h", None)
            .await
            .unwrap();
        assert_eq!(batch.id, "batch-1");
        assert_eq!(batch.status, "validating");
        assert!(batch.output_file_id.is_none());
    }

    #[tokio::test]
    async fn test_retrieve_batch_reads_file_references() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/batches/batch-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "batch-1",
                "status": "completed",
                "output_file_id": "file-out",
                "error_file_id": null,
            })))
            .mount(&server)
            .await;

        let client = OpenAiClient::with_base_url("test-key", server.uri());
        let batch = client.retrieve_batch("batch-1").await.unwrap();
        assert_eq!(batch.status, "completed");
        assert_eq!(batch.output_file_id.as_deref(), Some("file-out"));
        assert!(batch.error_file_id.is_none());
    }

    #[tokio::test]
    async fn test_file_content_returns_body_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/files/file-out/content"))
            .respond_with(ResponseTemplate::new(200).set_body_string("line1\nline2\n"))
            .mount(&server)
            .await;

        let client = OpenAiClient::with_base_url("test-key", server.uri());
        let content = client.file_content("file-out").await.unwrap();
        assert_eq!(content, "line1\nline2\n");
    }

    #[tokio::test]
    async fn test_non_success_surfaces_as_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/batches/batch-x"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
            .mount(&server)
            .await;

        let client = OpenAiClient::with_base_url("test-key", server.uri());
        let err = client.retrieve_batch("batch-x").await.unwrap_err();
        match err {
            SheafError::Service { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "bad request");
            }
            other => panic!("expected Service error, got {other:?}"),
        }
    }
}

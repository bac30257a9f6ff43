//! Batch job lifecycle: submission, polling, and result retrieval.
//!
//! A `BatchJob` owns its request entries, its client handle, and the
//! last-observed remote status. State transitions after submission are driven
//! exclusively by the remote service and observed via `poll`. `submit`,
//! `poll`, and `retrieve_output` are independent idempotent operations, so a
//! job can be checkpointed (its job id written to durable storage) and
//! resumed by a separate process invocation - the job id is the only state
//! required to resume polling or retrieval.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::client::BatchClient;
use crate::error::{Result, SheafError};
use crate::prompt::{self, BatchRequestEntry, COMPLETIONS_PATH};

/// Completion window requested for every batch task.
const COMPLETION_WINDOW: &str = "24h";

/// Last-observed status of a batch job.
///
/// The remote service's status field is an open string; it is mapped into
/// this closed enum, with `Unrecognized` as the explicit fallback so an
/// unexpected new remote status cannot silently look like success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Entries assembled, no network call made yet
    Unsubmitted,
    Pending,
    InProgress,
    Completed,
    Failed,
    Expired,
    Cancelled,
    /// The service reported a status this crate does not know. Never
    /// terminal.
    Unrecognized(String),
}

impl JobStatus {
    /// Whether no further remote transition will occur.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Expired | JobStatus::Cancelled
        )
    }

    /// Map the remote service's status string into the local enum.
    fn from_remote(raw: &str) -> Self {
        match raw {
            "validating" => JobStatus::Pending,
            "in_progress" | "finalizing" | "cancelling" => JobStatus::InProgress,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            "expired" => JobStatus::Expired,
            "cancelled" => JobStatus::Cancelled,
            other => JobStatus::Unrecognized(other.to_string()),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Unsubmitted => write!(f, "unsubmitted"),
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::InProgress => write!(f, "in_progress"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Expired => write!(f, "expired"),
            JobStatus::Cancelled => write!(f, "cancelled"),
            JobStatus::Unrecognized(raw) => write!(f, "unrecognized:{raw}"),
        }
    }
}

/// How `await_completion` paces its polling.
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Fixed wait between polls.
    pub interval: Duration,
    /// Optional bound on poll attempts. `None` preserves the unbounded wait;
    /// callers needing a deadline wrap `await_completion` with an external
    /// timeout or set this.
    pub max_attempts: Option<usize>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            max_attempts: None,
        }
    }
}

/// One asynchronous batch-completion job.
pub struct BatchJob<C> {
    client: C,
    entries: Vec<BatchRequestEntry>,
    job_id: Option<String>,
    status: JobStatus,
    input_file_id: Option<String>,
    output_file_id: Option<String>,
    error_file_id: Option<String>,
    submitted_at: Option<DateTime<Utc>>,
}

impl<C: BatchClient> BatchJob<C> {
    /// Create an unsubmitted job from assembled entries.
    pub fn new(client: C, entries: Vec<BatchRequestEntry>) -> Self {
        Self {
            client,
            entries,
            job_id: None,
            status: JobStatus::Unsubmitted,
            input_file_id: None,
            output_file_id: None,
            error_file_id: None,
            submitted_at: None,
        }
    }

    /// Rebuild a job from a previously recorded job id, e.g. after a process
    /// restart. The first `poll` refreshes the actual remote status.
    pub fn resume(client: C, job_id: impl Into<String>) -> Self {
        Self {
            client,
            entries: Vec::new(),
            job_id: Some(job_id.into()),
            status: JobStatus::Pending,
            input_file_id: None,
            output_file_id: None,
            error_file_id: None,
            submitted_at: None,
        }
    }

    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    /// Last-observed status.
    pub fn status(&self) -> &JobStatus {
        &self.status
    }

    pub fn entries(&self) -> &[BatchRequestEntry] {
        &self.entries
    }

    /// Upload the assembled entries as one request file and register a batch
    /// task referencing it.
    ///
    /// Returns the job id assigned by the remote service. On failure the job
    /// stays `Unsubmitted`, so `submit` can simply be called again.
    pub async fn submit(&mut self) -> Result<String> {
        if self.job_id.is_some() {
            return Err(SheafError::InvalidState {
                operation: "submit",
                status: self.status.to_string(),
            });
        }
        if self.entries.is_empty() {
            return Err(SheafError::Submission("batch has no entries".to_string()));
        }

        let payload = prompt::to_jsonl(&self.entries)
            .map_err(|e| SheafError::Submission(format!("failed to encode entries: {e}")))?;

        let file = self
            .client
            .upload_file(payload.into_bytes(), "batch")
            .await
            .map_err(|e| SheafError::Submission(format!("input file upload failed: {e}")))?;

        let batch = self
            .client
            .create_batch(
                &file.id,
                COMPLETIONS_PATH,
                COMPLETION_WINDOW,
                Some(serde_json::json!({ "description": "sheaf structuring batch" })),
            )
            .await
            .map_err(|e| SheafError::Submission(format!("batch registration failed: {e}")))?;

        tracing::info!(
            job_id = %batch.id,
            input_file_id = %file.id,
            entries = self.entries.len(),
            "batch submitted"
        );

        self.input_file_id = Some(file.id);
        self.job_id = Some(batch.id.clone());
        self.status = JobStatus::Pending;
        self.submitted_at = Some(Utc::now());
        Ok(batch.id)
    }

    /// Query the remote service for the job's current status.
    ///
    /// Idempotent: the only local effect is refreshing the cached status and
    /// result-file references, and the query has no side effects on the
    /// remote resource.
    pub async fn poll(&mut self) -> Result<JobStatus> {
        let job_id = self.job_id.as_deref().ok_or(SheafError::InvalidState {
            operation: "poll",
            status: self.status.to_string(),
        })?;

        let remote = self.client.retrieve_batch(job_id).await?;
        let status = JobStatus::from_remote(&remote.status);
        if status != self.status {
            tracing::info!(job_id = %job_id, from = %self.status, to = %status, "batch status changed");
        }
        self.status = status.clone();
        self.output_file_id = remote.output_file_id;
        self.error_file_id = remote.error_file_id;
        Ok(status)
    }

    /// Poll at a fixed interval until the job reaches a terminal status.
    ///
    /// Unbounded by default; cancellation of the calling task is honored at
    /// the await points between polls, never mid-poll. Cancelling locally
    /// does not cancel the remote batch task.
    pub async fn await_completion(&mut self, options: PollOptions) -> Result<JobStatus> {
        let mut attempts = 0usize;
        loop {
            let status = self.poll().await?;
            if status.is_terminal() {
                tracing::info!(
                    job_id = %self.job_id.as_deref().unwrap_or(""),
                    status = %status,
                    "batch reached terminal status"
                );
                return Ok(status);
            }

            attempts += 1;
            if let Some(limit) = options.max_attempts {
                if attempts >= limit {
                    return Err(SheafError::PollLimit {
                        job_id: self.job_id.clone().unwrap_or_default(),
                        attempts,
                    });
                }
            }

            tokio::time::sleep(options.interval).await;
        }
    }

    /// Fetch the job's raw result content.
    ///
    /// Valid only once the last observed status is terminal: `Completed`
    /// requires the output-file reference, `Failed` uses the error-file
    /// reference, and the other terminal states use whichever reference is
    /// present. A terminal job with no reference at all is a distinct,
    /// reportable condition, not an empty result.
    pub async fn retrieve_output(&self) -> Result<String> {
        let job_id = match (&self.job_id, self.status.is_terminal()) {
            (Some(id), true) => id.clone(),
            _ => {
                return Err(SheafError::InvalidState {
                    operation: "retrieve_output",
                    status: self.status.to_string(),
                })
            }
        };

        let file_id = match self.status {
            JobStatus::Completed => self.output_file_id.clone(),
            JobStatus::Failed => self.error_file_id.clone(),
            _ => self
                .output_file_id
                .clone()
                .or_else(|| self.error_file_id.clone()),
        };

        let Some(file_id) = file_id else {
            tracing::error!(job_id = %job_id, status = %self.status, "terminal batch has no result file");
            return Err(SheafError::ResultUnavailable(job_id));
        };

        tracing::info!(job_id = %job_id, file_id = %file_id, status = %self.status, "retrieving batch output");
        self.client.file_content(&file_id).await
    }

    /// Write the job id to a plain-text checkpoint file named by the
    /// submission timestamp, enabling out-of-process resumption.
    pub fn write_checkpoint(&self, dir: &Path) -> Result<PathBuf> {
        let job_id = self.job_id.as_deref().ok_or(SheafError::InvalidState {
            operation: "write_checkpoint",
            status: self.status.to_string(),
        })?;

        let stamp = self
            .submitted_at
            .unwrap_or_else(Utc::now)
            .format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("{stamp}_job.txt"));
        std::fs::write(&path, job_id)?;

        tracing::info!(path = %path.display(), job_id = %job_id, "wrote job checkpoint");
        Ok(path)
    }
}

/// Read a job id back from a checkpoint file.
pub fn read_checkpoint(path: &Path) -> Result<String> {
    Ok(std::fs::read_to_string(path)?.trim().to_string())
}

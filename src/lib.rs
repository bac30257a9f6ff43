//! Batch document-structuring pipeline.
//!
//! This crate submits large batches of document-structuring requests to a
//! remote LLM batch-completion service, tracks their asynchronous
//! completion, and persists inputs and outputs in object storage:
//! - Gathers raw document text from a bucket folder
//! - Builds one structured-extraction request entry per document
//! - Submits the entries as a single asynchronous batch job
//! - Polls the job to a terminal status and persists its raw output
//!
//! # Example
//! ```ignore
//! use sheaf::{BatchJob, DocumentSource, OpenAiClient, PollOptions, PromptBuilder, ResultSink};
//!
//! let source = DocumentSource::new(store.clone());
//! let documents = source.gather("raw_data").await?;
//!
//! let builder = PromptBuilder::new("gpt-4o-mini");
//! let entries = documents
//!     .iter()
//!     .map(|d| builder.build(&d.id, &d.content))
//!     .collect();
//!
//! let mut job = BatchJob::new(OpenAiClient::new(api_key), entries);
//! job.submit().await?;
//! job.await_completion(PollOptions::default()).await?;
//!
//! let output = job.retrieve_output().await?;
//! ResultSink::new(store, "batch_outputs")
//!     .store(job.job_id().unwrap(), &output)
//!     .await?;
//! ```

pub mod client;
pub mod config;
pub mod documents;
pub mod error;
pub mod ingest;
pub mod job;
pub mod prompt;
pub mod sink;
pub mod storage;

// Re-export commonly used types
pub use client::{BatchClient, FileHandle, MockBatchClient, OpenAiClient, RemoteBatch};
pub use config::Config;
pub use documents::{DocumentSource, RawDocument};
pub use error::{Result, SheafError};
pub use ingest::{DocxImporter, Manifest};
pub use job::{read_checkpoint, BatchJob, JobStatus, PollOptions};
pub use prompt::{BatchRequestEntry, PromptBuilder};
pub use sink::ResultSink;
pub use storage::{InMemoryStore, ObjectData, ObjectStore, S3Store};

use thiserror::Error;

/// Result type for sheaf operations.
pub type Result<T> = std::result::Result<T, SheafError>;

/// Errors that can occur in the batch pipeline.
#[derive(Debug, Error)]
pub enum SheafError {
    /// Batch submission failed: the entry set was empty, or the input-file
    /// upload / batch registration call failed. The job stays unsubmitted,
    /// so `submit` can be retried.
    #[error("Submission failed: {0}")]
    Submission(String),

    /// An operation was invoked outside its valid state
    #[error("Invalid state for {operation}: job is {status}")]
    InvalidState {
        operation: &'static str,
        status: String,
    },

    /// A terminal batch reported neither an output nor an error file
    #[error("No output or error file available for batch {0}")]
    ResultUnavailable(String),

    /// The remote service answered with a non-success status code
    #[error("Service error {status}: {body}")]
    Service { status: u16, body: String },

    /// The configured poll-attempt bound was exhausted before the job
    /// reached a terminal status
    #[error("Batch {job_id} not terminal after {attempts} polls")]
    PollLimit { job_id: String, attempts: usize },

    /// Object storage operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Missing or malformed configuration
    #[error("Config error: {0}")]
    Config(String),

    /// A docx archive could not be read
    #[error("Docx error: {0}")]
    Docx(String),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Local file I/O failed (checkpoint or manifest)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

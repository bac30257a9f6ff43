//! Result sink: persists raw batch output into object storage.

use chrono::Utc;

use crate::error::Result;
use crate::storage::ObjectStore;

/// Writes batch outputs under a dedicated folder, one timestamp-qualified
/// artifact per retrieval. Outputs are append-only history; nothing is
/// overwritten.
pub struct ResultSink<S> {
    storage: S,
    folder: String,
}

impl<S: ObjectStore> ResultSink<S> {
    pub fn new(storage: S, folder: impl Into<String>) -> Self {
        Self {
            storage,
            folder: folder.into(),
        }
    }

    /// Persist the raw output of a batch job verbatim.
    ///
    /// The content type is text/plain so the artifact renders inline in a
    /// browser instead of triggering a download. Returns the storage key.
    pub async fn store(&self, job_id: &str, content: &str) -> Result<String> {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let key = format!("{}/{}_{}.jsonl", self.folder, stamp, job_id);

        self.storage
            .put(&key, content.as_bytes().to_vec(), "text/plain")
            .await?;

        tracing::info!(key = %key, bytes = content.len(), "stored batch output");
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryStore, ObjectData};

    #[tokio::test]
    async fn test_store_writes_timestamped_plain_text() {
        let store = InMemoryStore::new();
        let sink = ResultSink::new(store.clone(), "batch_outputs");

        let key = sink.store("batch-42", "line1\nline2\n").await.unwrap();

        assert!(key.starts_with("batch_outputs/"));
        assert!(key.ends_with("_batch-42.jsonl"));
        assert_eq!(store.content_type(&key).as_deref(), Some("text/plain"));
        assert_eq!(
            store.get(&key).await.unwrap(),
            Some(ObjectData::Text("line1\nline2\n".to_string()))
        );
    }

    #[tokio::test]
    async fn test_repeated_stores_are_distinct_artifacts() {
        let store = InMemoryStore::new();
        let sink = ResultSink::new(store.clone(), "batch_outputs");

        sink.store("batch-42", "first").await.unwrap();
        sink.store("batch-42", "second").await.unwrap();

        // Both artifacts survive unless the clock lands on the same second;
        // at minimum the newest content is present.
        let keys = store.list("batch_outputs").await.unwrap();
        assert!(!keys.is_empty());
        let newest = format!("batch_outputs/{}", keys.last().unwrap());
        assert_eq!(
            store.get(&newest).await.unwrap(),
            Some(ObjectData::Text("second".to_string()))
        );
    }
}

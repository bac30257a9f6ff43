//! Document source: enumerates raw documents in object storage and yields
//! their text for batch building.

use crate::error::Result;
use crate::storage::{ObjectData, ObjectStore};

/// A read-only snapshot of one raw document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    /// Identifier, unique within its folder. Doubles as the batch custom_id,
    /// so results can be reconciled back to the source.
    pub id: String,
    /// The document's full text.
    pub content: String,
}

/// Read-only view over the raw documents stored under a logical folder.
pub struct DocumentSource<S> {
    store: S,
}

impl<S: ObjectStore> DocumentSource<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// List the document identifiers available under a folder.
    pub async fn list(&self, folder: &str) -> Result<Vec<String>> {
        self.store.list(folder).await
    }

    /// Fetch one document's text.
    ///
    /// `None` when the object is missing or does not decode as text; callers
    /// omit such documents from the batch instead of aborting the build.
    pub async fn fetch(&self, id: &str, folder: &str) -> Result<Option<String>> {
        let key = format!("{folder}/{id}");
        match self.store.get(&key).await? {
            Some(ObjectData::Text(text)) => Ok(Some(text)),
            Some(_) => {
                tracing::warn!(key = %key, "object is not text, skipping");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Gather every readable document under a folder.
    ///
    /// Unreadable documents are logged and skipped, so a single missing
    /// object cannot abort a batch build.
    pub async fn gather(&self, folder: &str) -> Result<Vec<RawDocument>> {
        let ids = self.list(folder).await?;
        let mut documents = Vec::with_capacity(ids.len());
        for id in ids {
            match self.fetch(&id, folder).await? {
                Some(content) => documents.push(RawDocument { id, content }),
                None => {
                    tracing::warn!(id = %id, folder = %folder, "document unavailable, omitted from batch");
                }
            }
        }
        tracing::info!(folder = %folder, count = documents.len(), "gathered documents");
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;

    #[tokio::test]
    async fn test_gather_skips_unreadable_documents() {
        let store = InMemoryStore::new();
        store
            .put("raw/a.txt", b"alpha".to_vec(), "text/plain")
            .await
            .unwrap();
        store
            .put("raw/b.txt", b"beta".to_vec(), "text/plain")
            .await
            .unwrap();
        // Not valid UTF-8: decodes as bytes and must be omitted.
        store
            .put("raw/c.bin", vec![0x00, 0x9f, 0x92], "application/octet-stream")
            .await
            .unwrap();

        let source = DocumentSource::new(store);
        let documents = source.gather("raw").await.unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].id, "a.txt");
        assert_eq!(documents[0].content, "alpha");
        assert_eq!(documents[1].id, "b.txt");
    }

    #[tokio::test]
    async fn test_fetch_missing_is_none() {
        let source = DocumentSource::new(InMemoryStore::new());
        assert!(source.fetch("ghost.txt", "raw").await.unwrap().is_none());
    }
}

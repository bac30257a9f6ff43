//! Manifest-driven download of source documents into the raw-data folder.
//!
//! The manifest is a headerless list of `id,site,url` records naming the
//! `.docx` files to fetch. Each document's extracted text is stored as
//! `{raw_folder}/{site}/{id}.txt`.

use crate::error::{Result, SheafError};
use crate::ingest::docx;
use crate::storage::ObjectStore;

/// One manifest record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub id: String,
    pub site: String,
    pub url: String,
}

/// Parsed download manifest.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Parse headerless `id,site,url` records, one per line.
    ///
    /// The URL is everything after the second comma, so query strings
    /// containing commas survive. Blank lines are ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let mut entries = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut parts = line.splitn(3, ',');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(id), Some(site), Some(url)) if !id.is_empty() && !url.is_empty() => {
                    entries.push(ManifestEntry {
                        id: id.trim().to_string(),
                        site: site.trim().to_string(),
                        url: url.trim().to_string(),
                    });
                }
                _ => {
                    return Err(SheafError::Config(format!(
                        "manifest line {} is not an 'id,site,url' record",
                        line_no + 1
                    )))
                }
            }
        }
        Ok(Self { entries })
    }
}

/// Downloads `.docx` documents and stores their extracted text.
pub struct DocxImporter<S> {
    http: reqwest::Client,
    storage: S,
    raw_folder: String,
}

impl<S: ObjectStore> DocxImporter<S> {
    pub fn new(storage: S, raw_folder: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            storage,
            raw_folder: raw_folder.into(),
        }
    }

    /// Import every manifest entry.
    ///
    /// A failing entry is logged and skipped so one broken URL cannot abort
    /// the whole import. Returns the number of documents stored.
    pub async fn import(&self, manifest: &Manifest) -> Result<usize> {
        let mut stored = 0;
        for entry in &manifest.entries {
            match self.import_one(entry).await {
                Ok(key) => {
                    stored += 1;
                    tracing::info!(id = %entry.id, key = %key, "document ingested");
                }
                Err(e) => {
                    tracing::error!(
                        id = %entry.id,
                        url = %entry.url,
                        error = %e,
                        "failed to ingest document, skipping"
                    );
                }
            }
        }
        tracing::info!(
            stored = stored,
            total = manifest.entries.len(),
            "manifest import finished"
        );
        Ok(stored)
    }

    async fn import_one(&self, entry: &ManifestEntry) -> Result<String> {
        let response = self
            .http
            .get(&entry.url)
            .send()
            .await?
            .error_for_status()?;
        let bytes = response.bytes().await?;

        let text = docx::extract_text(&bytes)?;
        let key = format!("{}/{}/{}.txt", self.raw_folder, entry.site, entry.id);
        self.storage
            .put(&key, text.into_bytes(), "text/plain")
            .await?;
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::ingest::docx::sample_docx;
    use crate::storage::{InMemoryStore, ObjectData};

    #[test]
    fn test_parse_manifest_records() {
        let manifest = Manifest::parse(
            "A00388,FR,https://example.com/a.docx\n\nA00389,UK,https://example.com/b.docx?x=1,2\n",
        )
        .unwrap();

        assert_eq!(manifest.entries.len(), 2);
        assert_eq!(manifest.entries[0].id, "A00388");
        assert_eq!(manifest.entries[0].site, "FR");
        // Commas after the second separator belong to the URL.
        assert_eq!(
            manifest.entries[1].url,
            "https://example.com/b.docx?x=1,2"
        );
    }

    #[test]
    fn test_parse_rejects_short_records() {
        let err = Manifest::parse("A00388,FR\n").unwrap_err();
        assert!(matches!(err, SheafError::Config(_)));
    }

    #[tokio::test]
    async fn test_import_stores_text_and_skips_failures() {
        let server = MockServer::start().await;
        let docx_bytes = sample_docx(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body><w:p><w:r><w:t>Hello from docx</w:t></w:r></w:p></w:body></w:document>"#,
        );
        Mock::given(method("GET"))
            .and(path("/good.docx"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(docx_bytes))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing.docx"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let manifest = Manifest::parse(&format!(
            "A1,FR,{uri}/good.docx\nA2,FR,{uri}/missing.docx\n",
            uri = server.uri()
        ))
        .unwrap();

        let store = InMemoryStore::new();
        let importer = DocxImporter::new(store.clone(), "raw_data");
        let stored = importer.import(&manifest).await.unwrap();

        assert_eq!(stored, 1);
        assert_eq!(
            store.get("raw_data/FR/A1.txt").await.unwrap(),
            Some(ObjectData::Text("Hello from docx".to_string()))
        );
        assert_eq!(
            store.content_type("raw_data/FR/A1.txt").as_deref(),
            Some("text/plain")
        );
        assert!(store.get("raw_data/FR/A2.txt").await.unwrap().is_none());
    }
}

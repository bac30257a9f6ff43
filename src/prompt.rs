//! Prompt builder: turns a document's text into one structured-extraction
//! request entry for the batch API.
//!
//! Building is a pure function of (identifier, content) for a fixed builder
//! configuration, so re-running a crashed batch build produces byte-identical
//! entries.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Endpoint path every batch entry targets.
pub const COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Fixed instruction template for the structuring task. The document text is
/// interpolated verbatim after the template.
const STRUCTURING_INSTRUCTIONS: &str = "### Instructions:
1. Identify and structure the content according to the sections defined by headings (H1, H2, H3, H4).
2. For each section, create an object with the following fields:
   - **h_title**: The heading of the section.
   - **main_title**: The highest-level title for the article (typically H1).
   - **level**: The heading level (1 for H1, 2 for H2, etc.).
   - **content**: An array of content objects, where each object has:
     - **text**: The text content following the heading.
     - **url**: Set to null unless there is a URL associated with the text.
     - **urls**: Set to null unless there are multiple URLs associated with the text.
3. Group all related content under the appropriate heading levels.
4. Do not convert bullet points into JSON arrays; show them as text.
5. Ensure that all text following the headings is included in the correct \"content\" field.
6. Maintain the structure even when the text contains nested subsections.

### Text to convert:";

/// One role/content message pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// Requested response format for the completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

/// Body of one batch request entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub response_format: ResponseFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// One line of the newline-delimited batch request file.
///
/// `custom_id` equals the source document identifier verbatim, so each result
/// line maps back to exactly one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequestEntry {
    pub custom_id: String,
    pub method: String,
    pub url: String,
    pub body: RequestBody,
}

/// Builds batch request entries for a fixed model and sampling configuration.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl PromptBuilder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.2,
            max_tokens: Some(1000),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Build the request entry for one document.
    ///
    /// The document content is interpolated verbatim; it is assumed to be
    /// well-formed text with no control sequences.
    pub fn build(&self, id: &str, content: &str) -> BatchRequestEntry {
        let prompt = format!("{STRUCTURING_INSTRUCTIONS}\n\n{content}");
        BatchRequestEntry {
            custom_id: id.to_string(),
            method: "POST".to_string(),
            url: COMPLETIONS_PATH.to_string(),
            body: RequestBody {
                model: self.model.clone(),
                messages: vec![
                    Message {
                        role: "system".to_string(),
                        content: "You are a helpful assistant.".to_string(),
                    },
                    Message {
                        role: "user".to_string(),
                        content: prompt,
                    },
                ],
                temperature: self.temperature,
                response_format: ResponseFormat {
                    kind: "json_object".to_string(),
                },
                max_tokens: self.max_tokens,
            },
        }
    }
}

/// Render entries as the newline-delimited JSON upload payload.
pub fn to_jsonl(entries: &[BatchRequestEntry]) -> Result<String> {
    let mut payload = String::new();
    for entry in entries {
        payload.push_str(&serde_json::to_string(entry)?);
        payload.push('\n');
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_ids_are_the_input_identifiers() {
        let builder = PromptBuilder::new("test-model");
        let ids = ["doc-a.txt", "doc-b.txt", "doc-c.txt"];

        let entries: Vec<BatchRequestEntry> = ids
            .iter()
            .map(|id| builder.build(id, "some content"))
            .collect();

        let custom_ids: Vec<&str> = entries.iter().map(|e| e.custom_id.as_str()).collect();
        assert_eq!(custom_ids, ids);

        // Pairwise distinct
        for (i, a) in custom_ids.iter().enumerate() {
            for b in &custom_ids[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = PromptBuilder::new("test-model");
        let first = builder.build("doc.txt", "## Heading\nBody text");
        let second = builder.build("doc.txt", "## Heading\nBody text");

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_entry_shape() {
        let builder = PromptBuilder::new("test-model").with_max_tokens(None);
        let entry = builder.build("doc.txt", "content");

        assert_eq!(entry.method, "POST");
        assert_eq!(entry.url, COMPLETIONS_PATH);
        assert_eq!(entry.body.model, "test-model");
        assert_eq!(entry.body.messages.len(), 2);
        assert_eq!(entry.body.messages[0].role, "system");
        assert_eq!(entry.body.messages[1].role, "user");
        assert!(entry.body.messages[1].content.ends_with("content"));
        assert_eq!(entry.body.response_format.kind, "json_object");

        // max_tokens is omitted from the wire format when unset
        let line = serde_json::to_string(&entry).unwrap();
        assert!(!line.contains("max_tokens"));
    }

    #[test]
    fn test_to_jsonl_one_line_per_entry() {
        let builder = PromptBuilder::new("test-model");
        let entries = vec![
            builder.build("a.txt", "alpha"),
            builder.build("b.txt", "beta"),
        ];

        let payload = to_jsonl(&entries).unwrap();
        let lines: Vec<&str> = payload.lines().collect();
        assert_eq!(lines.len(), 2);

        let decoded: BatchRequestEntry = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(decoded, entries[0]);
    }
}

//! Object store gateway.
//!
//! This module defines the `ObjectStore` trait used by everything that reads
//! or writes durable artifacts, along with the file-extension conventions for
//! decoding fetched objects. Implementations:
//! - `S3Store` - production store backed by an S3 bucket
//! - `InMemoryStore` - test double with the same semantics

use std::io::Read;

use async_trait::async_trait;
use flate2::read::GzDecoder;

use crate::error::{Result, SheafError};

pub mod in_memory;
pub mod s3;

#[cfg(test)]
mod tests;

pub use in_memory::InMemoryStore;
pub use s3::S3Store;

/// Content decoded from a stored object, by file-extension convention.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectData {
    /// UTF-8 text (also the result of gunzipping a `*.gz` key)
    Text(String),
    /// Structured value decoded from a `*.json` key
    Json(serde_json::Value),
    /// Raw bytes, when no convention applies
    Bytes(Vec<u8>),
}

impl ObjectData {
    /// Extract the textual content, if this object decoded as text.
    pub fn into_text(self) -> Option<String> {
        match self {
            ObjectData::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Uniform get/put/delete/list operations against a bucketed key-value store.
///
/// Keys are `/`-separated, with the first segments acting as logical folders.
/// `get` returns `None` for absent keys rather than an error, so callers can
/// treat a missing document as "skip" instead of aborting.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List keys under a logical folder, with the folder prefix stripped.
    async fn list(&self, folder: &str) -> Result<Vec<String>>;

    /// Fetch and decode one object. `None` when the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<ObjectData>>;

    /// Durably write one object.
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<()>;

    /// Delete one object.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check whether a key exists.
    async fn exists(&self, key: &str) -> Result<bool>;
}

/// Decode fetched bytes according to the key's extension.
///
/// `*.gz` keys are gunzipped to text, `*.json` keys are parsed into a
/// structured value, anything else is returned as UTF-8 text when possible
/// and raw bytes otherwise.
pub(crate) fn decode(key: &str, bytes: Vec<u8>) -> Result<ObjectData> {
    if key.ends_with(".gz") {
        let mut text = String::new();
        GzDecoder::new(bytes.as_slice())
            .read_to_string(&mut text)
            .map_err(|e| SheafError::Storage(format!("gzip decode of '{key}' failed: {e}")))?;
        return Ok(ObjectData::Text(text));
    }

    if key.ends_with(".json") {
        return Ok(ObjectData::Json(serde_json::from_slice(&bytes)?));
    }

    match String::from_utf8(bytes) {
        Ok(text) => Ok(ObjectData::Text(text)),
        Err(e) => Ok(ObjectData::Bytes(e.into_bytes())),
    }
}

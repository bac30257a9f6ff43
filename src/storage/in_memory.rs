//! In-memory object store.
//!
//! Stores all objects in a concurrent HashMap. Objects are lost on drop, so
//! this implementation is only suitable for tests and local experiments.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{decode, ObjectData, ObjectStore};
use crate::error::Result;

#[derive(Clone)]
struct StoredObject {
    data: Vec<u8>,
    content_type: String,
}

/// In-memory implementation of the `ObjectStore` trait.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
}

impl InMemoryStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Content type recorded for a key. Test support.
    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects
            .read()
            .get(key)
            .map(|object| object.content_type.clone())
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn list(&self, folder: &str) -> Result<Vec<String>> {
        let prefix = format!("{}/", folder.trim_end_matches('/'));
        let objects = self.objects.read();
        let mut keys: Vec<String> = objects
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn get(&self, key: &str) -> Result<Option<ObjectData>> {
        let bytes = {
            let objects = self.objects.read();
            match objects.get(key) {
                Some(object) => object.data.clone(),
                None => return Ok(None),
            }
        };
        decode(key, bytes).map(Some)
    }

    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
        self.objects.write().insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.objects.write().remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.objects.read().contains_key(key))
    }
}

//! S3-backed object store.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use super::{decode, ObjectData, ObjectStore};
use crate::config::StorageConfig;
use crate::error::{Result, SheafError};

/// Production object store backed by an S3 bucket.
///
/// Stateless per call: no client-side caching, so concurrent reads and writes
/// to distinct keys from different jobs are naturally isolated.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    /// Build a store from explicit credentials and a bucket name.
    pub async fn new(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            "sheaf-config",
        );
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        tracing::info!(bucket = %config.bucket, region = %config.region, "object store initialized");

        Self {
            client: Client::new(&aws_config),
            bucket: config.bucket.clone(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list(&self, folder: &str) -> Result<Vec<String>> {
        let prefix = format!("{}/", folder.trim_end_matches('/'));
        let response = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(&prefix)
            .send()
            .await
            .map_err(|e| {
                SheafError::Storage(format!(
                    "list '{prefix}' failed: {}",
                    DisplayErrorContext(e)
                ))
            })?;

        let mut keys = Vec::new();
        for object in response.contents() {
            if let Some(name) = object.key().and_then(|key| key.strip_prefix(&prefix)) {
                if !name.is_empty() {
                    keys.push(name.to_string());
                }
            }
        }
        Ok(keys)
    }

    async fn get(&self, key: &str) -> Result<Option<ObjectData>> {
        let response = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                if err
                    .as_service_error()
                    .map(|e| e.is_no_such_key())
                    .unwrap_or(false)
                {
                    tracing::warn!(key = %key, bucket = %self.bucket, "object not found");
                    return Ok(None);
                }
                return Err(SheafError::Storage(format!(
                    "get '{key}' failed: {}",
                    DisplayErrorContext(err)
                )));
            }
        };

        let bytes = response.body.collect().await.map_err(|e| {
            SheafError::Storage(format!("reading body of '{key}' failed: {e}"))
        })?;
        decode(key, bytes.into_bytes().to_vec()).map(Some)
    }

    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                SheafError::Storage(format!("put '{key}' failed: {}", DisplayErrorContext(e)))
            })?;
        tracing::debug!(key = %key, bucket = %self.bucket, "object written");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                SheafError::Storage(format!(
                    "delete '{key}' failed: {}",
                    DisplayErrorContext(e)
                ))
            })?;
        tracing::info!(key = %key, bucket = %self.bucket, "object deleted");
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                if err
                    .as_service_error()
                    .map(|e| e.is_not_found())
                    .unwrap_or(false)
                {
                    Ok(false)
                } else {
                    Err(SheafError::Storage(format!(
                        "head '{key}' failed: {}",
                        DisplayErrorContext(err)
                    )))
                }
            }
        }
    }
}

use crate::backends::{ListQuery, ObjectMetadata, ObjectPage, ObjectStore, StorageError};
use crate::metrics_defs::{STORAGE_OPERATION_DURATION, STORAGE_OPERATIONS};
use crate::naming::shorten_key;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use shared::{counter, histogram};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

const CACHE_CONTROL: &str = "public, max-age=31536000";
const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListOptions {
    pub prefix: String,
    pub limit: Option<i32>,
    pub page_token: Option<String>,
}

/// A listed file as exposed by the API.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    pub date_modified: Option<DateTime<Utc>>,
    pub date_created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

/// Facade over the configured object store.
///
/// A bucket created with [`Bucket::uninitialized`] rejects every call with
/// [`StorageError::NotInitialized`] without touching the network.
#[derive(Clone)]
pub struct Bucket {
    store: Option<Arc<dyn ObjectStore>>,
}

impl Bucket {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Bucket { store: Some(store) }
    }

    pub fn uninitialized() -> Self {
        Bucket { store: None }
    }

    fn store(&self) -> Result<&dyn ObjectStore, StorageError> {
        self.store.as_deref().ok_or(StorageError::NotInitialized)
    }

    /// Serializes `content` and writes it to `key`. Returns the short name of the key.
    pub async fn upload_json<T>(&self, content: &T, key: &str) -> Result<String, StorageError>
    where
        T: Serialize + ?Sized,
    {
        let store = self.store()?;
        let data = Bytes::from(serde_json::to_vec(content)?);
        let metadata = ObjectMetadata {
            content_type: JSON_CONTENT_TYPE,
            cache_control: CACHE_CONTROL,
        };

        instrumented("upload", store.write(key, data, &metadata)).await?;
        Ok(shorten_key(key).to_string())
    }

    pub async fn download_json(&self, key: &str) -> Result<serde_json::Value, StorageError> {
        let store = self.store()?;
        let data = instrumented("download", store.read(key)).await?;
        Ok(serde_json::from_slice(&data)?)
    }

    pub async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let store = self.store()?;
        instrumented("exists", store.exists(key)).await
    }

    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let store = self.store()?;
        instrumented("delete", store.delete(key)).await
    }

    /// Lists one page of objects under `options.prefix` whose name matches
    /// `extension_pattern`. The pattern is not anchored.
    ///
    /// When more results are available, the continuation token is attached
    /// to every returned entry.
    pub async fn list_files(
        &self,
        options: &ListOptions,
        extension_pattern: &str,
    ) -> Result<Vec<FileEntry>, StorageError> {
        let store = self.store()?;
        let pattern = Regex::new(extension_pattern)?;

        let query = ListQuery {
            prefix: Some(options.prefix.clone()),
            page_size: options.limit,
            page_token: options.page_token.clone(),
        };
        let ObjectPage {
            objects,
            next_page_token,
        } = instrumented("list", store.list(&query)).await?;

        let entries = objects
            .into_iter()
            .filter(|object| pattern.is_match(&object.name))
            .map(|object| FileEntry {
                name: shorten_key(&object.name).to_string(),
                date_modified: object.updated,
                date_created: object.created,
                page_token: next_page_token.clone(),
            })
            .collect();

        Ok(entries)
    }
}

async fn instrumented<T, F>(operation: &'static str, fut: F) -> Result<T, StorageError>
where
    F: Future<Output = Result<T, StorageError>>,
{
    let start = Instant::now();
    let result = fut.await;

    let outcome = match &result {
        Ok(_) => "success",
        Err(StorageError::NotFound(_)) => "not_found",
        Err(e) => {
            tracing::warn!(operation, error = %e, "Storage operation failed");
            "error"
        }
    };
    counter!(STORAGE_OPERATIONS, "operation" => operation, "outcome" => outcome).increment(1);
    histogram!(STORAGE_OPERATION_DURATION, "operation" => operation)
        .record(start.elapsed().as_secs_f64());

    result
}

//! Storage of scenario and solution blobs.
//!
//! [`Bucket`] is the entry point used by the API. It delegates to an
//! [`ObjectStore`] backend selected from configuration with [`get_store`].

pub mod backends;
pub mod bucket;
pub mod config;
pub mod metrics_defs;
pub mod naming;

use backends::{FilesystemStore, GcsStore};
use config::StoreType;
use std::sync::Arc;

pub use backends::{ObjectStore, StorageError};
pub use bucket::{Bucket, FileEntry, ListOptions};

pub async fn get_store(config: &config::Config) -> Result<Arc<dyn ObjectStore>, StorageError> {
    match &config.r#type {
        StoreType::Filesystem { base_dir } => Ok(Arc::new(FilesystemStore::new(base_dir))),
        StoreType::Gcs {
            bucket,
            project_id,
            credentials,
        } => {
            let store = GcsStore::new(bucket, project_id.as_deref(), credentials.as_deref()).await?;
            Ok(Arc::new(store))
        }
    }
}

/// Builds the bucket facade. A missing or failing backend yields an
/// uninitialized bucket, so the server still starts and serves the
/// optimization endpoints.
pub async fn connect(config: Option<&config::Config>) -> Bucket {
    let Some(config) = config else {
        tracing::warn!("No storage backend configured, storage endpoints will fail");
        return Bucket::uninitialized();
    };

    match get_store(config).await {
        Ok(store) => Bucket::new(store),
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize storage backend");
            Bucket::uninitialized()
        }
    }
}

//! Object store backends holding the scenario and solution blobs.
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use google_cloud_auth::credentials::service_account;
use google_cloud_gax::error::rpc::Code;
use google_cloud_storage::client::{Storage, StorageControl};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

// Matches the page size the GCS list API applies when none is requested.
const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("storage bucket is not initialized")]
    NotInitialized,

    #[error("could not initialize storage backend: {0}")]
    Init(String),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid object key: {0}")]
    InvalidKey(String),

    #[error("invalid file pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GCS error: {0}")]
    Gcs(#[from] google_cloud_gax::error::Error),
}

/// Metadata attached to every written object.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectMetadata {
    pub content_type: &'static str,
    pub cache_control: &'static str,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListQuery {
    pub prefix: Option<String>,
    pub page_size: Option<i32>,
    pub page_token: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ObjectInfo {
    pub name: String,
    pub updated: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectPage {
    pub objects: Vec<ObjectInfo>,
    pub next_page_token: Option<String>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn write(
        &self,
        key: &str,
        data: Bytes,
        metadata: &ObjectMetadata,
    ) -> Result<(), StorageError>;

    async fn read(&self, key: &str) -> Result<Bytes, StorageError>;

    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Lists a single page of objects.
    async fn list(&self, query: &ListQuery) -> Result<ObjectPage, StorageError>;
}

/// Stores objects as files below a base directory. Intended for local
/// development; metadata such as cache-control is not persisted.
///
/// Keys with empty segments (`/2024-3-07/a.json`, `a//b.json`) are rejected
/// with [`StorageError::InvalidKey`], so listed names always match the keys
/// they were written under.
pub struct FilesystemStore {
    base_dir: PathBuf,
}

impl FilesystemStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        FilesystemStore {
            base_dir: base_dir.into(),
        }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        // Each segment maps to one path component. Empty segments, such as the
        // leading one of a key built from an empty prefix, cannot be stored
        // without colliding with the key that lacks them.
        let valid = key.split('/').all(|segment| {
            let mut components = Path::new(segment).components();
            matches!(
                (components.next(), components.next()),
                (Some(Component::Normal(_)), None)
            )
        });
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        Ok(self.base_dir.join(key))
    }
}

fn walk(base: &Path, dir: &Path, out: &mut Vec<(String, fs::Metadata)>) -> io::Result<()> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let metadata = entry.metadata()?;

        if metadata.is_dir() {
            walk(base, &path, out)?;
        } else if let Ok(relative) = path.strip_prefix(base) {
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            out.push((key, metadata));
        }
    }

    Ok(())
}

fn list_dir(base: &Path, query: &ListQuery) -> io::Result<ObjectPage> {
    let mut files = Vec::new();
    walk(base, base, &mut files)?;

    let prefix = query.prefix.as_deref().unwrap_or("");
    files.retain(|(key, _)| key.starts_with(prefix));
    files.sort_by(|a, b| a.0.cmp(&b.0));

    // The page token is the first key of the page to return.
    if let Some(token) = &query.page_token {
        files.retain(|(key, _)| key.as_str() >= token.as_str());
    }

    let page_size = query
        .page_size
        .and_then(|size| usize::try_from(size).ok())
        .filter(|size| *size > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE);

    let next_page_token = files.get(page_size).map(|(key, _)| key.clone());
    files.truncate(page_size);

    let objects = files
        .into_iter()
        .map(|(name, metadata)| ObjectInfo {
            name,
            updated: metadata.modified().ok().map(DateTime::<Utc>::from),
            created: metadata.created().ok().map(DateTime::<Utc>::from),
        })
        .collect();

    Ok(ObjectPage {
        objects,
        next_page_token,
    })
}

#[async_trait]
impl ObjectStore for FilesystemStore {
    async fn write(
        &self,
        key: &str,
        data: Bytes,
        _metadata: &ObjectMetadata,
    ) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &data).await?;

        tracing::debug!(path = %path.display(), bytes = data.len(), "Wrote object to filesystem");
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Bytes, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(contents) => Ok(Bytes::from(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, query: &ListQuery) -> Result<ObjectPage, StorageError> {
        let base = self.base_dir.clone();
        let query = query.clone();
        let page = tokio::task::spawn_blocking(move || list_dir(&base, &query))
            .await
            .map_err(|e| StorageError::Io(io::Error::other(e)))??;
        Ok(page)
    }
}

/// Google Cloud Storage backend.
pub struct GcsStore {
    // Fully qualified bucket name, `projects/_/buckets/<name>`.
    bucket: String,
    client: Storage,
    control: StorageControl,
}

impl GcsStore {
    pub async fn new(
        bucket: &str,
        project_id: Option<&str>,
        credentials: Option<&str>,
    ) -> Result<Self, StorageError> {
        let mut client_builder = Storage::builder();
        let mut control_builder = StorageControl::builder();

        if let Some(credentials) = credentials {
            let key: serde_json::Value = serde_json::from_str(credentials)
                .map_err(|e| StorageError::Init(format!("invalid storage credentials: {e}")))?;
            let credentials = service_account::Builder::new(key)
                .build()
                .map_err(|e| StorageError::Init(e.to_string()))?;

            client_builder = client_builder.with_credentials(credentials.clone());
            control_builder = control_builder.with_credentials(credentials);
        }

        let client = client_builder
            .build()
            .await
            .map_err(|e| StorageError::Init(e.to_string()))?;
        let control = control_builder
            .build()
            .await
            .map_err(|e| StorageError::Init(e.to_string()))?;

        tracing::info!(bucket, project_id, "Initialized GCS object store");

        Ok(GcsStore {
            bucket: format!("projects/_/buckets/{bucket}"),
            client,
            control,
        })
    }
}

fn is_not_found(error: &google_cloud_gax::error::Error) -> bool {
    error.http_status_code() == Some(404)
        || error
            .status()
            .is_some_and(|status| status.code == Code::NotFound)
}

fn to_datetime(ts: &google_cloud_wkt::Timestamp) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts.seconds(), u32::try_from(ts.nanos()).unwrap_or(0))
}

#[async_trait]
impl ObjectStore for GcsStore {
    async fn write(
        &self,
        key: &str,
        data: Bytes,
        metadata: &ObjectMetadata,
    ) -> Result<(), StorageError> {
        self.client
            .write_object(&self.bucket, key, data)
            .set_content_type(metadata.content_type)
            .set_cache_control(metadata.cache_control)
            .send_unbuffered()
            .await?;
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Bytes, StorageError> {
        let mut reader = match self.client.read_object(&self.bucket, key).send().await {
            Ok(reader) => reader,
            Err(e) if is_not_found(&e) => return Err(StorageError::NotFound(key.to_string())),
            Err(e) => return Err(e.into()),
        };

        let mut contents = Vec::new();
        while let Some(chunk) = reader.next().await.transpose()? {
            contents.extend_from_slice(&chunk);
        }
        Ok(Bytes::from(contents))
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let result = self
            .control
            .get_object()
            .set_bucket(&self.bucket)
            .set_object(key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let result = self
            .control
            .delete_object()
            .set_bucket(&self.bucket)
            .set_object(key)
            .send()
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(e) if is_not_found(&e) => Err(StorageError::NotFound(key.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, query: &ListQuery) -> Result<ObjectPage, StorageError> {
        let mut request = self.control.list_objects().set_parent(&self.bucket);
        if let Some(prefix) = &query.prefix {
            request = request.set_prefix(prefix);
        }
        if let Some(page_size) = query.page_size {
            request = request.set_page_size(page_size);
        }
        if let Some(page_token) = &query.page_token {
            request = request.set_page_token(page_token);
        }

        let response = request.send().await?;

        let objects = response
            .objects
            .iter()
            .map(|object| ObjectInfo {
                name: object.name.clone(),
                updated: object.update_time.as_ref().and_then(to_datetime),
                created: object.create_time.as_ref().and_then(to_datetime),
            })
            .collect();

        let next_page_token = Some(response.next_page_token).filter(|token| !token.is_empty());

        Ok(ObjectPage {
            objects,
            next_page_token,
        })
    }
}

//! Scenario and solution blobs.
use crate::AppState;
use crate::error::ApiError;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use storage::naming::{Collection, shorten_key};
use storage::{FileEntry, ListOptions};

const JSON_FILE_PATTERN: &str = r"\.json";

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    prefix: Option<String>,
    starts_with: Option<String>,
    limit: Option<i32>,
    page_token: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct FilePath {
    #[serde(default)]
    date: Option<String>,
    name: String,
}

impl FilePath {
    fn key(&self, collection: Collection) -> String {
        collection.key(&self.name, self.date.as_deref())
    }
}

#[derive(Serialize)]
struct UploadResponse {
    message: &'static str,
    data: String,
}

/// Routes for one collection. The date segment of file paths is optional and
/// defaults to today.
pub fn routes(collection: Collection) -> Router<AppState> {
    let base = format!("/api/{}", collection.as_str());
    let file_routes = || {
        get(get_file)
            .post(create_file)
            .put(update_file)
            .delete(delete_file)
    };

    Router::new()
        .route(&base, get(list_files))
        .route(&format!("{base}/{{name}}"), file_routes())
        .route(&format!("{base}/{{date}}/{{name}}"), file_routes())
        .layer(Extension(collection))
}

fn list_options(collection: Collection, params: ListParams) -> ListOptions {
    // Only scenarios may be listed under a caller supplied prefix.
    let base = match collection {
        Collection::Scenarios => params.prefix.unwrap_or_else(|| collection.list_prefix()),
        Collection::Solutions => collection.list_prefix(),
    };

    ListOptions {
        prefix: format!("{base}{}", params.starts_with.as_deref().unwrap_or_default()),
        limit: params.limit,
        page_token: params.page_token,
    }
}

async fn list_files(
    State(state): State<AppState>,
    Extension(collection): Extension<Collection>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<FileEntry>>, ApiError> {
    let options = list_options(collection, params);
    let files = state.bucket.list_files(&options, JSON_FILE_PATTERN).await?;
    Ok(Json(files))
}

async fn get_file(
    State(state): State<AppState>,
    Extension(collection): Extension<Collection>,
    Path(path): Path<FilePath>,
) -> Result<Json<Value>, ApiError> {
    let key = path.key(collection);
    if !state.bucket.exists(&key).await? {
        return Err(ApiError::FileNotFound);
    }

    Ok(Json(state.bucket.download_json(&key).await?))
}

async fn create_file(
    State(state): State<AppState>,
    Extension(collection): Extension<Collection>,
    Path(path): Path<FilePath>,
    Json(content): Json<Value>,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let data = state.bucket.upload_json(&content, &path.key(collection)).await?;
    tracing::info!(collection = collection.as_str(), file = %data, "Uploaded file");

    let body = UploadResponse {
        message: "File uploaded successfully",
        data,
    };
    Ok((StatusCode::CREATED, Json(body)))
}

async fn update_file(
    State(state): State<AppState>,
    Extension(collection): Extension<Collection>,
    Path(path): Path<FilePath>,
    Json(content): Json<Value>,
) -> Result<Json<UploadResponse>, ApiError> {
    let data = state.bucket.upload_json(&content, &path.key(collection)).await?;
    tracing::info!(collection = collection.as_str(), file = %data, "Updated file");

    Ok(Json(UploadResponse {
        message: "File updated successfully",
        data,
    }))
}

async fn delete_file(
    State(state): State<AppState>,
    Extension(collection): Extension<Collection>,
    Path(path): Path<FilePath>,
) -> Result<String, ApiError> {
    let key = path.key(collection);
    if !state.bucket.exists(&key).await? {
        return Err(ApiError::FileNotFound);
    }

    state.bucket.delete(&key).await?;
    tracing::info!(collection = collection.as_str(), key = %key, "Deleted file");
    Ok(format!("File {} deleted", shorten_key(&key)))
}

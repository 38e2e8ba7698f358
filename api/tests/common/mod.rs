#![allow(dead_code)]

use api::AppState;
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use flate2::Compression;
use flate2::write::GzEncoder;
use http_body_util::BodyExt;
use optimization::status::RpcCode;
use optimization::{FleetRouting, OptimizeToursRequest, UpstreamError};
use serde_json::Value;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use storage::Bucket;
use storage::backends::FilesystemStore;
use tower::ServiceExt;

pub const MULTIPART_BOUNDARY: &str = "fleetroute-test-boundary";

pub fn basic_scenario() -> Value {
    serde_json::from_str(include_str!("../fixtures/basic_scenario.json")).unwrap()
}

pub fn basic_solution() -> Value {
    serde_json::from_str(include_str!("../fixtures/basic_solution.json")).unwrap()
}

/// Answers with the basic solution when sent the basic scenario, and with
/// `NOT_FOUND` otherwise. A configured error takes precedence.
pub struct StubFleetRouting {
    error: Option<UpstreamError>,
    calls: AtomicUsize,
}

impl StubFleetRouting {
    pub fn new() -> Self {
        StubFleetRouting {
            error: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: UpstreamError) -> Self {
        StubFleetRouting {
            error: Some(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FleetRouting for StubFleetRouting {
    async fn optimize_tours(&self, request: OptimizeToursRequest) -> Result<Value, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = &self.error {
            return Err(error.clone());
        }

        if serde_json::to_value(&request).unwrap() == basic_scenario() {
            Ok(basic_solution())
        } else {
            Err(UpstreamError::new(RpcCode::NotFound, "no solution for this scenario"))
        }
    }
}

pub fn app_with(bucket: Bucket, fleet_routing: Arc<StubFleetRouting>) -> Router {
    app_with_config(bucket, fleet_routing, &api::Config::default())
}

pub fn app_with_config(
    bucket: Bucket,
    fleet_routing: Arc<StubFleetRouting>,
    config: &api::Config,
) -> Router {
    let state = AppState {
        bucket,
        fleet_routing,
    };
    api::router(state, config)
}

pub fn app_with_stub(fleet_routing: Arc<StubFleetRouting>) -> Router {
    app_with(Bucket::uninitialized(), fleet_routing)
}

/// An app backed by a filesystem bucket in a temporary directory.
pub fn app_with_tempdir() -> (tempfile::TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    let bucket = Bucket::new(Arc::new(FilesystemStore::new(dir.path())));
    (dir, app_with(bucket, Arc::new(StubFleetRouting::new())))
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Builds a gzip-encoded optimization upload with a single form field.
pub fn gzip_upload(field_name: &str, payload: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    write!(
        body,
        "--{MULTIPART_BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field_name}\"; filename=\"scenario.json.gz\"\r\n\
         Content-Type: application/gzip\r\n\r\n"
    )
    .unwrap();
    body.extend_from_slice(payload);
    write!(body, "\r\n--{MULTIPART_BOUNDARY}--\r\n").unwrap();

    Request::builder()
        .method("POST")
        .uri("/api/optimization/fleet-routing/optimize-tours")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )
        .header("content-encoding", "gzip")
        .body(Body::from(body))
        .unwrap()
}

use crate::config::Config;
use crate::errors::UpstreamError;
use crate::request::OptimizeToursRequest;
use crate::status::RpcCode;
use async_trait::async_trait;
use google_cloud_auth::credentials::{Builder as CredentialsBuilder, CacheableResource, Credentials};
use http::{Extensions, HeaderMap, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// The remote optimization service.
#[async_trait]
pub trait FleetRouting: Send + Sync {
    async fn optimize_tours(&self, request: OptimizeToursRequest) -> Result<Value, UpstreamError>;
}

/// Calls the hosted fleet routing `optimizeTours` method over REST,
/// authenticated with Application Default Credentials.
///
/// No timeout is applied on top of the deadline enforced by the service.
pub struct CloudFleetRouting {
    client: reqwest::Client,
    endpoint: Url,
    project_id: Option<String>,
    // Credential lookup failures are reported on each call rather than at startup,
    // so the storage endpoints stay usable without optimization credentials.
    credentials: Result<Credentials, String>,
}

impl CloudFleetRouting {
    pub fn new(config: &Config) -> Self {
        let credentials = CredentialsBuilder::default()
            .with_scopes([CLOUD_PLATFORM_SCOPE])
            .build()
            .map_err(|e| e.to_string());

        if let Err(e) = &credentials {
            tracing::warn!(error = %e, "Could not load the default credentials for the optimization service");
        }

        CloudFleetRouting {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            project_id: config.project_id.clone(),
            credentials,
        }
    }

    fn method_url(&self, project_id: &str) -> Result<Url, UpstreamError> {
        let url = format!(
            "{}/v1/projects/{}:optimizeTours",
            self.endpoint.as_str().trim_end_matches('/'),
            project_id
        );
        Url::parse(&url).map_err(|e| UpstreamError::without_code(format!("invalid optimization URL: {e}")))
    }

    async fn auth_headers(&self) -> Result<HeaderMap, UpstreamError> {
        let credentials = self.credentials.as_ref().map_err(|e| {
            UpstreamError::new(
                RpcCode::Unauthenticated,
                format!("Could not load the default credentials: {e}"),
            )
        })?;

        match credentials.headers(Extensions::new()).await {
            Ok(CacheableResource::New { data, .. }) => Ok(data),
            Ok(CacheableResource::NotModified) => Err(UpstreamError::new(
                RpcCode::Unauthenticated,
                "UNAUTHENTICATED: credentials did not provide authorization headers",
            )),
            Err(e) => Err(UpstreamError::new(
                RpcCode::Unauthenticated,
                format!("UNAUTHENTICATED: {e}"),
            )),
        }
    }
}

#[async_trait]
impl FleetRouting for CloudFleetRouting {
    async fn optimize_tours(&self, request: OptimizeToursRequest) -> Result<Value, UpstreamError> {
        let project_id = self
            .project_id
            .as_deref()
            .ok_or_else(|| UpstreamError::without_code("optimization project id is not configured"))?;
        let url = self.method_url(project_id)?;
        let headers = self.auth_headers().await?;

        let mut body = serde_json::to_value(&request)
            .map_err(|e| UpstreamError::new(RpcCode::Internal, e.to_string()))?;
        // The parent is carried by the URL.
        if let Some(fields) = body.as_object_mut() {
            fields.remove("parent");
        }

        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(upstream_error_from_body(status, &bytes));
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            UpstreamError::new(
                RpcCode::Internal,
                format!("invalid response from optimization service: {e}"),
            )
        })
    }
}

fn transport_error(error: reqwest::Error) -> UpstreamError {
    let code = if error.is_timeout() {
        RpcCode::DeadlineExceeded
    } else {
        RpcCode::Unavailable
    };
    UpstreamError::new(code, error.to_string())
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    status: Option<String>,
}

/// Decodes a Google API error payload, `{"error": {"code", "message", "status"}}`.
pub(crate) fn upstream_error_from_body(status: StatusCode, body: &[u8]) -> UpstreamError {
    let fallback_code = RpcCode::from_http(status).map(|code| code as i32);

    match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let code = envelope
                .error
                .status
                .as_deref()
                .and_then(RpcCode::from_name)
                .map(|code| code as i32)
                .or(fallback_code);
            UpstreamError {
                code,
                message: envelope.error.message,
            }
        }
        Err(_) => {
            let text = String::from_utf8_lossy(body).trim().to_string();
            let message = if text.is_empty() {
                status.canonical_reason().unwrap_or("upstream error").to_string()
            } else {
                text
            };
            UpstreamError {
                code: fallback_code,
                message,
            }
        }
    }
}

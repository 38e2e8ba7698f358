use crate::AppState;
use crate::error::ApiError;
use axum::Json;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::HeaderMap;
use axum::http::header::CONTENT_ENCODING;
use bytes::Bytes;
use optimization::OptimizationError;
use optimization::decode::{GZIP_ENCODING, UPLOAD_FIELD, decode_gzip_json, decode_json};
use serde_json::Value;

fn is_gzip_encoded(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_ENCODING)
        .is_some_and(|value| value.as_bytes() == GZIP_ENCODING.as_bytes())
}

/// Largest decompressed size accepted for gzip uploads. Installed as a
/// request extension by the router.
#[derive(Clone, Copy, Debug)]
pub struct DecompressedLimit(pub usize);

/// Optimization request body in either accepted encoding.
///
/// With `content-encoding: gzip` the body is a multipart form whose `file`
/// field holds the compressed JSON document, which may not expand past the
/// configured body limit. Otherwise the body is plain JSON.
pub struct OptimizationPayload(pub Value);

impl<S> FromRequest<S> for OptimizationPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_gzip_encoded(req.headers()) {
            let bytes = Bytes::from_request(req, state).await?;
            return Ok(OptimizationPayload(decode_json(&bytes)?));
        }

        let limit = req
            .extensions()
            .get::<DecompressedLimit>()
            .map_or(crate::DEFAULT_MAX_BODY_BYTES, |limit| limit.0);

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|_| OptimizationError::InvalidGzipBody)?;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|_| OptimizationError::InvalidGzipBody)?
        {
            if field.name() == Some(UPLOAD_FIELD) {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| OptimizationError::InvalidGzipBody)?;
                return Ok(OptimizationPayload(decode_gzip_json(&bytes, limit)?));
            }
        }

        Err(OptimizationError::InvalidGzipBody.into())
    }
}

pub async fn optimize_tours(
    State(state): State<AppState>,
    OptimizationPayload(body): OptimizationPayload,
) -> Result<Json<Value>, ApiError> {
    let response = optimization::optimize_tours(state.fleet_routing.as_ref(), body).await?;
    Ok(Json(response))
}

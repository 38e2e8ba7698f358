use crate::status::RpcCode;
use thiserror::Error;

/// Error raised by the optimization service.
///
/// `code` is a gRPC status code or one of the service's validation error
/// codes. It is absent when the failure happened before a status was known.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct UpstreamError {
    pub code: Option<i32>,
    pub message: String,
}

impl UpstreamError {
    pub fn new(code: RpcCode, message: impl Into<String>) -> Self {
        UpstreamError {
            code: Some(code as i32),
            message: message.into(),
        }
    }

    pub fn without_code(message: impl Into<String>) -> Self {
        UpstreamError {
            code: None,
            message: message.into(),
        }
    }
}

/// Errors that can occur while handling an optimization request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimizationError {
    #[error("Invalid request body, expected a gzip-compressed JSON string")]
    InvalidGzipBody,

    #[error("Invalid request body, expected a JSON object")]
    InvalidJsonBody,

    #[error("Invalid request body, missing `model` property")]
    MissingModel,

    #[error("Invalid model, missing `shipments` property")]
    MissingShipments,

    #[error("Invalid model, missing `vehicles` property")]
    MissingVehicles,

    #[error("Invalid request body, {0}")]
    InvalidField(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

//! Wire encodings accepted for optimization requests.

use crate::errors::OptimizationError;
use flate2::read::GzDecoder;
use serde_json::Value;
use std::io::Read;

pub const GZIP_ENCODING: &str = "gzip";

/// Name of the multipart field carrying a compressed request.
pub const UPLOAD_FIELD: &str = "file";

/// Decompresses a gzip payload and parses it as UTF-8 JSON.
///
/// Payloads that expand to more than `max_len` bytes are rejected.
pub fn decode_gzip_json(bytes: &[u8], max_len: usize) -> Result<Value, OptimizationError> {
    let mut text = String::new();
    GzDecoder::new(bytes)
        .take(max_len as u64 + 1)
        .read_to_string(&mut text)
        .map_err(|_| OptimizationError::InvalidGzipBody)?;

    if text.len() > max_len {
        return Err(OptimizationError::InvalidGzipBody);
    }

    serde_json::from_str(&text).map_err(|_| OptimizationError::InvalidGzipBody)
}

pub fn decode_json(bytes: &[u8]) -> Result<Value, OptimizationError> {
    serde_json::from_slice(bytes).map_err(|_| OptimizationError::InvalidJsonBody)
}

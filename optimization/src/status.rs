//! Translation of optimization service failures into HTTP statuses.

use crate::errors::UpstreamError;
use http::StatusCode;
use std::ops::RangeInclusive;

/// gRPC status codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum RpcCode {
    Ok = 0,
    Cancelled = 1,
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    ResourceExhausted = 8,
    FailedPrecondition = 9,
    Aborted = 10,
    OutOfRange = 11,
    Unimplemented = 12,
    Internal = 13,
    Unavailable = 14,
    DataLoss = 15,
    Unauthenticated = 16,
}

const ALL_CODES: [RpcCode; 17] = [
    RpcCode::Ok,
    RpcCode::Cancelled,
    RpcCode::Unknown,
    RpcCode::InvalidArgument,
    RpcCode::DeadlineExceeded,
    RpcCode::NotFound,
    RpcCode::AlreadyExists,
    RpcCode::PermissionDenied,
    RpcCode::ResourceExhausted,
    RpcCode::FailedPrecondition,
    RpcCode::Aborted,
    RpcCode::OutOfRange,
    RpcCode::Unimplemented,
    RpcCode::Internal,
    RpcCode::Unavailable,
    RpcCode::DataLoss,
    RpcCode::Unauthenticated,
];

impl RpcCode {
    pub fn from_i32(code: i32) -> Option<Self> {
        ALL_CODES.into_iter().find(|c| *c as i32 == code)
    }

    /// Parses the canonical name used in JSON error payloads, e.g. `INVALID_ARGUMENT`.
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_CODES.into_iter().find(|c| c.name() == name)
    }

    pub const fn name(&self) -> &'static str {
        match self {
            RpcCode::Ok => "OK",
            RpcCode::Cancelled => "CANCELLED",
            RpcCode::Unknown => "UNKNOWN",
            RpcCode::InvalidArgument => "INVALID_ARGUMENT",
            RpcCode::DeadlineExceeded => "DEADLINE_EXCEEDED",
            RpcCode::NotFound => "NOT_FOUND",
            RpcCode::AlreadyExists => "ALREADY_EXISTS",
            RpcCode::PermissionDenied => "PERMISSION_DENIED",
            RpcCode::ResourceExhausted => "RESOURCE_EXHAUSTED",
            RpcCode::FailedPrecondition => "FAILED_PRECONDITION",
            RpcCode::Aborted => "ABORTED",
            RpcCode::OutOfRange => "OUT_OF_RANGE",
            RpcCode::Unimplemented => "UNIMPLEMENTED",
            RpcCode::Internal => "INTERNAL",
            RpcCode::Unavailable => "UNAVAILABLE",
            RpcCode::DataLoss => "DATA_LOSS",
            RpcCode::Unauthenticated => "UNAUTHENTICATED",
        }
    }

    /// Best guess of the gRPC code behind an HTTP status, for error payloads
    /// that do not name one.
    pub fn from_http(status: StatusCode) -> Option<Self> {
        let code = match status.as_u16() {
            400 => RpcCode::InvalidArgument,
            401 => RpcCode::Unauthenticated,
            403 => RpcCode::PermissionDenied,
            404 => RpcCode::NotFound,
            409 => RpcCode::Aborted,
            429 => RpcCode::ResourceExhausted,
            499 => RpcCode::Cancelled,
            500 => RpcCode::Internal,
            501 => RpcCode::Unimplemented,
            503 => RpcCode::Unavailable,
            504 => RpcCode::DeadlineExceeded,
            _ => return None,
        };
        Some(code)
    }
}

const STATUS_TABLE: &[(RpcCode, StatusCode)] = &[
    (RpcCode::InvalidArgument, StatusCode::BAD_REQUEST),
    (RpcCode::FailedPrecondition, StatusCode::BAD_REQUEST),
    (RpcCode::OutOfRange, StatusCode::BAD_REQUEST),
    (RpcCode::Unauthenticated, StatusCode::UNAUTHORIZED),
    (RpcCode::PermissionDenied, StatusCode::FORBIDDEN),
    (RpcCode::NotFound, StatusCode::NOT_FOUND),
    (RpcCode::AlreadyExists, StatusCode::CONFLICT),
    (RpcCode::Aborted, StatusCode::CONFLICT),
    (RpcCode::ResourceExhausted, StatusCode::TOO_MANY_REQUESTS),
    (RpcCode::Unknown, StatusCode::INTERNAL_SERVER_ERROR),
    (RpcCode::Internal, StatusCode::INTERNAL_SERVER_ERROR),
    (RpcCode::DataLoss, StatusCode::INTERNAL_SERVER_ERROR),
    (RpcCode::Unimplemented, StatusCode::NOT_IMPLEMENTED),
    (RpcCode::Unavailable, StatusCode::SERVICE_UNAVAILABLE),
    (RpcCode::DeadlineExceeded, StatusCode::GATEWAY_TIMEOUT),
];

/// Codes the optimization service reserves for request validation errors.
pub const VALIDATION_ERROR_CODES: RangeInclusive<i32> = 1000..=9999;

// Messages carrying these markers come from credential lookups and may
// describe the host environment; they are never returned to callers.
const CREDENTIAL_ERROR_MARKERS: &[&str] = &["default credentials", "UNAUTHENTICATED"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedStatus {
    pub status: StatusCode,
    pub body: Option<String>,
}

pub fn table_status(code: i32) -> Option<StatusCode> {
    let code = RpcCode::from_i32(code)?;
    STATUS_TABLE
        .iter()
        .find(|(rpc_code, _)| *rpc_code == code)
        .map(|(_, status)| *status)
}

pub fn map_upstream_error(error: &UpstreamError) -> MappedStatus {
    if CREDENTIAL_ERROR_MARKERS
        .iter()
        .any(|marker| error.message.contains(marker))
    {
        return MappedStatus {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: None,
        };
    }

    let status = match error.code {
        Some(code) => match table_status(code) {
            Some(status) => status,
            None if VALIDATION_ERROR_CODES.contains(&code) => StatusCode::BAD_REQUEST,
            None => StatusCode::INTERNAL_SERVER_ERROR,
        },
        None => StatusCode::INTERNAL_SERVER_ERROR,
    };

    MappedStatus {
        status,
        body: Some(error.message.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(code: Option<i32>, message: &str) -> UpstreamError {
        UpstreamError {
            code,
            message: message.into(),
        }
    }

    #[test]
    fn test_table_codes() {
        for (code, expected) in STATUS_TABLE {
            let mapped = map_upstream_error(&error(Some(*code as i32), "upstream failure"));
            assert_eq!(mapped.status, *expected, "code {}", code.name());
            assert_eq!(mapped.body.as_deref(), Some("upstream failure"));
        }

        let mapped = map_upstream_error(&error(Some(3), "bad shipment"));
        assert_eq!(mapped.status, StatusCode::BAD_REQUEST);
        let mapped = map_upstream_error(&error(Some(4), "too slow"));
        assert_eq!(mapped.status, StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_validation_codes() {
        for code in [1000, 2112, 9999] {
            let mapped = map_upstream_error(&error(Some(code), "invalid time window"));
            assert_eq!(mapped.status, StatusCode::BAD_REQUEST);
            assert_eq!(mapped.body.as_deref(), Some("invalid time window"));
        }
    }

    #[test]
    fn test_unknown_codes() {
        for code in [Some(0), Some(1), Some(17), Some(-1), Some(10_000), None] {
            let mapped = map_upstream_error(&error(code, "something broke"));
            assert_eq!(mapped.status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(mapped.body.as_deref(), Some("something broke"));
        }
    }

    #[test]
    fn test_credential_errors_are_swallowed() {
        let messages = [
            "Could not load the default credentials. Browse to https://cloud.google.com/docs/authentication",
            "16 UNAUTHENTICATED: Request had invalid authentication credentials",
        ];
        for message in messages {
            for code in [None, Some(3), Some(16), Some(2000)] {
                let mapped = map_upstream_error(&error(code, message));
                assert_eq!(
                    mapped,
                    MappedStatus {
                        status: StatusCode::INTERNAL_SERVER_ERROR,
                        body: None,
                    }
                );
            }
        }
    }

    #[test]
    fn test_rpc_code_names() {
        for code in ALL_CODES {
            assert_eq!(RpcCode::from_name(code.name()), Some(code));
            assert_eq!(RpcCode::from_i32(code as i32), Some(code));
        }
        assert_eq!(RpcCode::from_name("invalid_argument"), None);
        assert_eq!(RpcCode::from_i32(42), None);
        assert_eq!(
            RpcCode::from_http(StatusCode::GATEWAY_TIMEOUT),
            Some(RpcCode::DeadlineExceeded)
        );
        assert_eq!(RpcCode::from_http(StatusCode::IM_A_TEAPOT), None);
    }
}

use http::StatusCode;

use crate::code::{spec_of, ErrorCode};
use crate::model::ErrorObj;

/// Status carried by the error; unknown or out-of-range values fall back to 500.
pub fn to_http_status(err: &ErrorObj) -> StatusCode {
    StatusCode::from_u16(err.http_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Status registered for a code, without building an error.
pub fn status_of(code: ErrorCode) -> StatusCode {
    StatusCode::from_u16(spec_of(code).http_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

//! Shared response envelope types for API handlers.
//!
//! Every API response body is `{ "data": ... }`. Paginated listings put a
//! [`homestead_core::pagination::Page`] inside the envelope.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

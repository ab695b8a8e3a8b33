/**
 * Error Conversion
 *
 * Converts `AuthError` into HTTP responses so handlers can return it
 * directly with `?`.
 *
 * # Response Format
 *
 * All error responses share one JSON shape:
 * ```json
 * {
 *   "success": false,
 *   "message": "Name or password is incorrect"
 * }
 * ```
 */

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::types::AuthError;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 5xx details are logged here and never surfaced to the client.
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("internal error: {self}");
        } else {
            tracing::debug!("request failed ({}): {self}", status.as_u16());
        }

        let body = Json(json!({
            "success": false,
            "message": self.message(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_status() {
        let response = AuthError::locked("Account is locked").into_response();
        assert_eq!(response.status(), StatusCode::LOCKED);
    }

    #[test]
    fn test_internal_error_response_status() {
        let response = AuthError::internal("oops").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

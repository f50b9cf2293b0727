use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};

use eeroctl_core::ApiError;

/// Error returned by a route: a status plus a JSON body with an `error` message
#[derive(Debug)]
pub struct RouteError {
    status: StatusCode,
    body: Map<String, Value>,
}

impl RouteError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        let mut body = Map::new();
        body.insert("error".to_string(), Value::String(message.into()));
        Self { status, body }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unknown_profile(key: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("Unknown profile: {}", key))
    }

    /// Attach an extra field to the body, e.g. a hint or the profile key
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.body.insert(key.to_string(), value.into());
        self
    }

    #[cfg(test)]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ApiError> for RouteError {
    fn from(err: ApiError) -> Self {
        let status = match &err {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Auth(_) | ApiError::NotLoggedIn { .. } => StatusCode::UNAUTHORIZED,
            ApiError::InvalidInput(_) | ApiError::InvalidReference(_) => StatusCode::BAD_REQUEST,
            ApiError::PollTimeout { .. } => StatusCode::REQUEST_TIMEOUT,
            ApiError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::HttpStatus { status: 401, .. } => StatusCode::UNAUTHORIZED,
            ApiError::HttpStatus { .. } | ApiError::Transport { .. } => StatusCode::BAD_GATEWAY,
            ApiError::InvalidResponse { .. } | ApiError::Session(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err.to_string())
    }
}

/// Bodies that are missing, not JSON or the wrong shape keep axum's status
/// but are reported in the usual `{ "error": ... }` form
impl From<JsonRejection> for RouteError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        (self.status, Json(Value::Object(self.body))).into_response()
    }
}

/// Success body in the `{ success, message, ... }` shape the scheduler expects
pub fn success(message: impl Into<String>) -> Map<String, Value> {
    let mut body = Map::new();
    body.insert("success".to_string(), json!(true));
    body.insert("message".to_string(), Value::String(message.into()));
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Auth("x".into()), StatusCode::UNAUTHORIZED),
            (
                ApiError::NotLoggedIn { method: "GET", path: "/x".into() },
                StatusCode::UNAUTHORIZED,
            ),
            (ApiError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (
                ApiError::PollTimeout { profile: "Den".into(), attempts: 30 },
                StatusCode::REQUEST_TIMEOUT,
            ),
            (
                ApiError::HttpStatus {
                    method: "PUT",
                    path: "/x".into(),
                    status: 500,
                    message: "Internal Server Error".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(RouteError::from(err).status(), expected);
        }
    }
}

use thiserror::Error;

use crate::auth::SessionError;

/// Boxed source for transport failures, so the error stays constructible
/// without a live `reqwest` connection.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Auth(String),

    #[error("{method} failed, not logged in: {path}")]
    NotLoggedIn { method: &'static str, path: String },

    #[error("{method} error path: {path}. ERROR {source}")]
    Transport {
        method: &'static str,
        path: String,
        #[source]
        source: BoxError,
    },

    #[error("{method} failed to {path}. Response: {status} {message}")]
    HttpStatus {
        method: &'static str,
        path: String,
        status: u16,
        message: String,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("Timeout waiting for {profile} to be paused after {attempts} attempts")]
    PollTimeout { profile: String, attempts: u32 },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid resource reference: {0}")]
    InvalidReference(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid response from {path}: {message}")]
    InvalidResponse { path: String, message: String },

    #[error("Session storage error: {0}")]
    Session(#[from] SessionError),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// HTTP status carried by the error, if the remote answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_message_names_path_and_status() {
        let err = ApiError::HttpStatus {
            method: "GET",
            path: "/2.2/account".to_string(),
            status: 503,
            message: "Service Unavailable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "GET failed to /2.2/account. Response: 503 Service Unavailable"
        );
        assert_eq!(err.status(), Some(503));
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_is_unauthorized_only_for_401() {
        let unauthorized = ApiError::HttpStatus {
            method: "GET",
            path: "/x".to_string(),
            status: 401,
            message: "Unauthorized".to_string(),
        };
        assert!(unauthorized.is_unauthorized());

        let not_logged_in = ApiError::NotLoggedIn {
            method: "GET",
            path: "/x".to_string(),
        };
        assert!(!not_logged_in.is_unauthorized());
        assert_eq!(not_logged_in.status(), None);
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(ApiError::truncate_body("short"), "short");
        let long = "x".repeat(600);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.starts_with(&"x".repeat(500)));
        assert!(truncated.ends_with("(truncated, 600 total bytes)"));
    }
}

//! Error type for backend collaborator calls.

use serde::Deserialize;

/// Failure of a call to the backend (or an in-process stand-in for it).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connection, timeout).
    #[error("network error: {0}")]
    Network(String),
    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}: {}", shown_message(.message))]
    Http {
        status: u16,
        /// The `message` field of the error body, when present.
        message: Option<String>,
    },
    /// The response body did not have the expected shape.
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },
    /// The owning scope was closed before the call settled.
    #[error("request cancelled")]
    Cancelled,
}

/// The `{ "message": "..." }` body returned with non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiError {
    /// An `Http` error; a blank `message` is treated as absent.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        ApiError::Http {
            status,
            message: (!message.trim().is_empty()).then_some(message),
        }
    }

    /// Build an `Http` error from a raw response body, extracting `message` if it parses.
    pub(crate) fn from_body(status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty());
        ApiError::Http { status, message }
    }

    /// Map this error to an HTTP-style status code.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    /// Text suitable for showing to a user: the server's message verbatim when it sent one.
    /// Never empty.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Http {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            other => other.to_string(),
        }
    }
}

fn shown_message(message: &Option<String>) -> &str {
    match message.as_deref() {
        Some(message) if !message.trim().is_empty() => message,
        _ => "request failed",
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::Http {
                status: status.as_u16(),
                message: None,
            }
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_is_used_verbatim() {
        let err = ApiError::from_body(422, br#"{"message":"Session already started"}"#);
        assert_eq!(err.user_message(), "Session already started");
        assert_eq!(err.to_string(), "HTTP 422: Session already started");
        assert_eq!(err.status_code(), Some(422));
    }

    #[test]
    fn unparseable_body_falls_back_to_status() {
        let err = ApiError::from_body(500, b"<html>oops</html>");
        assert_eq!(
            err,
            ApiError::Http {
                status: 500,
                message: None
            }
        );
        assert_eq!(err.user_message(), "HTTP 500: request failed");
    }

    #[test]
    fn blank_messages_never_reach_the_user() {
        let err = ApiError::http(500, "");
        assert_eq!(
            err,
            ApiError::Http {
                status: 500,
                message: None
            }
        );
        assert_eq!(err.user_message(), "HTTP 500: request failed");

        let built = ApiError::Http {
            status: 502,
            message: Some("  ".into()),
        };
        assert_eq!(built.user_message(), "HTTP 502: request failed");
        let parsed = ApiError::from_body(422, br#"{"message":""}"#);
        assert_eq!(parsed.user_message(), "HTTP 422: request failed");
    }

    #[test]
    fn network_errors_have_no_status() {
        let err = ApiError::Network("connection refused".into());
        assert_eq!(err.status_code(), None);
        assert_eq!(err.user_message(), "network error: connection refused");
    }
}

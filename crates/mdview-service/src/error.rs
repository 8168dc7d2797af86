//! Error types for content fetching.

use std::path::PathBuf;

/// Error from fetching content.
///
/// `Display` is the normalized, human-readable message meant to be shown to
/// the user as is.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Server answered with an error status.
    #[error("{status} - {status_text} {detail}")]
    HttpResponse {
        /// HTTP status code.
        status: u16,
        /// Reason phrase for the status (may be empty).
        status_text: String,
        /// Detail extracted from the body (see [`FetchError::http_response`]).
        detail: String,
        /// Raw response body.
        body: String,
    },

    /// Request never produced a response (DNS, connection, TLS, ...).
    #[error("{0}")]
    Transport(String),

    /// Locator cannot be turned into something fetchable.
    #[error("invalid locator '{locator}': {reason}")]
    InvalidLocator {
        /// Locator as given by the caller.
        locator: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Local read failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Background fetch task did not complete.
    #[error("fetch task failed: {0}")]
    Task(String),
}

impl FetchError {
    /// Build an [`HttpResponse`](Self::HttpResponse) error, extracting the
    /// detail from `body`.
    ///
    /// The detail is the `error` field when the body is a JSON object that has
    /// one, the compact JSON re-serialization when the body is other JSON, and
    /// the raw body otherwise.
    pub fn http_response(status: u16, status_text: impl Into<String>, body: String) -> Self {
        Self::HttpResponse {
            status,
            status_text: status_text.into(),
            detail: body_detail(&body),
            body,
        }
    }

    pub(crate) fn invalid_locator(locator: &str, reason: impl Into<String>) -> Self {
        Self::InvalidLocator {
            locator: locator.to_owned(),
            reason: reason.into(),
        }
    }

    /// Normalized message, identical to the `Display` output.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// HTTP status, when the server answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpResponse { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<ureq::Error> for FetchError {
    fn from(err: ureq::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

fn body_detail(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => match map.get("error") {
            Some(serde_json::Value::String(message)) => message.clone(),
            Some(other) if !other.is_null() => other.to_string(),
            _ => serde_json::Value::Object(map).to_string(),
        },
        Ok(value) => value.to_string(),
        Err(_) => body.to_owned(),
    }
}

//! Error reporting for CLI commands.

use beatmanager_core::{Error, ErrorKind};
use tracing::error;

/// Structured error written to stderr when a command fails.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub message: String,
    /// Error category for programmatic handling.
    pub kind: ErrorKind,
    /// Whether the error can be retried.
    pub retryable: bool,
}

impl From<&Error> for ErrorResponse {
    fn from(e: &Error) -> Self {
        Self {
            message: e.to_string(),
            kind: e.kind(),
            retryable: e.is_retryable(),
        }
    }
}

/// Log `e` and render it as a JSON-encoded [`ErrorResponse`].
///
/// Falls back to the plain error message if serialization fails.
pub fn map_err(e: Error) -> String {
    error!(
        "Command error [kind={:?}, retryable={}]: {}",
        e.kind(),
        e.is_retryable(),
        e
    );

    let response = ErrorResponse::from(&e);
    serde_json::to_string(&response).unwrap_or_else(|_| e.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use beatmanager_core::{DownloadError, LibraryError};

    #[test]
    fn test_response_from_transfer_failure() {
        let e = Error::transfer_failed("https://example.com/a.zip", "connection reset");
        let response = ErrorResponse::from(&e);

        assert_eq!(response.kind, ErrorKind::TransferFailure);
        assert!(response.retryable);
        assert!(response.message.contains("connection reset"));
    }

    #[test]
    fn test_map_err_produces_json() {
        let e = Error::Library(LibraryError::SongNotFound {
            dir: "missing".to_string(),
        });
        let rendered = map_err(e);
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(value["kind"], "not_found");
        assert_eq!(value["retryable"], false);
        assert!(value["message"].as_str().unwrap().contains("missing"));
    }

    #[test]
    fn test_manifest_not_found_is_not_retryable() {
        let e = Error::Download(DownloadError::ManifestNotFound);
        let response = ErrorResponse::from(&e);
        assert_eq!(response.kind, ErrorKind::ManifestNotFound);
        assert!(!response.retryable);
    }
}

//! Error taxonomy for the Urban Topology HTTP boundary.
//!
//! Four terminal categories matter to callers: requests that were malformed
//! before any network call, targets the server does not know, requests the
//! server rejected as invalid, and everything else — which is transient and
//! eligible for retry. Row-level data damage is deliberately *not* an error;
//! see `urbangraph_core::builder::IngestReport`.

use thiserror::Error;

use urbangraph_core::GraphRequest;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors produced by the API client and load orchestrator.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed request shape (e.g. a polygon with fewer than 3 points).
    /// Never sent to the network.
    #[error("invalid request: {reason}")]
    InvalidRequest {
        /// What was wrong with the request.
        reason: String,
    },

    /// The target city or region does not exist server-side. Terminal,
    /// never retried.
    #[error("not found: {message}")]
    NotFound {
        /// Server-provided context.
        message: String,
    },

    /// The server rejected the request body (e.g. a malformed polygon).
    /// Terminal, never retried.
    #[error("bad request: {message}")]
    BadRequest {
        /// Server-provided context.
        message: String,
    },

    /// Network or server failure of any other kind. Retried up to the
    /// fixed retry budget, then surfaced.
    #[error("transient error: {message}")]
    Transient {
        /// Underlying failure description.
        message: String,
    },
}

impl ApiError {
    /// Only transient failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Transient { .. })
    }

    /// Classify an HTTP status into the taxonomy.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            404 => ApiError::NotFound { message },
            400 => ApiError::BadRequest { message },
            _ => ApiError::Transient { message },
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ApiError::from_status(status.as_u16(), err.to_string()),
            // Connect/timeout/decode failures carry no status.
            None => ApiError::Transient {
                message: err.to_string(),
            },
        }
    }
}

/// A failed graph load, carrying the originating request so diagnostics can
/// name the parameters and not just the error.
#[derive(Error, Debug)]
#[error("graph load failed for {request:?}: {source}")]
pub struct LoadError {
    /// The request that failed.
    pub request: GraphRequest,
    /// What went wrong.
    #[source]
    pub source: ApiError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification_matches_taxonomy() {
        assert!(matches!(
            ApiError::from_status(404, "no such city".into()),
            ApiError::NotFound { .. }
        ));
        assert!(matches!(
            ApiError::from_status(400, "bad polygon".into()),
            ApiError::BadRequest { .. }
        ));
        assert!(matches!(
            ApiError::from_status(500, "boom".into()),
            ApiError::Transient { .. }
        ));
        assert!(matches!(
            ApiError::from_status(503, "unavailable".into()),
            ApiError::Transient { .. }
        ));
    }

    #[test]
    fn only_transient_is_retryable() {
        assert!(ApiError::Transient { message: "x".into() }.is_retryable());
        assert!(!ApiError::NotFound { message: "x".into() }.is_retryable());
        assert!(!ApiError::BadRequest { message: "x".into() }.is_retryable());
        assert!(!ApiError::InvalidRequest { reason: "x".into() }.is_retryable());
    }

    #[test]
    fn load_error_display_names_the_request() {
        let err = LoadError {
            request: GraphRequest::Region {
                city_id: 1,
                region_id: 7,
            },
            source: ApiError::NotFound {
                message: "region 7".into(),
            },
        };
        let rendered = err.to_string();
        assert!(rendered.contains("region_id: 7"));
        assert!(rendered.contains("not found"));
    }
}

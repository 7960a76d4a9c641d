//! Transport-agnostic error payload shared by every adapter.
//!
//! Inbound adapters turn these into HTTP responses or WebSocket `error`
//! frames; outbound adapters never construct them directly and instead return
//! their port error enums, which services map here.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::TraceId;

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed or fails validation.
    InvalidRequest,
    /// Authentication failed or is missing.
    Unauthorized,
    /// The hosted backend could not be reached.
    ServiceUnavailable,
    /// An unexpected error occurred.
    InternalError,
}

/// Error payload returned to clients.
///
/// The trace identifier in scope at construction time is captured so the
/// payload correlates with the request logs.
///
/// # Examples
/// ```
/// use bookmark_backend::domain::{Error, ErrorCode};
///
/// let err = Error::invalid_request("Both URL and title are required.");
/// assert_eq!(err.code(), ErrorCode::InvalidRequest);
/// assert!(err.trace_id().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Error {
    #[schema(example = "invalid_request")]
    code: ErrorCode,
    #[schema(example = "Both URL and title are required.")]
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "trace_id")]
    trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl Error {
    /// Create a new error, capturing the current trace identifier if any.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            trace_id: TraceId::current().map(|id| id.to_string()),
            details: None,
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Correlation identifier, when one was in scope or attached.
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Supplementary structured details.
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Attach a trace identifier, replacing any captured one.
    pub fn with_trace_id(mut self, id: impl Into<String>) -> Self {
        self.trace_id = Some(id.into());
        self
    }

    /// Attach structured details to the error.
    ///
    /// # Examples
    /// ```
    /// use bookmark_backend::domain::Error;
    /// use serde_json::json;
    ///
    /// let err = Error::invalid_request("bad").with_details(json!({ "field": "url" }));
    /// assert!(err.details().is_some());
    /// ```
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Convenience constructor for [`ErrorCode::Unauthorized`].
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Convenience constructor for [`ErrorCode::ServiceUnavailable`].
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Client-facing error for a failed hosted backend call.
    ///
    /// A rejected session stays [`ErrorCode::Unauthorized`] so clients can
    /// sign in again. Every other failure is reported as
    /// [`ErrorCode::ServiceUnavailable`] with the given generic message.
    ///
    /// # Examples
    /// ```
    /// use bookmark_backend::domain::{Error, ErrorCode};
    ///
    /// let err = Error::backend_failure(ErrorCode::InternalError, "Failed to load bookmarks.");
    /// assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    /// ```
    pub fn backend_failure(cause: ErrorCode, message: impl Into<String>) -> Self {
        let code = match cause {
            ErrorCode::Unauthorized => ErrorCode::Unauthorized,
            _ => ErrorCode::ServiceUnavailable,
        };
        Self::new(code, message)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(Error::invalid_request("bad"), ErrorCode::InvalidRequest)]
    #[case(Error::unauthorized("who"), ErrorCode::Unauthorized)]
    #[case(Error::service_unavailable("down"), ErrorCode::ServiceUnavailable)]
    #[case(Error::internal("boom"), ErrorCode::InternalError)]
    fn constructors_set_code(#[case] error: Error, #[case] expected: ErrorCode) {
        assert_eq!(error.code(), expected);
    }

    #[rstest]
    #[case(ErrorCode::Unauthorized, ErrorCode::Unauthorized)]
    #[case(ErrorCode::InternalError, ErrorCode::ServiceUnavailable)]
    #[case(ErrorCode::ServiceUnavailable, ErrorCode::ServiceUnavailable)]
    fn backend_failures_collapse_to_two_codes(
        #[case] cause: ErrorCode,
        #[case] expected: ErrorCode,
    ) {
        assert_eq!(Error::backend_failure(cause, "generic").code(), expected);
    }

    #[tokio::test]
    async fn new_captures_trace_id_in_scope() {
        let trace_id: TraceId = "00000000-0000-0000-0000-000000000000"
            .parse()
            .expect("valid UUID");
        let error = TraceId::scope(trace_id, async { Error::internal("boom") }).await;
        assert_eq!(error.trace_id(), Some(trace_id.to_string().as_str()));
    }

    #[test]
    fn serialises_camel_case_and_skips_empty_fields() {
        let error = Error::invalid_request("bad").with_trace_id("abc");
        let value = serde_json::to_value(&error).expect("error serialises");
        assert_eq!(
            value,
            json!({ "code": "invalid_request", "message": "bad", "traceId": "abc" })
        );
    }

    #[test]
    fn accepts_snake_case_trace_id_alias() {
        let error: Error = serde_json::from_value(json!({
            "code": "unauthorized",
            "message": "login required",
            "trace_id": "xyz"
        }))
        .expect("error deserialises");
        assert_eq!(error.trace_id(), Some("xyz"));
    }
}

use crate::batch::BatchError;
use crate::sheets::SheetsError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Errors that end a request with an error response
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Missing required data: name, id, timestamp")]
    MissingFields,

    #[error("Invalid data format: Expected a non-empty list of entries")]
    InvalidBatch(#[source] BatchError),

    #[error("Could not connect to Google Sheets API")]
    SheetsUnavailable(#[source] SheetsError),

    #[error("Failed to append data: {0}")]
    AppendFailed(#[source] SheetsError),

    #[error("Failed to append bulk data: {0}")]
    BulkAppendFailed(#[source] SheetsError),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingFields | RelayError::InvalidBatch(_) => StatusCode::BAD_REQUEST,
            RelayError::SheetsUnavailable(_)
            | RelayError::AppendFailed(_)
            | RelayError::BulkAppendFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label for metrics tags.
    pub fn reason(&self) -> &'static str {
        match self {
            RelayError::MissingFields => "missing_fields",
            RelayError::InvalidBatch(_) => "invalid_batch",
            RelayError::SheetsUnavailable(_) => "unavailable",
            RelayError::AppendFailed(_) | RelayError::BulkAppendFailed(_) => "append_failed",
        }
    }
}

#[derive(Serialize)]
struct ApiErrorResponse {
    error: String,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, cause = ?std::error::Error::source(&self), "Request failed");
        } else {
            tracing::debug!(error = %self, "Rejected request");
        }

        let body = Json(ApiErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_status_codes() {
        assert_eq!(RelayError::MissingFields.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            RelayError::InvalidBatch(BatchError::Empty).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RelayError::SheetsUnavailable(SheetsError::CredentialsNotFound(PathBuf::from(
                "credentials.json"
            )))
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_reasons() {
        let unavailable = || SheetsError::CredentialsNotFound(PathBuf::from("credentials.json"));
        let cases = [
            (RelayError::MissingFields, "missing_fields"),
            (RelayError::InvalidBatch(BatchError::NotASequence), "invalid_batch"),
            (RelayError::SheetsUnavailable(unavailable()), "unavailable"),
            (RelayError::AppendFailed(unavailable()), "append_failed"),
            (RelayError::BulkAppendFailed(unavailable()), "append_failed"),
        ];
        for (err, reason) in cases {
            assert_eq!(err.reason(), reason, "{err}");
        }
    }

    #[test]
    fn test_messages_include_cause() {
        let err = RelayError::BulkAppendFailed(SheetsError::Api {
            status: StatusCode::TOO_MANY_REQUESTS,
            message: "Quota exceeded".into(),
        });
        assert_eq!(
            err.to_string(),
            "Failed to append bulk data: Sheets API returned 429 Too Many Requests: Quota exceeded"
        );

        // The connection error stays generic, the cause is only logged.
        let err = RelayError::SheetsUnavailable(SheetsError::CredentialsNotFound(
            PathBuf::from("credentials.json"),
        ));
        assert_eq!(err.to_string(), "Could not connect to Google Sheets API");
    }
}

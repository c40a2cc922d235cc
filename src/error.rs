use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// Network-level failure: unreachable backend, timeout, or a non-2xx
    /// response without a parseable body.
    #[error("Backend unreachable: {0}")]
    Transport(String),

    /// The backend answered but reported `success: false` (or an HTTP
    /// error with a structured body). Carries the backend's own message.
    #[error("{0}")]
    Backend(String),

    /// The response body did not match the expected shape.
    #[error("Malformed backend response: {0}")]
    Decode(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A create action was invoked while a previous one was still pending.
    #[error("A submission is already in progress")]
    SubmissionInFlight,

    #[error("Not found: {0}")]
    NotFound(String),
}

impl DashboardError {
    /// The message shown to the user in a notice. Backend-provided text is
    /// surfaced verbatim; transport and decode failures get a generic line
    /// with the diagnostic preserved for the logs.
    pub fn user_message(&self) -> String {
        match self {
            DashboardError::Transport(_) => "Backend unreachable, please retry".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = match &self {
            DashboardError::Transport(_) => StatusCode::BAD_GATEWAY,
            DashboardError::Backend(_) => StatusCode::BAD_GATEWAY,
            DashboardError::Decode(_) => StatusCode::BAD_GATEWAY,
            DashboardError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DashboardError::SubmissionInFlight => StatusCode::CONFLICT,
            DashboardError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}

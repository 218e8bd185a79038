//! HTTP mapping for [`GridError`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::GridError;

impl GridError {
    /// HTTP status reported for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Build(_) | Self::Icon(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::UnknownLayout { .. } => StatusCode::NOT_FOUND,
            Self::Execution(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GridError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "grid request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use gridshape_core::{BuildError, IconError};

    use super::*;

    #[test]
    fn maps_error_kinds_to_status() {
        assert_eq!(
            GridError::Build(BuildError::NoLayouts).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            GridError::Icon(IconError::NoMatchingRule {
                column: "s".to_string()
            })
            .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            GridError::UnknownLayout {
                id: "custom_x".to_string()
            }
            .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GridError::Execution(anyhow::anyhow!("db")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn body_carries_error_message() {
        let response = GridError::UnknownLayout {
            id: "custom_x".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"error": "unknown layout: custom_x"}));
    }
}

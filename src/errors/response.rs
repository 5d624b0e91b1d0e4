use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use crate::errors::{AppError, ProvisionError};
use crate::models::ApiResponse;

// Every failure leaves the panel as the same {success, message} envelope.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Auth(msg) => {
                tracing::debug!("Rejected request: {}", msg);
                (StatusCode::UNAUTHORIZED, msg.clone())
            }

            AppError::Validation(msg) => (StatusCode::OK, msg.clone()),

            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
            }

            AppError::Store(e) => {
                tracing::error!("Store error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
            }

            AppError::Provision(err) => convert_provision_error(err),
        };

        (status, Json(ApiResponse::<()>::failure(message))).into_response()
    }
}

// The panel frontend expects provisioning outcomes with a 200 status.
fn convert_provision_error(err: &ProvisionError) -> (StatusCode, String) {
    match err {
        ProvisionError::Provisioning(_) | ProvisionError::Persistence(_) => {
            tracing::error!("Create service failed: {}", err);
        }
        _ => tracing::info!("Create service rejected: {}", err),
    }
    (StatusCode::OK, err.user_message().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ConfigurationFault, StoreError};

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn provision_errors_render_as_unsuccessful_envelope() {
        let err = AppError::from(ProvisionError::InvalidConfiguration(
            ConfigurationFault::ServiceType("V2".into()),
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Invalid service type!");
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn persistence_error_hides_internal_cause() {
        let err = AppError::from(ProvisionError::Persistence(StoreError::NotUpdated(
            "42".into(),
        )));
        let body = body_json(err.into_response()).await;
        assert_eq!(body["message"], "Failed to update user info!");
    }

    #[tokio::test]
    async fn auth_errors_are_unauthorized() {
        let response = AppError::Auth("Not authenticated".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

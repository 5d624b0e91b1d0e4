use axum::{
    middleware::Next,
    response::{IntoResponse, Response},
    extract::Request,
    body::Body,
};
use tower_sessions::Session;
use crate::errors::AppError;
use crate::handlers::SESSION_USER_KEY;

const PROTECTED_PREFIX: &str = "/api/user/auth/";

pub async fn require_auth(
    session: Session,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !req.uri().path().starts_with(PROTECTED_PREFIX) {
        return next.run(req).await;
    }

    match session.get::<String>(SESSION_USER_KEY).await {
        Ok(Some(_)) => next.run(req).await,
        Ok(None) => AppError::Auth("Not authenticated".into()).into_response(),
        Err(e) => AppError::Auth(format!("Session error: {}", e)).into_response(),
    }
}

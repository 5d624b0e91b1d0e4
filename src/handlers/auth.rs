use axum::{
    extract::{Form, State},
    Json,
};
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower_sessions::Session;
use crate::errors::{AppError, AppResult};
use crate::models::{ApiResponse, LoginForm, ServiceState, SignupForm, User, UserStatus};
use crate::state::AppState;
use super::SESSION_USER_KEY;

pub async fn handle_signup(
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> AppResult<Json<ApiResponse<Value>>> {
    let username = form.username.trim().to_string();
    if username.is_empty() || form.password.is_empty() {
        return Err(AppError::Validation("Username and password are required!".into()));
    }
    if form.password != form.confirm_password {
        return Err(AppError::Validation("Passwords don't match!".into()));
    }

    let password_hash = hash(form.password.as_bytes(), state.bcrypt_cost)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        username,
        password_hash,
        status: UserStatus::Inactive,
        package_used: 0.0,
        package_limit: state.config.user.default_package_limit,
        expired: Utc::now().date_naive() + Duration::days(state.config.user.valid_days),
        service: ServiceState::Unprovisioned,
    };

    if !state.store.create_user(&user).await? {
        tracing::info!("Signup rejected, username taken: {}", user.username);
        return Err(AppError::Validation("Username already taken!".into()));
    }

    tracing::info!("Registered user {} ({})", user.username, user.id);
    Ok(Json(ApiResponse::success(
        "Registration successful!",
        json!({ "id": user.id, "username": user.username }),
    )))
}

pub async fn handle_login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> AppResult<Json<ApiResponse<Value>>> {
    let invalid = || AppError::Validation("Invalid username or password!".into());
    let username = form.username.trim();

    let user_id = state.store.find_user_id(username).await?.ok_or_else(|| {
        tracing::info!("Login for unknown user: {}", username);
        invalid()
    })?;
    let user = state.store.get_user(&user_id).await?.ok_or_else(invalid)?;

    let verified = verify(&form.password, &user.password_hash).unwrap_or_else(|e| {
        tracing::warn!("Password check failed for {}: {}", user.username, e);
        false
    });
    if !verified {
        tracing::info!("Invalid password for user: {}", user.username);
        return Err(invalid());
    }

    session
        .insert(SESSION_USER_KEY, user.id.clone())
        .await
        .map_err(|e| AppError::Internal(format!("Session error: {}", e)))?;

    tracing::info!("User {} logged in", user.username);
    Ok(Json(ApiResponse::success(
        "Login successful!",
        json!({ "id": user.id, "username": user.username }),
    )))
}

pub async fn handle_logout(session: Session) -> AppResult<Json<ApiResponse<()>>> {
    if let Err(e) = session.remove::<String>(SESSION_USER_KEY).await {
        tracing::warn!("Session removal error: {}", e);
    }
    Ok(Json(ApiResponse::message("Logged out!")))
}

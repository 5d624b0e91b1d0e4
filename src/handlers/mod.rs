mod auth;
mod panel;

pub use auth::{handle_signup, handle_login, handle_logout};
pub use panel::{panel_info, create_service};

use tower_sessions::Session;
use crate::errors::{AppError, AppResult};

pub const SESSION_USER_KEY: &str = "user_session";

/// Id of the signed-in user, from the session.
pub(crate) async fn session_user_id(session: &Session) -> AppResult<String> {
    session
        .get::<String>(SESSION_USER_KEY)
        .await
        .map_err(|e| AppError::Auth(format!("Session error: {}", e)))?
        .ok_or_else(|| AppError::Auth("Not authenticated".into()))
}

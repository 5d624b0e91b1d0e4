use axum::{
    extract::{Form, State},
    Json,
};
use serde::Serialize;
use tower_sessions::Session;
use crate::errors::AppResult;
use crate::models::{ApiResponse, CreateServiceForm, ServiceResult, ServiceType, UserInfo};
use crate::services::service_url;
use crate::state::AppState;
use super::session_user_id;

#[derive(Serialize, Debug)]
pub struct PanelData {
    #[serde(rename = "uInfo")]
    pub user_info: UserInfo,
    pub ss_methods: Vec<String>,
    pub ssr_methods: Vec<String>,
    pub servers: Vec<ServiceType>,
}

/// Builds the panel view for `user_id`, or `None` if the account is gone.
pub(crate) async fn load_panel(state: &AppState, user_id: &str) -> AppResult<Option<PanelData>> {
    let Some(user) = state.store.get_user(user_id).await? else {
        return Ok(None);
    };

    let host = &state.config.host.address;
    let url = user
        .service
        .provisioned()
        .map(|s| service_url(s.service_type, host, s.port, &s.method, &s.password));

    Ok(Some(PanelData {
        user_info: UserInfo::render(&user, host, state.catalog.default_method(), url),
        ss_methods: state.catalog.methods(ServiceType::Ss).to_vec(),
        ssr_methods: state.catalog.methods(ServiceType::Ssr).to_vec(),
        servers: state.catalog.service_types(),
    }))
}

pub async fn panel_info(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<ApiResponse<PanelData>>> {
    let user_id = session_user_id(&session).await?;

    match load_panel(&state, &user_id).await? {
        Some(data) => {
            tracing::debug!("Rendered panel for user {}", user_id);
            Ok(Json(ApiResponse::success("User info loaded!", data)))
        }
        None => {
            // Account removed while the session was still alive.
            tracing::warn!("User {} not found", user_id);
            Ok(Json(ApiResponse::failure("User has been removed!")))
        }
    }
}

pub async fn create_service(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CreateServiceForm>,
) -> AppResult<Json<ApiResponse<ServiceResult>>> {
    let user_id = session_user_id(&session).await?;
    tracing::info!(
        "Create service request from user {}: {} {}",
        user_id,
        form.server_type,
        form.method
    );

    let result = state
        .provisioner
        .create_service(&user_id, &form.server_type, &form.method)
        .await?;

    Ok(Json(ApiResponse::success("Service created!", result)))
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::integration_dto::{CreateIntegrationPayload, UpdateIntegrationPayload},
    error::{Error, Result},
    middleware::auth::Claims,
    AppState,
};

pub async fn list_integrations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let integrations = state.integration_service.list_for_user(user_id).await?;
    Ok(Json(integrations))
}

#[axum::debug_handler]
pub async fn create_integration(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateIntegrationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user_id = claims.user_id()?;
    let integration = state.integration_service.create(user_id, payload).await?;

    let response = json!({
        "message": "Integration created successfully",
        "integration": integration,
    });
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn get_integration(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let integration = state.integration_service.get(user_id, id).await?;
    Ok(Json(integration))
}

#[axum::debug_handler]
pub async fn update_integration(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateIntegrationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user_id = claims.user_id()?;
    let integration = state
        .integration_service
        .update(user_id, id, payload)
        .await?;

    let response = json!({
        "message": "Integration updated successfully",
        "integration": integration,
    });
    Ok(Json(response))
}

pub async fn delete_integration(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    state.integration_service.delete(user_id, id).await?;
    Ok(Json(json!({ "message": "Integration deleted successfully" })))
}

/// Runs the outbound connectivity probe for one integration. Probe failures
/// come back as 400 with a failed report body, mirroring how the management
/// UI distinguishes bad credentials from gateway faults.
pub async fn test_integration(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let integration = state.integration_service.get(user_id, id).await?;

    if !integration.is_active {
        return Err(Error::BadRequest("Integration is not active".to_string()));
    }

    let report = state.connectivity_service.test(&integration).await?;
    let status = if report.is_success() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(report)))
}

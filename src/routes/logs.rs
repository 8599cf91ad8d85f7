use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;

use crate::{error::Result, middleware::auth::Claims, AppState};

#[derive(Debug, serde::Deserialize, Default)]
#[serde(default)]
pub struct LogListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub service: Option<String>,
}

#[axum::debug_handler]
pub async fn list_webhook_logs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<LogListQuery>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let page = query.page.unwrap_or(1);
    let per_page = query.per_page.unwrap_or(20);

    let list = state
        .webhook_service
        .list(user_id, query.service, page, per_page)
        .await?;

    Ok(Json(json!({
        "logs": list.logs,
        "total": list.total,
        "pages": list.pages,
        "current_page": list.current_page,
    })))
}

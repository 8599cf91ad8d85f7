//! Ingestion endpoint set: one POST endpoint per supported service plus a
//! logger-only test endpoint. Per request the flow is
//! normalize -> log (always) -> route (best-effort). Internal faults after
//! the log attempt are absorbed so external senders see 200 and do not
//! retry-storm the gateway; only an unparseable body earns a 400.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::{error, warn};

use crate::{
    error::{Error, Result},
    models::webhook_log::LogStatus,
    webhooks::normalize::{normalize, ServiceKind},
    AppState,
};

pub async fn handle_service_webhook(
    State(state): State<AppState>,
    Path(service): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<JsonValue>)> {
    let Some(service) = ServiceKind::parse(&service) else {
        return Err(Error::NotFound(format!(
            "Unknown webhook service: {}",
            service
        )));
    };

    let event = match normalize(service, &body) {
        Ok(event) => event,
        Err(err) => {
            // Even rejected deliveries get an audit row; a failed log write
            // must not change the 400 the sender is about to receive.
            let context = json!({ "error": err.to_string() });
            if let Err(log_err) = state
                .webhook_service
                .record(
                    None,
                    service.as_str(),
                    "webhook_error",
                    context,
                    LogStatus::Failed,
                )
                .await
            {
                error!(
                    service = %service,
                    error = %log_err,
                    "Failed to record malformed webhook"
                );
            }
            return Err(err);
        }
    };

    // The one log write per delivery. Storage trouble is an operational
    // problem, not the sender's; report and move on.
    if let Err(log_err) = state
        .webhook_service
        .record(
            None,
            service.as_str(),
            &event.event_type,
            JsonValue::Object(event.payload.clone()),
            LogStatus::Success,
        )
        .await
    {
        error!(
            service = %service,
            event_type = %event.event_type,
            error = %log_err,
            "Failed to record webhook delivery"
        );
    }

    if let Err(handler_err) = state.webhook_router.dispatch(&event).await {
        warn!(
            service = %service,
            event_type = %event.event_type,
            error = %handler_err,
            "Webhook handler failed; acknowledging delivery anyway"
        );
        let context = json!({
            "error": handler_err.to_string(),
            "event_type": event.event_type,
        });
        if let Err(log_err) = state
            .webhook_service
            .record(
                None,
                service.as_str(),
                "handler_error",
                context,
                LogStatus::Failed,
            )
            .await
        {
            error!(service = %service, error = %log_err, "Failed to record handler failure");
        }
    }

    Ok((StatusCode::OK, Json(json!({ "status": "success" }))))
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct TestWebhookQuery {
    pub service: Option<String>,
}

/// Smoke-test endpoint: performs only the logger step and echoes the body.
/// Never touches the router.
pub async fn handle_test_webhook(
    State(state): State<AppState>,
    Query(query): Query<TestWebhookQuery>,
    body: Bytes,
) -> Result<Json<JsonValue>> {
    let service = query.service.unwrap_or_else(|| "test".to_string());

    let data: JsonValue = if body.iter().all(u8::is_ascii_whitespace) {
        JsonValue::Null
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| Error::MalformedPayload(format!("Invalid JSON body: {}", e)))?
    };

    let payload = match &data {
        JsonValue::Null => json!({}),
        other => other.clone(),
    };
    if let Err(log_err) = state
        .webhook_service
        .record(None, &service, "test_webhook", payload, LogStatus::Success)
        .await
    {
        error!(service = %service, error = %log_err, "Failed to record test webhook");
    }

    Ok(Json(json!({
        "status": "success",
        "message": "Test webhook received",
        "data": data,
    })))
}

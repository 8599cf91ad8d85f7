//! Per-event handlers wired into the default routing table. These are
//! best-effort, idempotent stubs: they acknowledge the event and surface the
//! interesting fields to operators; deeper business logic hangs off them.

use serde_json::{Map, Value as JsonValue};
use tracing::info;

use super::router::HandlerFuture;

fn field<'a>(payload: &'a Map<String, JsonValue>, key: &str) -> &'a str {
    payload.get(key).and_then(|v| v.as_str()).unwrap_or("unknown")
}

pub fn sms_message_status(payload: Map<String, JsonValue>) -> HandlerFuture {
    Box::pin(async move {
        info!(
            message_sid = field(&payload, "MessageSid"),
            status = field(&payload, "MessageStatus"),
            "SMS delivery status update"
        );
        Ok(())
    })
}

pub fn crm_contact_created(payload: Map<String, JsonValue>) -> HandlerFuture {
    Box::pin(async move {
        info!(contact_id = field(&payload, "contactId"), "New CRM contact created");
        Ok(())
    })
}

pub fn crm_contact_updated(payload: Map<String, JsonValue>) -> HandlerFuture {
    Box::pin(async move {
        info!(contact_id = field(&payload, "contactId"), "CRM contact updated");
        Ok(())
    })
}

pub fn crm_message_received(payload: Map<String, JsonValue>) -> HandlerFuture {
    Box::pin(async move {
        info!(
            conversation_id = field(&payload, "conversationId"),
            "New CRM conversation message"
        );
        Ok(())
    })
}

pub fn automation_a_new_lead(payload: Map<String, JsonValue>) -> HandlerFuture {
    Box::pin(async move {
        let email = payload
            .get("lead")
            .and_then(|l| l.get("email"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        info!(lead_email = email, "New lead from automation platform A");
        Ok(())
    })
}

pub fn automation_a_form_submission(payload: Map<String, JsonValue>) -> HandlerFuture {
    Box::pin(async move {
        let form = payload.get("form_data").cloned().unwrap_or(JsonValue::Null);
        info!(form = %form, "Form submission from automation platform A");
        Ok(())
    })
}

pub fn automation_b_contact_created(payload: Map<String, JsonValue>) -> HandlerFuture {
    Box::pin(async move {
        let email = payload
            .get("data")
            .and_then(|d| d.get("email"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        info!(contact_email = email, "New contact from automation platform B");
        Ok(())
    })
}

pub fn automation_b_automation_triggered(payload: Map<String, JsonValue>) -> HandlerFuture {
    Box::pin(async move {
        let data = payload.get("data").cloned().unwrap_or(JsonValue::Null);
        info!(data = %data, "Automation triggered on platform B");
        Ok(())
    })
}

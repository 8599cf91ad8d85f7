use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};

/// The four third-party services the gateway accepts webhooks from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    SmsVoiceProvider,
    CrmPlatform,
    AutomationPlatformA,
    AutomationPlatformB,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadEncoding {
    Form,
    Json,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 4] = [
        ServiceKind::SmsVoiceProvider,
        ServiceKind::CrmPlatform,
        ServiceKind::AutomationPlatformA,
        ServiceKind::AutomationPlatformB,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::SmsVoiceProvider => "sms_voice_provider",
            ServiceKind::CrmPlatform => "crm_platform",
            ServiceKind::AutomationPlatformA => "automation_platform_a",
            ServiceKind::AutomationPlatformB => "automation_platform_b",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "sms_voice_provider" => Some(ServiceKind::SmsVoiceProvider),
            "crm_platform" => Some(ServiceKind::CrmPlatform),
            "automation_platform_a" => Some(ServiceKind::AutomationPlatformA),
            "automation_platform_b" => Some(ServiceKind::AutomationPlatformB),
            _ => None,
        }
    }

    /// Wire encoding each service delivers webhooks in.
    pub fn encoding(&self) -> PayloadEncoding {
        match self {
            ServiceKind::SmsVoiceProvider => PayloadEncoding::Form,
            _ => PayloadEncoding::Json,
        }
    }

    /// Payload field carrying the event type for this service.
    pub fn discriminator(&self) -> &'static str {
        match self {
            ServiceKind::SmsVoiceProvider => "MessageStatus",
            ServiceKind::CrmPlatform => "type",
            ServiceKind::AutomationPlatformA => "event_type",
            ServiceKind::AutomationPlatformB => "trigger",
        }
    }
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized in-memory form of one inbound webhook, independent of the
/// source encoding. Consumed by the audit logger and the router, then dropped.
#[derive(Debug, Clone)]
pub struct CanonicalEvent {
    pub service: ServiceKind,
    pub event_type: String,
    pub payload: Map<String, JsonValue>,
    pub received_at: DateTime<Utc>,
}

/// Converts a raw request body into a canonical event.
///
/// Form bodies never fail: an empty or discriminator-less body degrades to
/// event type "unknown". JSON bodies must be a non-empty JSON object; an
/// empty body is distinct from a valid empty object `{}` and is rejected.
pub fn normalize(service: ServiceKind, body: &[u8]) -> Result<CanonicalEvent> {
    let payload = match service.encoding() {
        PayloadEncoding::Form => parse_form(body),
        PayloadEncoding::Json => parse_json(body)?,
    };

    let event_type = payload
        .get(service.discriminator())
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_string();

    Ok(CanonicalEvent {
        service,
        event_type,
        payload,
        received_at: Utc::now(),
    })
}

fn parse_form(body: &[u8]) -> Map<String, JsonValue> {
    let mut map = Map::new();
    for (key, value) in url::form_urlencoded::parse(body) {
        map.insert(key.into_owned(), JsonValue::String(value.into_owned()));
    }
    map
}

fn parse_json(body: &[u8]) -> Result<Map<String, JsonValue>> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(Error::MalformedPayload("No data received".to_string()));
    }
    let value: JsonValue = serde_json::from_slice(body)
        .map_err(|e| Error::MalformedPayload(format!("Invalid JSON body: {}", e)))?;
    match value {
        JsonValue::Object(map) => Ok(map),
        other => Err(Error::MalformedPayload(format!(
            "Expected a JSON object, got {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn form_body_extracts_message_status() {
        let event = normalize(
            ServiceKind::SmsVoiceProvider,
            b"MessageStatus=delivered&MessageSid=SM123",
        )
        .expect("form bodies never fail");
        assert_eq!(event.event_type, "delivered");
        assert_eq!(event.payload["MessageSid"], json!("SM123"));
    }

    #[test]
    fn empty_form_body_degrades_to_unknown() {
        let event = normalize(ServiceKind::SmsVoiceProvider, b"").unwrap();
        assert_eq!(event.event_type, "unknown");
        assert!(event.payload.is_empty());
    }

    #[test]
    fn empty_json_body_is_malformed() {
        for body in [&b""[..], b"   \n"] {
            let err = normalize(ServiceKind::CrmPlatform, body).unwrap_err();
            assert!(matches!(err, Error::MalformedPayload(_)), "{:?}", err);
        }
    }

    #[test]
    fn invalid_json_body_is_malformed() {
        let err = normalize(ServiceKind::AutomationPlatformB, b"{not json").unwrap_err();
        assert!(matches!(err, Error::MalformedPayload(_)));
    }

    #[test]
    fn non_object_json_body_is_malformed() {
        let err = normalize(ServiceKind::AutomationPlatformA, b"[1,2,3]").unwrap_err();
        assert!(matches!(err, Error::MalformedPayload(_)));
    }

    #[test]
    fn valid_empty_object_is_unknown_event() {
        let event = normalize(ServiceKind::CrmPlatform, b"{}").unwrap();
        assert_eq!(event.event_type, "unknown");
        assert!(event.payload.is_empty());
    }

    #[test]
    fn discriminator_varies_per_service() {
        let crm = normalize(ServiceKind::CrmPlatform, br#"{"type":"ContactCreate"}"#).unwrap();
        assert_eq!(crm.event_type, "ContactCreate");

        let a = normalize(
            ServiceKind::AutomationPlatformA,
            br#"{"event_type":"new_lead"}"#,
        )
        .unwrap();
        assert_eq!(a.event_type, "new_lead");

        let b = normalize(
            ServiceKind::AutomationPlatformB,
            br#"{"trigger":"contact_created"}"#,
        )
        .unwrap();
        assert_eq!(b.event_type, "contact_created");
    }

    #[test]
    fn non_string_discriminator_degrades_to_unknown() {
        let event = normalize(ServiceKind::CrmPlatform, br#"{"type": 42}"#).unwrap();
        assert_eq!(event.event_type, "unknown");
        assert_eq!(event.payload["type"], json!(42));
    }

    #[test]
    fn service_names_round_trip() {
        for kind in ServiceKind::ALL {
            assert_eq!(ServiceKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ServiceKind::parse("telegram"), None);
    }
}

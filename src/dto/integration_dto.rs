use serde::Deserialize;
use serde_json::Value as JsonValue;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateIntegrationPayload {
    #[validate(length(min = 1, max = 64))]
    pub service_name: String,
    #[validate(length(min = 1, max = 255))]
    pub display_name: String,
    #[validate(url)]
    pub webhook_url: Option<String>,
    pub is_active: Option<bool>,
    pub config_data: Option<JsonValue>,
}

#[derive(Debug, Deserialize, Validate, Default)]
#[serde(default)]
pub struct UpdateIntegrationPayload {
    #[validate(length(min = 1, max = 255))]
    pub display_name: Option<String>,
    #[validate(url)]
    pub webhook_url: Option<String>,
    pub is_active: Option<bool>,
    pub config_data: Option<JsonValue>,
}

use crate::error::{Error, Result};
use crate::models::integration::Integration;
use crate::webhooks::normalize::ServiceKind;
use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

/// Outcome of an outbound credential/connectivity probe.
#[derive(Debug, Clone, Serialize)]
pub struct TestReport {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestReport {
    fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: message.into(),
            error: None,
        }
    }

    fn failed(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: "failed",
            message: message.into(),
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Verifies stored integration credentials against the third-party service.
/// All probes share one bounded HTTP client so a dead remote cannot hold a
/// request open indefinitely.
#[derive(Clone)]
pub struct ConnectivityService {
    client: Client,
}

impl ConnectivityService {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client for connectivity tests");
        Self { client }
    }

    pub async fn test(&self, integration: &Integration) -> Result<TestReport> {
        let service = ServiceKind::parse(&integration.service_name).ok_or_else(|| {
            Error::BadRequest(format!(
                "Unknown service type: {}",
                integration.service_name
            ))
        })?;

        info!(
            integration_id = %integration.id,
            service = %service,
            "Running connectivity test"
        );

        match service {
            ServiceKind::SmsVoiceProvider => self.test_sms_provider(integration).await,
            ServiceKind::CrmPlatform => self.test_crm(integration).await,
            ServiceKind::AutomationPlatformA | ServiceKind::AutomationPlatformB => {
                self.test_automation_webhook(integration).await
            }
        }
    }

    /// Fetches the provider account resource with basic auth built from the
    /// stored account_sid/auth_token pair.
    async fn test_sms_provider(&self, integration: &Integration) -> Result<TestReport> {
        let config = &integration.config_data;
        let account_sid = config_str(config, "account_sid")
            .ok_or_else(|| Error::BadRequest("SMS provider credentials missing".to_string()))?;
        let auth_token = config_str(config, "auth_token")
            .ok_or_else(|| Error::BadRequest("SMS provider credentials missing".to_string()))?;
        let api_base = config_str(config, "api_base_url")
            .ok_or_else(|| Error::BadRequest("SMS provider api_base_url missing".to_string()))?;

        let url = format!("{}/accounts/{}", api_base.trim_end_matches('/'), account_sid);
        let response = self
            .client
            .get(&url)
            .basic_auth(account_sid, Some(auth_token))
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                Ok(TestReport::success("SMS provider integration test successful"))
            }
            Ok(resp) => Ok(TestReport::failed(
                "SMS provider integration test failed",
                format!("API returned status {}", resp.status()),
            )),
            Err(e) => {
                warn!(error = %e, "SMS provider connectivity probe failed");
                Ok(TestReport::failed(
                    "SMS provider integration test failed",
                    e.to_string(),
                ))
            }
        }
    }

    /// Lists CRM locations with the stored bearer token.
    async fn test_crm(&self, integration: &Integration) -> Result<TestReport> {
        let config = &integration.config_data;
        let api_token = config_str(config, "api_token")
            .ok_or_else(|| Error::BadRequest("CRM API token missing".to_string()))?;
        let api_base = config_str(config, "api_base_url")
            .ok_or_else(|| Error::BadRequest("CRM api_base_url missing".to_string()))?;

        let url = format!("{}/locations/", api_base.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .bearer_auth(api_token)
            .header("Content-Type", "application/json")
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                Ok(TestReport::success("CRM integration test successful"))
            }
            Ok(resp) => Ok(TestReport::failed(
                "CRM integration test failed",
                format!("API returned status {}", resp.status()),
            )),
            Err(e) => {
                warn!(error = %e, "CRM connectivity probe failed");
                Ok(TestReport::failed(
                    "CRM integration test failed",
                    e.to_string(),
                ))
            }
        }
    }

    /// Posts a small test payload to the automation platform's webhook URL.
    async fn test_automation_webhook(&self, integration: &Integration) -> Result<TestReport> {
        if integration.webhook_url.trim().is_empty() {
            return Err(Error::BadRequest("Webhook URL missing".to_string()));
        }

        let payload = json!({
            "test": true,
            "message": "Test webhook from integration gateway",
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let response = self
            .client
            .post(&integration.webhook_url)
            .json(&payload)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                Ok(TestReport::success("Webhook test successful"))
            }
            Ok(resp) => Ok(TestReport::failed(
                "Webhook test failed",
                format!("Webhook returned status {}", resp.status()),
            )),
            Err(e) => {
                warn!(error = %e, "Automation webhook probe failed");
                Ok(TestReport::failed("Webhook test failed", e.to_string()))
            }
        }
    }
}

impl Default for ConnectivityService {
    fn default() -> Self {
        Self::new()
    }
}

fn config_str<'a>(config: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    config
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
}

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::error::{Error, Result};
use serde_json::{Map, Value as JsonValue};

use super::handlers;
use super::normalize::{CanonicalEvent, ServiceKind};

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;
pub type Handler = fn(Map<String, JsonValue>) -> HandlerFuture;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    /// No handler registered for the (service, event_type) pair. The event
    /// is still audit-logged; this is graceful degradation, not an error.
    Unhandled,
}

/// Lookup table from (service, event type) to a handler. Built once at
/// startup and shared read-only across requests.
#[derive(Clone)]
pub struct WebhookRouter {
    table: HashMap<(ServiceKind, String), Handler>,
    handler_timeout: Duration,
}

impl WebhookRouter {
    pub fn new(handler_timeout: Duration) -> Self {
        Self {
            table: HashMap::new(),
            handler_timeout,
        }
    }

    pub fn register(&mut self, service: ServiceKind, event_type: &str, handler: Handler) {
        self.table.insert((service, event_type.to_string()), handler);
    }

    pub fn with_default_routes(handler_timeout: Duration) -> Self {
        use ServiceKind::*;

        let mut router = Self::new(handler_timeout);
        router.register(SmsVoiceProvider, "delivered", handlers::sms_message_status);
        router.register(SmsVoiceProvider, "sent", handlers::sms_message_status);
        router.register(SmsVoiceProvider, "failed", handlers::sms_message_status);
        router.register(CrmPlatform, "ContactCreate", handlers::crm_contact_created);
        router.register(CrmPlatform, "ContactUpdate", handlers::crm_contact_updated);
        router.register(
            CrmPlatform,
            "ConversationMessage",
            handlers::crm_message_received,
        );
        router.register(AutomationPlatformA, "new_lead", handlers::automation_a_new_lead);
        router.register(
            AutomationPlatformA,
            "form_submission",
            handlers::automation_a_form_submission,
        );
        router.register(
            AutomationPlatformB,
            "contact_created",
            handlers::automation_b_contact_created,
        );
        router.register(
            AutomationPlatformB,
            "automation_triggered",
            handlers::automation_b_automation_triggered,
        );
        router
    }

    /// Runs the registered handler for the event, bounded by the configured
    /// timeout so ingestion never stalls on handler work. A lookup miss is a
    /// no-op. Handler errors come back as `Error::Handler` for the ingestion
    /// endpoint to swallow and record.
    pub async fn dispatch(&self, event: &CanonicalEvent) -> Result<DispatchOutcome> {
        let key = (event.service, event.event_type.clone());
        let Some(handler) = self.table.get(&key) else {
            return Ok(DispatchOutcome::Unhandled);
        };

        match tokio::time::timeout(self.handler_timeout, handler(event.payload.clone())).await {
            Ok(Ok(())) => Ok(DispatchOutcome::Handled),
            Ok(Err(e)) => Err(Error::Handler(format!(
                "handler for {}/{} failed: {}",
                event.service, event.event_type, e
            ))),
            Err(_) => Err(Error::Handler(format!(
                "handler for {}/{} timed out after {:?}",
                event.service, event.event_type, self.handler_timeout
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(service: ServiceKind, event_type: &str) -> CanonicalEvent {
        CanonicalEvent {
            service,
            event_type: event_type.to_string(),
            payload: Map::new(),
            received_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn unregistered_pair_is_a_noop() {
        let router = WebhookRouter::with_default_routes(Duration::from_millis(250));
        let outcome = router
            .dispatch(&event(ServiceKind::CrmPlatform, "SomethingNew"))
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Unhandled);
    }

    #[tokio::test]
    async fn default_routes_handle_known_events() {
        let router = WebhookRouter::with_default_routes(Duration::from_millis(250));
        for (service, event_type) in [
            (ServiceKind::SmsVoiceProvider, "delivered"),
            (ServiceKind::CrmPlatform, "ContactCreate"),
            (ServiceKind::AutomationPlatformA, "new_lead"),
            (ServiceKind::AutomationPlatformB, "automation_triggered"),
        ] {
            let outcome = router.dispatch(&event(service, event_type)).await.unwrap();
            assert_eq!(outcome, DispatchOutcome::Handled, "{}/{}", service, event_type);
        }
    }

    #[tokio::test]
    async fn failing_handler_surfaces_as_handler_error() {
        fn boom(_: Map<String, serde_json::Value>) -> HandlerFuture {
            Box::pin(async { Err(Error::Internal("boom".to_string())) })
        }

        let mut router = WebhookRouter::new(Duration::from_millis(250));
        router.register(ServiceKind::CrmPlatform, "ContactCreate", boom);
        let err = router
            .dispatch(&event(ServiceKind::CrmPlatform, "ContactCreate"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Handler(_)));
    }

    #[tokio::test]
    async fn slow_handler_is_cut_off_by_the_timeout() {
        fn sleepy(_: Map<String, serde_json::Value>) -> HandlerFuture {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
        }

        let mut router = WebhookRouter::new(Duration::from_millis(20));
        router.register(ServiceKind::AutomationPlatformB, "contact_created", sleepy);
        let err = router
            .dispatch(&event(ServiceKind::AutomationPlatformB, "contact_created"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Handler(_)));
    }
}

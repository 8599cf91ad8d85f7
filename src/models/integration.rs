use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

/// One configured third-party service for one user. The config blob is
/// opaque here; only the connectivity tester interprets its keys.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Integration {
    pub id: Uuid,
    pub user_id: Uuid,
    pub service_name: String,
    pub display_name: String,
    pub is_active: bool,
    pub webhook_url: String,
    pub config_data: JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

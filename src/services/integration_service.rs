use crate::dto::integration_dto::{CreateIntegrationPayload, UpdateIntegrationPayload};
use crate::error::{Error, Result};
use crate::models::integration::Integration;
use crate::webhooks::normalize::ServiceKind;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

const INTEGRATION_COLUMNS: &str = "id, user_id, service_name, display_name, is_active, \
     webhook_url, config_data, created_at, updated_at";

/// Per-user registry of configured third-party integrations. Consulted by
/// the outbound connectivity tester, never by the ingestion path.
#[derive(Clone)]
pub struct IntegrationService {
    pool: PgPool,
}

impl IntegrationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Integration>> {
        let query = format!(
            "SELECT {} FROM integrations WHERE user_id = $1 ORDER BY created_at ASC",
            INTEGRATION_COLUMNS
        );
        let items = sqlx::query_as::<_, Integration>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        payload: CreateIntegrationPayload,
    ) -> Result<Integration> {
        let service_name = payload.service_name.to_lowercase();
        if ServiceKind::parse(&service_name).is_none() {
            return Err(Error::BadRequest(format!(
                "Invalid service name: {}",
                service_name
            )));
        }

        let query = format!(
            "INSERT INTO integrations (user_id, service_name, display_name, is_active, webhook_url, config_data)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            INTEGRATION_COLUMNS
        );
        let integration = sqlx::query_as::<_, Integration>(&query)
            .bind(user_id)
            .bind(&service_name)
            .bind(&payload.display_name)
            .bind(payload.is_active.unwrap_or(true))
            .bind(payload.webhook_url.unwrap_or_default())
            .bind(payload.config_data.unwrap_or_else(|| json!({})))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => Error::Conflict(
                    format!("{} integration already exists", service_name),
                ),
                _ => Error::from(e),
            })?;

        Ok(integration)
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Integration> {
        let query = format!(
            "SELECT {} FROM integrations WHERE id = $1 AND user_id = $2",
            INTEGRATION_COLUMNS
        );
        let integration = sqlx::query_as::<_, Integration>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Integration not found".to_string()))?;
        Ok(integration)
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        payload: UpdateIntegrationPayload,
    ) -> Result<Integration> {
        self.get(user_id, id).await?;

        let query = format!(
            "UPDATE integrations
             SET display_name = COALESCE($3, display_name),
                 webhook_url = COALESCE($4, webhook_url),
                 is_active = COALESCE($5, is_active),
                 config_data = COALESCE($6, config_data),
                 updated_at = NOW()
             WHERE id = $1 AND user_id = $2
             RETURNING {}",
            INTEGRATION_COLUMNS
        );
        let integration = sqlx::query_as::<_, Integration>(&query)
            .bind(id)
            .bind(user_id)
            .bind(payload.display_name)
            .bind(payload.webhook_url)
            .bind(payload.is_active)
            .bind(payload.config_data)
            .fetch_one(&self.pool)
            .await?;

        Ok(integration)
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM integrations WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Integration not found".to_string()));
        }
        Ok(())
    }
}

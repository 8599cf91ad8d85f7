use crate::config::get_config;
use crate::error::Result;
use crate::models::webhook_log::{LogStatus, WebhookLog};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// Durable audit log for inbound webhook traffic. `record` is called exactly
/// once per delivery attempt, success or failure; callers on the ingestion
/// path discard its errors after reporting them to tracing.
#[derive(Clone)]
pub struct WebhookService {
    pool: PgPool,
}

pub struct WebhookLogList {
    pub logs: Vec<WebhookLog>,
    pub total: i64,
    pub pages: i64,
    pub current_page: i64,
}

impl WebhookService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record(
        &self,
        user_id: Option<Uuid>,
        service_name: &str,
        event_type: &str,
        payload: JsonValue,
        status: LogStatus,
    ) -> Result<WebhookLog> {
        let user_id = match user_id {
            Some(id) => id,
            // Webhooks arrive unauthenticated; attribute them to the
            // deterministic fallback account.
            None => self.fallback_user_id().await?,
        };

        let log = sqlx::query_as::<_, WebhookLog>(
            r#"
            INSERT INTO webhook_logs (user_id, service_name, event_type, status, payload)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, service_name, event_type, status, payload, created_at
            "#,
        )
        .bind(user_id)
        .bind(service_name)
        .bind(event_type)
        .bind(status.as_str())
        .bind(payload)
        .fetch_one(&self.pool)
        .await?;

        Ok(log)
    }

    /// Atomic get-or-create keyed on the unique email. The no-op DO UPDATE
    /// makes RETURNING yield the existing row under concurrent first use.
    async fn fallback_user_id(&self) -> Result<Uuid> {
        let email = &get_config().fallback_user_email;
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (email, name)
            VALUES ($1, 'Webhook Intake')
            ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
            RETURNING id
            "#,
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        service: Option<String>,
        page: i64,
        per_page: i64,
    ) -> Result<WebhookLogList> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, 100);
        let offset = (page - 1) * per_page;

        let mut filters = vec!["user_id = $1".to_string()];
        let mut args: Vec<String> = Vec::new();
        if let Some(service) = service.filter(|s| !s.is_empty()) {
            filters.push(format!("service_name = ${}", args.len() + 2));
            args.push(service);
        }
        let where_clause = format!("WHERE {}", filters.join(" AND "));

        let items_query = format!(
            "SELECT id, user_id, service_name, event_type, status, payload, created_at
             FROM webhook_logs
             {}
             ORDER BY created_at DESC
             LIMIT ${} OFFSET ${}",
            where_clause,
            args.len() + 2,
            args.len() + 3
        );
        let total_query = format!("SELECT COUNT(*) FROM webhook_logs {}", where_clause);

        let mut items_statement = sqlx::query_as::<_, WebhookLog>(&items_query).bind(user_id);
        for value in &args {
            items_statement = items_statement.bind(value);
        }
        items_statement = items_statement.bind(per_page).bind(offset);
        let logs = items_statement.fetch_all(&self.pool).await?;

        let mut total_statement = sqlx::query_scalar::<_, i64>(&total_query).bind(user_id);
        for value in &args {
            total_statement = total_statement.bind(value);
        }
        let total = total_statement.fetch_one(&self.pool).await?;

        let pages = ((total as f64) / (per_page as f64)).ceil() as i64;

        Ok(WebhookLogList {
            logs,
            total,
            pages,
            current_page: page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dotenvy::dotenv;
    use serde_json::json;
    use sqlx::postgres::PgPoolOptions;
    use std::env;

    async fn setup_test_db() -> PgPool {
        dotenv().ok();
        env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
        env::set_var("JWT_SECRET", "test_secret_key");
        env::set_var("PUBLIC_RPS", "100");
        env::set_var("INTEGRATION_RPS", "100");
        let _ = crate::config::init_config();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await
            .expect("Failed to create test pool");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        pool
    }

    #[tokio::test]
    async fn record_attributes_unauthenticated_entries_to_fallback_user() {
        let pool = setup_test_db().await;
        let service = WebhookService::new(pool.clone());

        let first = service
            .record(
                None,
                "sms_voice_provider",
                "delivered",
                json!({"MessageSid": "SM-fallback-test"}),
                LogStatus::Success,
            )
            .await
            .expect("record");
        let second = service
            .record(
                None,
                "sms_voice_provider",
                "sent",
                json!({"MessageSid": "SM-fallback-test-2"}),
                LogStatus::Success,
            )
            .await
            .expect("record");

        assert_eq!(first.user_id, second.user_id);
        assert_eq!(first.status, "success");

        let email: String =
            sqlx::query_scalar("SELECT email FROM users WHERE id = $1")
                .bind(first.user_id)
                .fetch_one(&pool)
                .await
                .expect("fallback user exists");
        assert_eq!(email, crate::config::get_config().fallback_user_email);
    }

    #[tokio::test]
    async fn list_orders_descending_and_handles_out_of_range_pages() {
        let pool = setup_test_db().await;
        let service = WebhookService::new(pool.clone());

        let user_id = Uuid::new_v4();
        sqlx::query("INSERT INTO users (id, email, name) VALUES ($1, $2, 'List Test')")
            .bind(user_id)
            .bind(format!("list_{}@example.com", user_id))
            .execute(&pool)
            .await
            .expect("seed user");

        for i in 0..3 {
            service
                .record(
                    Some(user_id),
                    "crm_platform",
                    "ContactCreate",
                    json!({"seq": i}),
                    LogStatus::Success,
                )
                .await
                .expect("record");
        }

        let list = service
            .list(user_id, None, 1, 2)
            .await
            .expect("list");
        assert_eq!(list.total, 3);
        assert_eq!(list.pages, 2);
        assert_eq!(list.logs.len(), 2);
        assert!(list.logs[0].created_at >= list.logs[1].created_at);

        let filtered = service
            .list(user_id, Some("automation_platform_a".to_string()), 1, 20)
            .await
            .expect("filtered list");
        assert_eq!(filtered.total, 0);

        let beyond = service.list(user_id, None, 99, 2).await.expect("beyond");
        assert!(beyond.logs.is_empty());
        assert_eq!(beyond.total, 3);
        assert_eq!(beyond.current_page, 99);
    }
}

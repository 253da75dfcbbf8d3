use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use crate::db;
use crate::error::StoreError;
use crate::models::FormSubmission;

/// Durable sink for decoded submissions.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist the submission's fields together with its `received_at` stamp.
    async fn save(&self, submission: &FormSubmission) -> Result<(), StoreError>;
}

/// Messages kept as JSONB documents in PostgreSQL.
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    /// Connect and apply migrations. `timeout` bounds every connection
    /// attempt; exceeding it surfaces as `StoreError::Unreachable`.
    pub async fn connect(database_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let options: PgConnectOptions = database_url
            .parse()
            .map_err(|e| StoreError::Rejected(format!("Invalid DATABASE_URL: {e}")))?;
        Self::connect_with(options, timeout).await
    }

    pub async fn connect_with(
        options: PgConnectOptions,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(timeout)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Rejected(format!("Failed to run migrations: {e}")))?;

        let existing = db::messages::count(&pool).await?;
        tracing::info!("Message store ready ({existing} messages stored)");

        Ok(Self { pool })
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn save(&self, submission: &FormSubmission) -> Result<(), StoreError> {
        let id = db::messages::create(
            &self.pool,
            &submission.to_document(),
            submission.received_at.naive_local(),
        )
        .await?;

        tracing::debug!("Stored message {id}");
        Ok(())
    }
}

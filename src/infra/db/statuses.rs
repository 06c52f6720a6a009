use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{RepoError, StatusesRepo};
use crate::domain::entities::StatusRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct StatusRow {
    id: Uuid,
    entity_type: String,
    name: String,
    position: i32,
    created_at: OffsetDateTime,
}

#[async_trait]
impl StatusesRepo for PostgresRepositories {
    async fn first_status_for(&self, entity_type: &str) -> Result<StatusRecord, RepoError> {
        let row = sqlx::query_as::<_, StatusRow>(
            "SELECT id, entity_type, name, position, created_at
               FROM statuses
              WHERE entity_type = $1
              ORDER BY position
              LIMIT 1",
        )
        .bind(entity_type)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let row = row.ok_or(RepoError::NotFound)?;

        Ok(StatusRecord {
            id: row.id,
            entity_type: row.entity_type,
            name: row.name,
            position: row.position,
            created_at: row.created_at,
        })
    }
}

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{EventsRepo, NewAdvertEvent, RepoError};
use crate::domain::entities::AdvertEventRecord;
use crate::domain::types::AdvertEventKind;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct AdvertEventRow {
    id: Uuid,
    advert_id: Uuid,
    kind: AdvertEventKind,
    percent: i32,
    description: String,
    created_at: OffsetDateTime,
}

impl From<AdvertEventRow> for AdvertEventRecord {
    fn from(row: AdvertEventRow) -> Self {
        Self {
            id: row.id,
            advert_id: row.advert_id,
            kind: row.kind,
            percent: row.percent,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl EventsRepo for PostgresRepositories {
    async fn append_event(&self, event: NewAdvertEvent) -> Result<AdvertEventRecord, RepoError> {
        let row = sqlx::query_as::<_, AdvertEventRow>(
            "INSERT INTO advert_events (id, advert_id, kind, percent, description, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, advert_id, kind, percent, description, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(event.advert_id)
        .bind(event.kind)
        .bind(event.percent)
        .bind(event.description)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(AdvertEventRecord::from(row))
    }

    async fn list_events(&self, advert_id: Uuid) -> Result<Vec<AdvertEventRecord>, RepoError> {
        let rows = sqlx::query_as::<_, AdvertEventRow>(
            "SELECT id, advert_id, kind, percent, description, created_at
               FROM advert_events
              WHERE advert_id = $1
              ORDER BY created_at DESC, id DESC",
        )
        .bind(advert_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(AdvertEventRecord::from).collect())
    }
}

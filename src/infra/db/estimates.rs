use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{EstimateInput, EstimatesRepo, RepoError};
use crate::domain::entities::AdvertEstimateRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct EstimateRow {
    id: Uuid,
    advert_id: Uuid,
    title: String,
    amount: i32,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<EstimateRow> for AdvertEstimateRecord {
    fn from(row: EstimateRow) -> Self {
        Self {
            id: row.id,
            advert_id: row.advert_id,
            title: row.title,
            amount: row.amount,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl EstimatesRepo for PostgresRepositories {
    async fn list_estimates(
        &self,
        advert_id: Uuid,
    ) -> Result<Vec<AdvertEstimateRecord>, RepoError> {
        let rows = sqlx::query_as::<_, EstimateRow>(
            "SELECT id, advert_id, title, amount, created_at, updated_at
               FROM advert_estimates
              WHERE advert_id = $1
              ORDER BY created_at, id",
        )
        .bind(advert_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(AdvertEstimateRecord::from).collect())
    }

    async fn replace_estimates(
        &self,
        advert_id: Uuid,
        items: Vec<EstimateInput>,
    ) -> Result<Vec<AdvertEstimateRecord>, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        sqlx::query("DELETE FROM advert_estimates WHERE advert_id = $1")
            .bind(advert_id)
            .execute(tx.as_mut())
            .await
            .map_err(map_sqlx_error)?;

        let now = OffsetDateTime::now_utc();
        let mut records = Vec::with_capacity(items.len());
        for item in items {
            let row = sqlx::query_as::<_, EstimateRow>(
                "INSERT INTO advert_estimates (id, advert_id, title, amount, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $5)
                 RETURNING id, advert_id, title, amount, created_at, updated_at",
            )
            .bind(Uuid::new_v4())
            .bind(advert_id)
            .bind(item.title)
            .bind(item.amount)
            .bind(now)
            .fetch_one(tx.as_mut())
            .await
            .map_err(map_sqlx_error)?;

            records.push(AdvertEstimateRecord::from(row));
        }

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(records)
    }
}

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{ModerationNotesRepo, NewModerationNote, RepoError};
use crate::domain::entities::ModerationNoteRecord;
use crate::domain::types::ModerationOutcome;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct ModerationNoteRow {
    id: Uuid,
    advert_id: Uuid,
    outcome: ModerationOutcome,
    note: String,
    created_by: Option<Uuid>,
    created_at: OffsetDateTime,
}

impl From<ModerationNoteRow> for ModerationNoteRecord {
    fn from(row: ModerationNoteRow) -> Self {
        Self {
            id: row.id,
            advert_id: row.advert_id,
            outcome: row.outcome,
            note: row.note,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ModerationNotesRepo for PostgresRepositories {
    async fn append_note(
        &self,
        note: NewModerationNote,
    ) -> Result<ModerationNoteRecord, RepoError> {
        let row = sqlx::query_as::<_, ModerationNoteRow>(
            "INSERT INTO moderation_notes (id, advert_id, outcome, note, created_by, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, advert_id, outcome, note, created_by, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(note.advert_id)
        .bind(note.outcome)
        .bind(note.note)
        .bind(note.created_by)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(ModerationNoteRecord::from(row))
    }

    async fn list_notes(&self, advert_id: Uuid) -> Result<Vec<ModerationNoteRecord>, RepoError> {
        let rows = sqlx::query_as::<_, ModerationNoteRow>(
            "SELECT id, advert_id, outcome, note, created_by, created_at
               FROM moderation_notes
              WHERE advert_id = $1
              ORDER BY created_at DESC, id DESC",
        )
        .bind(advert_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ModerationNoteRecord::from).collect())
    }
}

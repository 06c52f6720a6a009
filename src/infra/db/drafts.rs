//! Draft creation and merge-back, each a single transaction.

use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{EstimateInput, NewDraft, RepoError};
use crate::domain::adverts::{DraftFields, auto_extend_on_save};
use crate::domain::entities::AdvertRecord;
use crate::domain::types::{ModerationOutcome, ProcessStatus};

use super::adverts::{ADVERT_COLUMNS, AdvertRow, update_advert_row};
use super::{PostgresRepositories, map_sqlx_error};

/// Insert the draft row plus deep copies of the origin's estimates. The
/// unique `origin_id` constraint makes a concurrent second creator fail with
/// [`RepoError::Duplicate`] and the whole transaction rolls back.
pub(super) async fn insert_draft(
    repos: &PostgresRepositories,
    draft: NewDraft,
    estimates: Vec<EstimateInput>,
) -> Result<AdvertRecord, RepoError> {
    let mut tx = repos.begin().await.map_err(map_sqlx_error)?;

    let now = OffsetDateTime::now_utc();
    let fields = draft.fields;
    let row = sqlx::query_as::<_, AdvertRow>(&format!(
        "INSERT INTO adverts (
            id, title, category_id, location_id, logo, small_logo, video,
            short_description, description, status_id, owner_id, owner_kind,
            origin_id, ended_at, total_amount, collected_amount,
            charter, charter_approved, registry_extract, registry_extract_approved,
            meeting_minutes, meeting_minutes_approved,
            auditor_id, auditor_notes, auditor_approved,
            is_available, process_status, created_at, updated_at
        )
        VALUES (
            $1, $2, $3, $4, $5, $6, $7,
            $8, $9, $10, $11, $12,
            $13, $14, $15, $16,
            $17, $18, $19, $20,
            $21, $22,
            $23, $24, $25,
            $26, $27, $28, $28
        )
        RETURNING {ADVERT_COLUMNS}"
    ))
    .bind(draft.id)
    .bind(fields.title)
    .bind(fields.category_id)
    .bind(fields.location_id)
    .bind(fields.logo)
    .bind(fields.small_logo)
    .bind(fields.video)
    .bind(fields.short_description)
    .bind(fields.description)
    .bind(draft.status_id)
    .bind(fields.owner_id)
    .bind(fields.owner_kind)
    .bind(draft.origin_id)
    .bind(fields.ended_at)
    .bind(fields.total_amount)
    .bind(fields.collected_amount)
    .bind(fields.charter)
    .bind(fields.charter_approved)
    .bind(fields.registry_extract)
    .bind(fields.registry_extract_approved)
    .bind(fields.meeting_minutes)
    .bind(fields.meeting_minutes_approved)
    .bind(fields.auditor_id)
    .bind(fields.auditor_notes)
    .bind(fields.auditor_approved)
    .bind(ModerationOutcome::Waiting)
    .bind(ProcessStatus::Idle)
    .bind(now)
    .fetch_one(tx.as_mut())
    .await
    .map_err(map_sqlx_error)?;

    for estimate in estimates {
        sqlx::query(
            "INSERT INTO advert_estimates (id, advert_id, title, amount, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $5)",
        )
        .bind(Uuid::new_v4())
        .bind(draft.id)
        .bind(estimate.title)
        .bind(estimate.amount)
        .bind(now)
        .execute(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?;
    }

    tx.commit().await.map_err(map_sqlx_error)?;

    Ok(AdvertRecord::from(row))
}

/// Merge the draft onto its origin and delete the draft, atomically.
///
/// The draft fetch is scoped to `process_status = 'apply'` and locked, so a
/// row that was already merged, re-edited or deleted makes this a no-op.
pub(super) async fn apply_draft(
    repos: &PostgresRepositories,
    draft_id: Uuid,
) -> Result<Option<AdvertRecord>, RepoError> {
    let mut tx = repos.begin().await.map_err(map_sqlx_error)?;

    let draft = sqlx::query_as::<_, AdvertRow>(&format!(
        "SELECT {ADVERT_COLUMNS} FROM adverts
          WHERE id = $1 AND process_status = $2
            FOR UPDATE"
    ))
    .bind(draft_id)
    .bind(ProcessStatus::Apply)
    .fetch_optional(tx.as_mut())
    .await
    .map_err(map_sqlx_error)?;

    let Some(draft) = draft.map(AdvertRecord::from) else {
        return Ok(None);
    };

    let origin_id = draft.origin_id.ok_or_else(|| {
        RepoError::integrity(format!("draft {} has no resolvable origin", draft.id))
    })?;

    let origin = sqlx::query_as::<_, AdvertRow>(&format!(
        "SELECT {ADVERT_COLUMNS} FROM adverts WHERE id = $1 FOR UPDATE"
    ))
    .bind(origin_id)
    .fetch_optional(tx.as_mut())
    .await
    .map_err(map_sqlx_error)?;

    let Some(origin) = origin.map(AdvertRecord::from) else {
        return Err(RepoError::integrity(format!(
            "origin {origin_id} of draft {draft_id} is missing"
        )));
    };

    let previous_availability = origin.is_available;
    let mut merged = origin;
    DraftFields::of(&draft).apply_to(&mut merged);

    let now = OffsetDateTime::now_utc();
    auto_extend_on_save(Some(previous_availability), &mut merged, now);
    merged.updated_at = now;

    let updated = update_advert_row(tx.as_mut(), &merged).await?;

    sqlx::query("DELETE FROM advert_estimates WHERE advert_id = $1")
        .bind(updated.id)
        .execute(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?;

    // Re-parent rather than copy: the draft row is about to go away.
    sqlx::query("UPDATE advert_estimates SET advert_id = $2, updated_at = $3 WHERE advert_id = $1")
        .bind(draft.id)
        .bind(updated.id)
        .bind(now)
        .execute(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?;

    sqlx::query("DELETE FROM adverts WHERE id = $1")
        .bind(draft.id)
        .execute(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?;

    tx.commit().await.map_err(map_sqlx_error)?;

    Ok(Some(updated))
}

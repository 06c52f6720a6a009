use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::application::repos::{
    AdvertListScope, AdvertsRepo, AdvertsWriteRepo, CreateAdvertParams, EstimateInput, NewDraft,
    RepoError, StatusesRepo,
};
use crate::domain::adverts::auto_extend_on_save;
use crate::domain::entities::AdvertRecord;
use crate::domain::types::{ModerationOutcome, OwnerKind, ProcessStatus};

use super::{PostgresRepositories, map_sqlx_error};

pub(super) const ADVERT_COLUMNS: &str = "id, title, category_id, location_id, logo, small_logo, \
     video, short_description, description, status_id, owner_id, owner_kind, origin_id, \
     ended_at, total_amount, collected_amount, charter, charter_approved, registry_extract, \
     registry_extract_approved, meeting_minutes, meeting_minutes_approved, auditor_id, \
     auditor_notes, auditor_approved, is_available, process_status, approved_at, approved_by, \
     created_at, updated_at";

#[derive(sqlx::FromRow)]
pub struct AdvertRow {
    pub id: Uuid,
    pub title: String,
    pub category_id: Uuid,
    pub location_id: Option<Uuid>,
    pub logo: Option<String>,
    pub small_logo: Option<String>,
    pub video: String,
    pub short_description: String,
    pub description: String,
    pub status_id: Uuid,
    pub owner_id: Uuid,
    pub owner_kind: OwnerKind,
    pub origin_id: Option<Uuid>,
    pub ended_at: Option<Date>,
    pub total_amount: i64,
    pub collected_amount: i64,
    pub charter: Option<String>,
    pub charter_approved: Option<bool>,
    pub registry_extract: Option<String>,
    pub registry_extract_approved: Option<bool>,
    pub meeting_minutes: Option<String>,
    pub meeting_minutes_approved: Option<bool>,
    pub auditor_id: Option<Uuid>,
    pub auditor_notes: String,
    pub auditor_approved: Option<ModerationOutcome>,
    pub is_available: ModerationOutcome,
    pub process_status: ProcessStatus,
    pub approved_at: Option<OffsetDateTime>,
    pub approved_by: Option<Uuid>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<AdvertRow> for AdvertRecord {
    fn from(row: AdvertRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            category_id: row.category_id,
            location_id: row.location_id,
            logo: row.logo,
            small_logo: row.small_logo,
            video: row.video,
            short_description: row.short_description,
            description: row.description,
            status_id: row.status_id,
            owner_id: row.owner_id,
            owner_kind: row.owner_kind,
            origin_id: row.origin_id,
            ended_at: row.ended_at,
            total_amount: row.total_amount,
            collected_amount: row.collected_amount,
            charter: row.charter,
            charter_approved: row.charter_approved,
            registry_extract: row.registry_extract,
            registry_extract_approved: row.registry_extract_approved,
            meeting_minutes: row.meeting_minutes,
            meeting_minutes_approved: row.meeting_minutes_approved,
            auditor_id: row.auditor_id,
            auditor_notes: row.auditor_notes,
            auditor_approved: row.auditor_approved,
            is_available: row.is_available,
            process_status: row.process_status,
            approved_at: row.approved_at,
            approved_by: row.approved_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn apply_scope_conditions(qb: &mut QueryBuilder<'_, Postgres>, scope: AdvertListScope) {
    match scope {
        AdvertListScope::Published => {
            qb.push(" AND origin_id IS NULL AND is_available = ");
            qb.push_bind(ModerationOutcome::Allowed);
            qb.push(" AND owner_kind = ");
            qb.push_bind(OwnerKind::Organization);
        }
        AdvertListScope::Pending => {
            qb.push(" AND origin_id IS NULL AND is_available = ");
            qb.push_bind(ModerationOutcome::Waiting);
            qb.push(" AND owner_kind = ");
            qb.push_bind(OwnerKind::Organization);
        }
        AdvertListScope::Banned => {
            qb.push(" AND origin_id IS NULL AND is_available = ");
            qb.push_bind(ModerationOutcome::Banned);
        }
        AdvertListScope::Drafts => {
            qb.push(" AND origin_id IS NOT NULL AND owner_kind = ");
            qb.push_bind(OwnerKind::Organization);
        }
    }
}

#[async_trait]
impl AdvertsRepo for PostgresRepositories {
    async fn find_advert(&self, id: Uuid) -> Result<Option<AdvertRecord>, RepoError> {
        let row = sqlx::query_as::<_, AdvertRow>(&format!(
            "SELECT {ADVERT_COLUMNS} FROM adverts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(AdvertRecord::from))
    }

    async fn find_draft_of(&self, origin_id: Uuid) -> Result<Option<AdvertRecord>, RepoError> {
        let row = sqlx::query_as::<_, AdvertRow>(&format!(
            "SELECT {ADVERT_COLUMNS} FROM adverts WHERE origin_id = $1"
        ))
        .bind(origin_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(AdvertRecord::from))
    }

    async fn exists_draft_for(&self, origin_id: Uuid) -> Result<bool, RepoError> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM adverts WHERE origin_id = $1)")
                .bind(origin_id)
                .fetch_one(self.pool())
                .await
                .map_err(map_sqlx_error)?;

        Ok(exists.0)
    }

    async fn list_adverts(
        &self,
        scope: AdvertListScope,
        owner_id: Option<Uuid>,
    ) -> Result<Vec<AdvertRecord>, RepoError> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {ADVERT_COLUMNS} FROM adverts WHERE 1=1 "
        ));

        apply_scope_conditions(&mut qb, scope);

        if let Some(owner_id) = owner_id {
            qb.push(" AND owner_id = ");
            qb.push_bind(owner_id);
        }

        qb.push(" ORDER BY created_at DESC, id DESC");

        let rows = qb
            .build_query_as::<AdvertRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(AdvertRecord::from).collect())
    }
}

#[async_trait]
impl AdvertsWriteRepo for PostgresRepositories {
    async fn create_advert(&self, params: CreateAdvertParams) -> Result<AdvertRecord, RepoError> {
        let status = self.first_status_for("advert").await?;

        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        let row = sqlx::query_as::<_, AdvertRow>(&format!(
            "INSERT INTO adverts (
                id, title, category_id, location_id, logo, small_logo, video,
                short_description, description, status_id, owner_id, owner_kind,
                origin_id, ended_at, total_amount, collected_amount,
                charter, registry_extract, meeting_minutes,
                is_available, process_status, created_at, updated_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7,
                $8, $9, $10, $11, $12,
                NULL, $13, $14, 0,
                $15, $16, $17,
                $18, $19, $20, $20
            )
            RETURNING {ADVERT_COLUMNS}"
        ))
        .bind(id)
        .bind(params.title)
        .bind(params.category_id)
        .bind(params.location_id)
        .bind(params.logo)
        .bind(params.small_logo)
        .bind(params.video)
        .bind(params.short_description)
        .bind(params.description)
        .bind(status.id)
        .bind(params.owner_id)
        .bind(params.owner_kind)
        .bind(params.ended_at)
        .bind(params.total_amount)
        .bind(params.charter)
        .bind(params.registry_extract)
        .bind(params.meeting_minutes)
        .bind(ModerationOutcome::Waiting)
        .bind(ProcessStatus::Idle)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(AdvertRecord::from(row))
    }

    async fn save_advert(&self, advert: &AdvertRecord) -> Result<AdvertRecord, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        // The auto-extension rule compares against the availability that is
        // currently persisted, so the previous row is read under lock.
        let previous: Option<(ModerationOutcome,)> =
            sqlx::query_as("SELECT is_available FROM adverts WHERE id = $1 FOR UPDATE")
                .bind(advert.id)
                .fetch_optional(tx.as_mut())
                .await
                .map_err(map_sqlx_error)?;

        let Some((previous_outcome,)) = previous else {
            return Err(RepoError::NotFound);
        };

        let mut next = advert.clone();
        let now = OffsetDateTime::now_utc();
        auto_extend_on_save(Some(previous_outcome), &mut next, now);
        next.updated_at = now;

        let row = update_advert_row(tx.as_mut(), &next).await?;

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(row)
    }

    async fn mark_submitted(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query(
            "UPDATE adverts
                SET process_status = $2,
                    updated_at = now()
              WHERE id = $1
                AND process_status NOT IN ($2, $3)",
        )
        .bind(id)
        .bind(ProcessStatus::Check)
        .bind(ProcessStatus::Apply)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        // Zero rows is either a missing advert or one already pending.
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM adverts WHERE id = $1)")
            .bind(id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if !exists.0 {
            return Err(RepoError::NotFound);
        }

        Ok(false)
    }

    async fn create_draft(
        &self,
        draft: NewDraft,
        estimates: Vec<EstimateInput>,
    ) -> Result<AdvertRecord, RepoError> {
        super::drafts::insert_draft(self, draft, estimates).await
    }

    async fn apply_draft(&self, draft_id: Uuid) -> Result<Option<AdvertRecord>, RepoError> {
        super::drafts::apply_draft(self, draft_id).await
    }
}

pub(super) async fn update_advert_row(
    executor: &mut sqlx::PgConnection,
    advert: &AdvertRecord,
) -> Result<AdvertRecord, RepoError> {
    let row = sqlx::query_as::<_, AdvertRow>(&format!(
        "UPDATE adverts
            SET title = $2,
                category_id = $3,
                location_id = $4,
                logo = $5,
                small_logo = $6,
                video = $7,
                short_description = $8,
                description = $9,
                status_id = $10,
                owner_id = $11,
                owner_kind = $12,
                ended_at = $13,
                total_amount = $14,
                collected_amount = $15,
                charter = $16,
                charter_approved = $17,
                registry_extract = $18,
                registry_extract_approved = $19,
                meeting_minutes = $20,
                meeting_minutes_approved = $21,
                auditor_id = $22,
                auditor_notes = $23,
                auditor_approved = $24,
                is_available = $25,
                process_status = $26,
                approved_at = $27,
                approved_by = $28,
                updated_at = $29
          WHERE id = $1
      RETURNING {ADVERT_COLUMNS}"
    ))
    .bind(advert.id)
    .bind(&advert.title)
    .bind(advert.category_id)
    .bind(advert.location_id)
    .bind(&advert.logo)
    .bind(&advert.small_logo)
    .bind(&advert.video)
    .bind(&advert.short_description)
    .bind(&advert.description)
    .bind(advert.status_id)
    .bind(advert.owner_id)
    .bind(advert.owner_kind)
    .bind(advert.ended_at)
    .bind(advert.total_amount)
    .bind(advert.collected_amount)
    .bind(&advert.charter)
    .bind(advert.charter_approved)
    .bind(&advert.registry_extract)
    .bind(advert.registry_extract_approved)
    .bind(&advert.meeting_minutes)
    .bind(advert.meeting_minutes_approved)
    .bind(advert.auditor_id)
    .bind(&advert.auditor_notes)
    .bind(advert.auditor_approved)
    .bind(advert.is_available)
    .bind(advert.process_status)
    .bind(advert.approved_at)
    .bind(advert.approved_by)
    .bind(advert.updated_at)
    .fetch_one(executor)
    .await
    .map_err(map_sqlx_error)?;

    Ok(AdvertRecord::from(row))
}

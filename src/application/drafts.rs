//! Draft management: creation of the single draft shadow, idempotent reuse,
//! and the edit guard for adverts whose draft is mid-moderation.

use std::sync::Arc;

use metrics::counter;
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::events::publish_advert_event;
use crate::application::repos::{
    AdvertsRepo, AdvertsWriteRepo, CreateAdvertParams, EstimateInput, EstimatesRepo, EventsRepo,
    NewDraft, RepoError,
};
use crate::domain::adverts::DraftFields;
use crate::domain::entities::{AdvertEstimateRecord, AdvertRecord};
use crate::domain::error::DomainError;
use crate::domain::types::AdvertEventKind;

#[derive(Debug, Clone)]
pub struct UpdateAdvertContentCommand {
    pub id: Uuid,
    pub fields: DraftFields,
    pub estimates: Option<Vec<EstimateInput>>,
}

pub struct DraftService {
    reader: Arc<dyn AdvertsRepo>,
    writer: Arc<dyn AdvertsWriteRepo>,
    estimates: Arc<dyn EstimatesRepo>,
    events: Arc<dyn EventsRepo>,
}

impl DraftService {
    pub fn new(
        reader: Arc<dyn AdvertsRepo>,
        writer: Arc<dyn AdvertsWriteRepo>,
        estimates: Arc<dyn EstimatesRepo>,
        events: Arc<dyn EventsRepo>,
    ) -> Self {
        Self {
            reader,
            writer,
            estimates,
            events,
        }
    }

    pub async fn create_advert(
        &self,
        params: CreateAdvertParams,
    ) -> Result<AdvertRecord, AppError> {
        if params.title.trim().is_empty() {
            return Err(DomainError::validation("advert title must not be empty").into());
        }
        if params.total_amount < 0 {
            return Err(DomainError::validation("funding goal must not be negative").into());
        }

        let advert = self.writer.create_advert(params).await?;

        counter!("raccolta_adverts_created_total").increment(1);
        publish_advert_event(
            self.events.as_ref(),
            &advert,
            AdvertEventKind::AdvertCreated,
            "advert created",
        )
        .await;

        Ok(advert)
    }

    pub async fn get_advert(&self, id: Uuid) -> Result<AdvertRecord, AppError> {
        self.reader
            .find_advert(id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Return the existing draft of `origin_id` or create one atomically.
    ///
    /// Idempotent: a second call returns the same draft row. Two concurrent
    /// creators serialize on the `origin_id` uniqueness constraint; the loser
    /// re-reads the winner's draft instead of failing.
    pub async fn get_or_create_draft(&self, origin_id: Uuid) -> Result<AdvertRecord, AppError> {
        let origin = self.get_advert(origin_id).await?;

        if origin.is_draft() {
            return Err(AppError::integrity(format!(
                "advert {} is itself a draft and cannot spawn one",
                origin.id
            )));
        }

        if let Some(draft) = self.reader.find_draft_of(origin.id).await? {
            debug!(
                target = "application::drafts",
                origin_id = %origin.id,
                draft_id = %draft.id,
                "reusing existing draft"
            );
            return Ok(draft);
        }

        let copies = self
            .estimates
            .list_estimates(origin.id)
            .await?
            .into_iter()
            .map(|estimate| EstimateInput {
                title: estimate.title,
                amount: estimate.amount,
            })
            .collect();

        let new_draft = NewDraft {
            id: Uuid::new_v4(),
            origin_id: origin.id,
            status_id: origin.status_id,
            fields: DraftFields::of(&origin),
        };

        match self.writer.create_draft(new_draft, copies).await {
            Ok(draft) => {
                counter!("raccolta_drafts_created_total").increment(1);
                info!(
                    target = "application::drafts",
                    origin_id = %origin.id,
                    draft_id = %draft.id,
                    "draft created"
                );
                Ok(draft)
            }
            // Lost the creation race: the unique constraint guarantees the
            // other draft now exists, so hand that one back.
            Err(RepoError::Duplicate { .. }) => self
                .reader
                .find_draft_of(origin.id)
                .await?
                .ok_or_else(|| AppError::integrity("draft vanished after losing creation race")),
            Err(err) => Err(err.into()),
        }
    }

    /// Persist content edits on an advert or draft, refusing adverts whose
    /// pending work is already under moderation.
    pub async fn update_content(
        &self,
        command: UpdateAdvertContentCommand,
    ) -> Result<AdvertRecord, AppError> {
        let mut advert = self.get_advert(command.id).await?;
        self.ensure_editable(&advert).await?;

        command.fields.apply_to(&mut advert);
        advert.updated_at = OffsetDateTime::now_utc();
        let saved = self.writer.save_advert(&advert).await?;

        if let Some(items) = command.estimates {
            self.estimates.replace_estimates(saved.id, items).await?;
        }

        Ok(saved)
    }

    pub async fn list_estimates(
        &self,
        advert_id: Uuid,
    ) -> Result<Vec<AdvertEstimateRecord>, AppError> {
        Ok(self.estimates.list_estimates(advert_id).await?)
    }

    /// An advert (or its draft shadow) that is mid-moderation refuses edits
    /// until the pending action settles.
    async fn ensure_editable(&self, advert: &AdvertRecord) -> Result<(), AppError> {
        if advert.process_status.is_pending() {
            return Err(AppError::PermissionDenied(
                "advert is awaiting a moderation decision",
            ));
        }

        if advert.origin_id.is_none() {
            if let Some(draft) = self.reader.find_draft_of(advert.id).await? {
                if draft.process_status.is_pending() {
                    return Err(AppError::PermissionDenied(
                        "draft of this advert is awaiting a moderation decision",
                    ));
                }
            }
        }

        Ok(())
    }
}

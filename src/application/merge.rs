//! Merge engine: applies an approved draft back onto its origin.

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::events::publish_advert_event;
use crate::application::repos::{AdvertsWriteRepo, EventsRepo};
use crate::domain::entities::AdvertRecord;
use crate::domain::types::AdvertEventKind;

pub struct MergeService {
    writer: Arc<dyn AdvertsWriteRepo>,
    events: Arc<dyn EventsRepo>,
}

impl MergeService {
    pub fn new(writer: Arc<dyn AdvertsWriteRepo>, events: Arc<dyn EventsRepo>) -> Self {
        Self { writer, events }
    }

    /// Merge the draft identified by `draft_id` onto its origin and discard
    /// the draft, all within one storage transaction.
    ///
    /// The fetch is scoped to `process_status = Apply`, so a draft whose
    /// state changed or that was already merged makes this a silent no-op —
    /// duplicate job delivery performs the merge at most once.
    pub async fn apply_draft_to_origin(
        &self,
        draft_id: Uuid,
    ) -> Result<Option<AdvertRecord>, AppError> {
        let Some(origin) = self.writer.apply_draft(draft_id).await? else {
            debug!(
                target = "application::merge",
                draft_id = %draft_id,
                "no draft awaiting apply, skipping"
            );
            return Ok(None);
        };

        counter!("raccolta_drafts_merged_total").increment(1);
        publish_advert_event(
            self.events.as_ref(),
            &origin,
            AdvertEventKind::AdvertEdited,
            "advert changed",
        )
        .await;

        info!(
            target = "application::merge",
            draft_id = %draft_id,
            origin_id = %origin.id,
            "draft applied to origin"
        );
        Ok(Some(origin))
    }
}

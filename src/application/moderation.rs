//! Moderation bridge: submission, target resolution and decision routing.

use std::sync::Arc;

use metrics::counter;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::jobs::enqueue_apply_draft_job;
use crate::application::repos::{
    AdvertsRepo, AdvertsWriteRepo, JobsRepo, ModerationNotesRepo, NewModerationNote,
};
use crate::domain::entities::AdvertRecord;
use crate::domain::moderation::{ModerationDecision, record_decision};
use crate::domain::types::{ModerationOutcome, ProcessStatus};

/// The row a moderation decision is logically aimed at. Resolved once at the
/// top of the moderation entry point instead of probing storage repeatedly.
#[derive(Debug, Clone)]
pub enum ModerationTarget {
    /// A draft shadow exists; decisions go to it.
    Draft(AdvertRecord),
    /// Canonical advert still awaiting its first moderation.
    Pending(AdvertRecord),
    /// Canonical advert previously denied.
    Banned(AdvertRecord),
    /// Canonical advert with nothing outstanding.
    Canonical(AdvertRecord),
}

pub struct ModerationService {
    reader: Arc<dyn AdvertsRepo>,
    writer: Arc<dyn AdvertsWriteRepo>,
    notes: Arc<dyn ModerationNotesRepo>,
    jobs: Arc<dyn JobsRepo>,
}

impl ModerationService {
    pub fn new(
        reader: Arc<dyn AdvertsRepo>,
        writer: Arc<dyn AdvertsWriteRepo>,
        notes: Arc<dyn ModerationNotesRepo>,
        jobs: Arc<dyn JobsRepo>,
    ) -> Self {
        Self {
            reader,
            writer,
            notes,
            jobs,
        }
    }

    /// Submit an advert (usually a draft) for moderation.
    ///
    /// Flips `process_status` to `Check` through a partial-field write; an
    /// advert already in `Check` or `Apply` is rejected with a conflict and
    /// left untouched. The write itself is guarded against the pending
    /// states, so a concurrent submitter that slipped past the read check
    /// still surfaces as a conflict rather than a second transition.
    pub async fn submit_for_moderation(&self, advert_id: Uuid) -> Result<(), AppError> {
        let advert = self
            .reader
            .find_advert(advert_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if advert.process_status.is_pending() {
            return Err(AppError::Conflict("advert already submitted for moderation"));
        }

        if !self.writer.mark_submitted(advert.id).await? {
            return Err(AppError::Conflict("advert already submitted for moderation"));
        }

        info!(
            target = "application::moderation",
            advert_id = %advert.id,
            "advert submitted for moderation"
        );
        Ok(())
    }

    /// Resolve which row currently represents the outstanding work for
    /// `advert_id`. Each variant uses its own correctly-scoped lookup.
    pub async fn resolve_active_target(
        &self,
        advert_id: Uuid,
    ) -> Result<ModerationTarget, AppError> {
        let advert = self
            .reader
            .find_advert(advert_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if advert.is_draft() {
            return Ok(ModerationTarget::Draft(advert));
        }

        if let Some(draft) = self.reader.find_draft_of(advert.id).await? {
            return Ok(ModerationTarget::Draft(draft));
        }

        Ok(match advert.is_available {
            ModerationOutcome::Waiting => ModerationTarget::Pending(advert),
            ModerationOutcome::Banned => ModerationTarget::Banned(advert),
            ModerationOutcome::Allowed => ModerationTarget::Canonical(advert),
        })
    }

    /// Apply a moderation decision to whichever row represents the pending
    /// work for `advert_id`.
    pub async fn process_moderate(
        &self,
        advert_id: Uuid,
        decision: ModerationDecision,
    ) -> Result<(), AppError> {
        counter!("raccolta_moderation_decisions_total").increment(1);

        match self.resolve_active_target(advert_id).await? {
            ModerationTarget::Draft(draft) => self.moderate_draft(draft, decision).await,
            ModerationTarget::Pending(advert)
            | ModerationTarget::Banned(advert)
            | ModerationTarget::Canonical(advert) => {
                self.moderate_canonical(advert, decision).await
            }
        }
    }

    /// Draft path: record the outcome without committing, and on approval
    /// arm the deferred merge. The decision note lands on the origin, since
    /// that is the advert the decision is about.
    async fn moderate_draft(
        &self,
        mut draft: AdvertRecord,
        decision: ModerationDecision,
    ) -> Result<(), AppError> {
        let origin_id = draft.origin_id.ok_or_else(|| {
            AppError::integrity(format!("draft {} has no resolvable origin", draft.id))
        })?;

        let now = OffsetDateTime::now_utc();
        let outcome = record_decision(&mut draft, &decision, now);

        let note_target = if outcome == ModerationOutcome::Allowed {
            origin_id
        } else {
            draft.id
        };
        self.notes
            .append_note(NewModerationNote {
                advert_id: note_target,
                outcome,
                note: decision.note.clone(),
                created_by: decision.moderator_id,
            })
            .await?;

        if outcome == ModerationOutcome::Allowed {
            draft.process_status = ProcessStatus::Apply;
            enqueue_apply_draft_job(self.jobs.as_ref(), draft.id).await?;
            info!(
                target = "application::moderation",
                draft_id = %draft.id,
                origin_id = %origin_id,
                "draft approved, merge scheduled"
            );
        } else {
            // Denial does not advance the state machine; the draft drops
            // back to idle and stays editable.
            draft.process_status = ProcessStatus::Idle;
            info!(
                target = "application::moderation",
                draft_id = %draft.id,
                "draft denied"
            );
        }

        draft.updated_at = now;
        self.writer.save_advert(&draft).await?;
        Ok(())
    }

    /// Canonical path: commit the decision directly to the row.
    async fn moderate_canonical(
        &self,
        mut advert: AdvertRecord,
        decision: ModerationDecision,
    ) -> Result<(), AppError> {
        let now = OffsetDateTime::now_utc();
        let outcome = record_decision(&mut advert, &decision, now);

        self.notes
            .append_note(NewModerationNote {
                advert_id: advert.id,
                outcome,
                note: decision.note.clone(),
                created_by: decision.moderator_id,
            })
            .await?;

        advert.updated_at = now;
        self.writer.save_advert(&advert).await?;

        info!(
            target = "application::moderation",
            advert_id = %advert.id,
            outcome = ?outcome,
            "moderation decision recorded"
        );
        Ok(())
    }
}

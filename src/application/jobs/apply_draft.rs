use std::time::Duration;

use apalis::prelude::{Data, Error as ApalisError};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{JobsRepo, RepoError};
use crate::domain::types::JobType;

use super::{context::JobWorkerContext, context::job_failed, queue::enqueue_job};

/// Mandatory delay between moderation approval and merge execution, giving
/// in-flight admin actions a window to settle before the draft disappears.
pub const APPLY_DRAFT_DELAY: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyDraftJobPayload {
    pub draft_id: Uuid,
}

pub async fn enqueue_apply_draft_job<J: JobsRepo + ?Sized>(
    repo: &J,
    draft_id: Uuid,
) -> Result<String, RepoError> {
    let payload = ApplyDraftJobPayload { draft_id };
    let run_at = OffsetDateTime::now_utc() + APPLY_DRAFT_DELAY;
    enqueue_job(repo, JobType::ApplyDraft, &payload, Some(run_at), 10, 10).await
}

/// Worker body for the deferred merge. The underlying merge is scoped to the
/// apply state, so a draft that changed or vanished since scheduling makes
/// this a clean no-op rather than a failure.
pub async fn process_apply_draft_job(
    payload: ApplyDraftJobPayload,
    context: Data<JobWorkerContext>,
) -> Result<(), ApalisError> {
    let ctx = &*context;

    ctx.merge
        .apply_draft_to_origin(payload.draft_id)
        .await
        .map_err(job_failed)?;

    Ok(())
}

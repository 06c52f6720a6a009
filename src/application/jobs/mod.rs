mod apply_draft;
mod context;
mod queue;

pub use apply_draft::{
    APPLY_DRAFT_DELAY, ApplyDraftJobPayload, enqueue_apply_draft_job, process_apply_draft_job,
};
pub use context::{JobWorkerContext, job_failed};
pub use queue::enqueue_job;

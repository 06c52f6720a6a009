//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::domain::entities::{
    AdvertEstimateRecord, AdvertEventRecord, AdvertRecord, ModerationNoteRecord, StatusRecord,
};
use crate::domain::types::{AdvertEventKind, JobType, ModerationOutcome, OwnerKind};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }
}

/// Named query predicates replacing the original proxy-type hierarchy: one
/// concrete advert row shape, four scoped views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertListScope {
    /// Canonical, moderation-allowed, organization-owned.
    Published,
    /// Canonical, awaiting moderation, organization-owned.
    Pending,
    /// Canonical, moderation-denied. Deliberately unscoped by owner kind.
    Banned,
    /// Draft shadows, organization-owned.
    Drafts,
}

#[derive(Debug, Clone)]
pub struct CreateAdvertParams {
    pub title: String,
    pub category_id: Uuid,
    pub location_id: Option<Uuid>,
    pub logo: Option<String>,
    pub small_logo: Option<String>,
    pub video: String,
    pub short_description: String,
    pub description: String,
    pub owner_id: Uuid,
    pub owner_kind: OwnerKind,
    pub ended_at: Option<Date>,
    pub total_amount: i64,
    pub charter: Option<String>,
    pub registry_extract: Option<String>,
    pub meeting_minutes: Option<String>,
}

/// A fully-built draft row, constructed by the draft manager before the
/// atomic insert. Identity and lifecycle defaults are already decided.
#[derive(Debug, Clone)]
pub struct NewDraft {
    pub id: Uuid,
    pub origin_id: Uuid,
    pub status_id: Uuid,
    pub fields: crate::domain::adverts::DraftFields,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstimateInput {
    pub title: String,
    pub amount: i32,
}

#[derive(Debug, Clone)]
pub struct NewModerationNote {
    pub advert_id: Uuid,
    pub outcome: ModerationOutcome,
    pub note: String,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewAdvertEvent {
    pub advert_id: Uuid,
    pub kind: AdvertEventKind,
    pub percent: i32,
    pub description: String,
}

#[async_trait]
pub trait AdvertsRepo: Send + Sync {
    async fn find_advert(&self, id: Uuid) -> Result<Option<AdvertRecord>, RepoError>;

    /// One-to-one draft lookup through the unique `origin_id` constraint.
    async fn find_draft_of(&self, origin_id: Uuid) -> Result<Option<AdvertRecord>, RepoError>;

    async fn exists_draft_for(&self, origin_id: Uuid) -> Result<bool, RepoError>;

    async fn list_adverts(
        &self,
        scope: AdvertListScope,
        owner_id: Option<Uuid>,
    ) -> Result<Vec<AdvertRecord>, RepoError>;
}

#[async_trait]
pub trait AdvertsWriteRepo: Send + Sync {
    /// Insert a canonical advert with the first workflow status for adverts,
    /// a waiting moderation outcome and an idle process status.
    async fn create_advert(&self, params: CreateAdvertParams) -> Result<AdvertRecord, RepoError>;

    /// Persist field mutations, applying the save-time auto-extension rule
    /// against the previously persisted availability.
    async fn save_advert(&self, advert: &AdvertRecord) -> Result<AdvertRecord, RepoError>;

    /// Partial-field write: flip `process_status` to `Check` and bump
    /// `updated_at` without re-saving anything else. The transition is
    /// guarded in the write itself; returns `false` when the row was
    /// already in `Check` or `Apply`, so concurrent submitters settle on
    /// exactly one transition.
    async fn mark_submitted(&self, id: Uuid) -> Result<bool, RepoError>;

    /// Atomically insert a draft row plus deep copies of the origin's
    /// estimates; a concurrent creator loses on the `origin_id` uniqueness
    /// constraint and surfaces as [`RepoError::Duplicate`].
    async fn create_draft(
        &self,
        draft: NewDraft,
        estimates: Vec<EstimateInput>,
    ) -> Result<AdvertRecord, RepoError>;

    /// Atomically merge a draft back onto its origin: re-fetch the draft
    /// scoped to `process_status = Apply` (no match is a no-op returning
    /// `None`), overwrite the origin's copyable fields, replace its
    /// estimates with the draft's (re-parented, not copied), delete the
    /// draft row, and return the updated origin.
    async fn apply_draft(&self, draft_id: Uuid) -> Result<Option<AdvertRecord>, RepoError>;
}

#[async_trait]
pub trait EstimatesRepo: Send + Sync {
    async fn list_estimates(
        &self,
        advert_id: Uuid,
    ) -> Result<Vec<AdvertEstimateRecord>, RepoError>;

    async fn replace_estimates(
        &self,
        advert_id: Uuid,
        items: Vec<EstimateInput>,
    ) -> Result<Vec<AdvertEstimateRecord>, RepoError>;
}

#[async_trait]
pub trait StatusesRepo: Send + Sync {
    /// The lowest-position status for an entity type, used at creation.
    async fn first_status_for(&self, entity_type: &str) -> Result<StatusRecord, RepoError>;
}

#[async_trait]
pub trait ModerationNotesRepo: Send + Sync {
    async fn append_note(&self, note: NewModerationNote)
    -> Result<ModerationNoteRecord, RepoError>;

    async fn list_notes(&self, advert_id: Uuid) -> Result<Vec<ModerationNoteRecord>, RepoError>;
}

#[async_trait]
pub trait EventsRepo: Send + Sync {
    async fn append_event(&self, event: NewAdvertEvent) -> Result<AdvertEventRecord, RepoError>;

    async fn list_events(&self, advert_id: Uuid) -> Result<Vec<AdvertEventRecord>, RepoError>;
}

#[derive(Debug, Clone)]
pub struct NewJobRecord {
    pub job_type: JobType,
    pub payload: serde_json::Value,
    pub run_at: OffsetDateTime,
    pub max_attempts: i32,
    pub priority: i32,
}

#[async_trait]
pub trait JobsRepo: Send + Sync {
    async fn enqueue_job(&self, job: NewJobRecord) -> Result<String, RepoError>;
}


//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::domain::types::{AdvertEventKind, ModerationOutcome, OwnerKind, ProcessStatus};

/// A fundraising advert. Canonical when `origin_id` is `None`, otherwise the
/// single draft shadow of the advert it references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvertRecord {
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

impl AdvertRecord {
    pub fn is_draft(&self) -> bool {
        self.origin_id.is_some()
    }
}

/// A budget line item belonging to exactly one advert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvertEstimateRecord {
    pub id: Uuid,
    pub advert_id: Uuid,
    pub title: String,
    pub amount: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// A workflow stage from the status vocabulary, scoped to an entity type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRecord {
    pub id: Uuid,
    pub entity_type: String,
    pub name: String,
    pub position: i32,
    pub created_at: OffsetDateTime,
}

/// A moderator's decision note, attached to the advert the decision is
/// logically about (the origin, when a draft was moderated).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModerationNoteRecord {
    pub id: Uuid,
    pub advert_id: Uuid,
    pub outcome: ModerationOutcome,
    pub note: String,
    pub created_by: Option<Uuid>,
    pub created_at: OffsetDateTime,
}

/// A timeline entry displayed on the advert page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvertEventRecord {
    pub id: Uuid,
    pub advert_id: Uuid,
    pub kind: AdvertEventKind,
    pub percent: i32,
    pub description: String,
    pub created_at: OffsetDateTime,
}

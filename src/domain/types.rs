//! Shared domain enumerations aligned with persisted database enums.

use serde::{Deserialize, Serialize};

/// Tri-state moderation outcome gating advert visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "moderation_outcome", rename_all = "snake_case")]
pub enum ModerationOutcome {
    Waiting,
    Allowed,
    Banned,
}

impl ModerationOutcome {
    /// Whether the advert is visible to the public feed.
    pub fn is_available(self) -> bool {
        matches!(self, ModerationOutcome::Allowed)
    }
}

/// Secondary state machine tracking an in-flight moderation-triggered action.
///
/// A draft moves `Idle -> Check -> Apply` and is deleted by the deferred
/// merge job; a denied draft drops back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "process_status", rename_all = "snake_case")]
pub enum ProcessStatus {
    Idle,
    Check,
    Apply,
    Done,
}

impl ProcessStatus {
    /// An advert with a submitted or approved-but-unmerged draft is mid-moderation.
    pub fn is_pending(self) -> bool {
        matches!(self, ProcessStatus::Check | ProcessStatus::Apply)
    }
}

/// Owner scoping discriminator used by the published/pending/drafts views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "owner_kind", rename_all = "snake_case")]
pub enum OwnerKind {
    Organization,
    Individual,
}

/// Timeline event kinds shown on an advert page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "advert_event_kind", rename_all = "snake_case")]
pub enum AdvertEventKind {
    Custom,
    AdvertCreated,
    AdvertEdited,
    UserJoined,
    PercentChanged,
    AdvertDone,
    PaymentReceived,
    ResourceReceived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    ApplyDraft,
}

impl JobType {
    pub fn as_str(self) -> &'static str {
        match self {
            JobType::ApplyDraft => "apply_draft",
        }
    }
}

impl TryFrom<&str> for JobType {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "apply_draft" => Ok(JobType::ApplyDraft),
            _ => Err(()),
        }
    }
}

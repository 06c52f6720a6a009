//! Advert field-copy and save rules shared by every storage backend.

use time::{Date, Duration, OffsetDateTime};
use uuid::Uuid;

use crate::domain::entities::AdvertRecord;
use crate::domain::types::{ModerationOutcome, OwnerKind};

/// Grace period granted when an advert leaves public availability without an
/// end date already set.
pub const CAMPAIGN_EXTENSION_DAYS: i64 = 60;

/// The statically-declared set of advert fields that travel between an origin
/// and its draft, in both directions.
///
/// Identity, the origin link, the workflow status, the moderation outcome,
/// the approval audit fields, the process status and the row timestamps are
/// structurally absent here, so they can never be copied by accident. A new
/// advert column must be added to this struct explicitly before drafts pick
/// it up.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftFields {
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
}

impl DraftFields {
    /// Snapshot the copyable fields of an advert.
    pub fn of(advert: &AdvertRecord) -> Self {
        Self {
            title: advert.title.clone(),
            category_id: advert.category_id,
            location_id: advert.location_id,
            logo: advert.logo.clone(),
            small_logo: advert.small_logo.clone(),
            video: advert.video.clone(),
            short_description: advert.short_description.clone(),
            description: advert.description.clone(),
            owner_id: advert.owner_id,
            owner_kind: advert.owner_kind,
            ended_at: advert.ended_at,
            total_amount: advert.total_amount,
            collected_amount: advert.collected_amount,
            charter: advert.charter.clone(),
            charter_approved: advert.charter_approved,
            registry_extract: advert.registry_extract.clone(),
            registry_extract_approved: advert.registry_extract_approved,
            meeting_minutes: advert.meeting_minutes.clone(),
            meeting_minutes_approved: advert.meeting_minutes_approved,
            auditor_id: advert.auditor_id,
            auditor_notes: advert.auditor_notes.clone(),
            auditor_approved: advert.auditor_approved,
        }
    }

    /// Overwrite the copyable fields of `target` with this snapshot, leaving
    /// every excluded field untouched.
    pub fn apply_to(self, target: &mut AdvertRecord) {
        target.title = self.title;
        target.category_id = self.category_id;
        target.location_id = self.location_id;
        target.logo = self.logo;
        target.small_logo = self.small_logo;
        target.video = self.video;
        target.short_description = self.short_description;
        target.description = self.description;
        target.owner_id = self.owner_id;
        target.owner_kind = self.owner_kind;
        target.ended_at = self.ended_at;
        target.total_amount = self.total_amount;
        target.collected_amount = self.collected_amount;
        target.charter = self.charter;
        target.charter_approved = self.charter_approved;
        target.registry_extract = self.registry_extract;
        target.registry_extract_approved = self.registry_extract_approved;
        target.meeting_minutes = self.meeting_minutes;
        target.meeting_minutes_approved = self.meeting_minutes_approved;
        target.auditor_id = self.auditor_id;
        target.auditor_notes = self.auditor_notes;
        target.auditor_approved = self.auditor_approved;
    }
}

/// Save-time adjustment evaluated on every persist, comparing the previously
/// persisted availability against the row being written: an advert leaving
/// availability without an end date is auto-extended by
/// [`CAMPAIGN_EXTENSION_DAYS`]. Applies uniformly to canonical and draft rows.
pub fn auto_extend_on_save(
    previous: Option<ModerationOutcome>,
    advert: &mut AdvertRecord,
    now: OffsetDateTime,
) {
    let Some(previous) = previous else {
        return;
    };

    if previous.is_available() && !advert.is_available.is_available() && advert.ended_at.is_none() {
        advert.ended_at = Some((now + Duration::days(CAMPAIGN_EXTENSION_DAYS)).date());
    }
}

/// Percentage of the funding goal reached, truncated to whole percents.
pub fn collected_percent(advert: &AdvertRecord) -> i32 {
    if advert.collected_amount == 0 || advert.total_amount == 0 {
        return 0;
    }
    (advert.collected_amount as f64 * 100.0 / advert.total_amount as f64) as i32
}

//! Moderation-outcome recording applied to an advert in memory.
//!
//! The generic voting mechanism lives outside this crate; what remains here
//! is the recorder that maps a moderator's decision onto the target row
//! without touching storage, so callers decide when (and whether) to commit.

use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::AdvertRecord;
use crate::domain::types::ModerationOutcome;

/// A moderator's verdict on an advert or draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Ban,
}

impl Verdict {
    pub fn outcome(self) -> ModerationOutcome {
        match self {
            Verdict::Allow => ModerationOutcome::Allowed,
            Verdict::Ban => ModerationOutcome::Banned,
        }
    }
}

/// A moderation decision with its accompanying note.
#[derive(Debug, Clone)]
pub struct ModerationDecision {
    pub verdict: Verdict,
    pub note: String,
    pub moderator_id: Option<Uuid>,
}

/// Record `decision` onto `advert` without persisting it.
pub fn record_decision(
    advert: &mut AdvertRecord,
    decision: &ModerationDecision,
    now: OffsetDateTime,
) -> ModerationOutcome {
    let outcome = decision.verdict.outcome();
    advert.is_available = outcome;

    if outcome == ModerationOutcome::Allowed {
        advert.approved_at = Some(now);
        advert.approved_by = decision.moderator_id;
    }

    outcome
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::domain::entities::AdvertRecord;
    use crate::domain::types::{OwnerKind, ProcessStatus};

    fn waiting_advert() -> AdvertRecord {
        let now = datetime!(2026-03-01 12:00 UTC);
        AdvertRecord {
            id: Uuid::new_v4(),
            title: String::new(),
            category_id: Uuid::new_v4(),
            location_id: None,
            logo: None,
            small_logo: None,
            video: String::new(),
            short_description: String::new(),
            description: String::new(),
            status_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            owner_kind: OwnerKind::Organization,
            origin_id: None,
            ended_at: None,
            total_amount: 0,
            collected_amount: 0,
            charter: None,
            charter_approved: None,
            registry_extract: None,
            registry_extract_approved: None,
            meeting_minutes: None,
            meeting_minutes_approved: None,
            auditor_id: None,
            auditor_notes: String::new(),
            auditor_approved: None,
            is_available: ModerationOutcome::Waiting,
            process_status: ProcessStatus::Idle,
            approved_at: None,
            approved_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn allow_records_outcome_and_audit_fields() {
        let mut advert = waiting_advert();
        let moderator = Uuid::new_v4();
        let now = datetime!(2026-03-02 09:00 UTC);

        let outcome = record_decision(
            &mut advert,
            &ModerationDecision {
                verdict: Verdict::Allow,
                note: "looks good".to_string(),
                moderator_id: Some(moderator),
            },
            now,
        );

        assert_eq!(outcome, ModerationOutcome::Allowed);
        assert_eq!(advert.is_available, ModerationOutcome::Allowed);
        assert_eq!(advert.approved_at, Some(now));
        assert_eq!(advert.approved_by, Some(moderator));
    }

    #[test]
    fn ban_leaves_approval_audit_untouched() {
        let mut advert = waiting_advert();
        let now = datetime!(2026-03-02 09:00 UTC);

        let outcome = record_decision(
            &mut advert,
            &ModerationDecision {
                verdict: Verdict::Ban,
                note: "missing documents".to_string(),
                moderator_id: None,
            },
            now,
        );

        assert_eq!(outcome, ModerationOutcome::Banned);
        assert_eq!(advert.approved_at, None);
        assert_eq!(advert.approved_by, None);
    }
}

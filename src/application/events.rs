//! Advert timeline publishing.
//!
//! Events are an explicit publish call made by the orchestrating service
//! after its transaction succeeds, never a side effect coupled to
//! persistence. Failures are logged and swallowed: the timeline is a
//! side-channel, not part of any transactional guarantee.

use tracing::warn;

use crate::application::repos::{EventsRepo, NewAdvertEvent};
use crate::domain::adverts::collected_percent;
use crate::domain::entities::AdvertRecord;
use crate::domain::types::AdvertEventKind;
use crate::util::amount::format_amount;

pub async fn publish_advert_event<E>(
    events: &E,
    advert: &AdvertRecord,
    kind: AdvertEventKind,
    description: impl Into<String>,
) where
    E: EventsRepo + ?Sized,
{
    let event = NewAdvertEvent {
        advert_id: advert.id,
        kind,
        percent: collected_percent(advert),
        description: format!(
            "{} ({} of {} collected)",
            description.into(),
            format_amount(advert.collected_amount),
            format_amount(advert.total_amount),
        ),
    };

    if let Err(err) = events.append_event(event).await {
        warn!(
            target = "application::events",
            advert_id = %advert.id,
            kind = ?kind,
            error = %err,
            "failed to append advert event"
        );
    }
}

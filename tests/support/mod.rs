//! In-memory repository backend mirroring the Postgres adapter semantics,
//! shared by the integration test suites.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use raccolta::application::drafts::DraftService;
use raccolta::application::merge::MergeService;
use raccolta::application::moderation::ModerationService;
use raccolta::application::repos::{
    AdvertListScope, AdvertsRepo, AdvertsWriteRepo, CreateAdvertParams, EstimateInput,
    EstimatesRepo, EventsRepo, JobsRepo, ModerationNotesRepo, NewAdvertEvent, NewDraft,
    NewJobRecord, NewModerationNote, RepoError, StatusesRepo,
};
use raccolta::domain::adverts::{DraftFields, auto_extend_on_save};
use raccolta::domain::entities::{
    AdvertEstimateRecord, AdvertEventRecord, AdvertRecord, ModerationNoteRecord, StatusRecord,
};
use raccolta::domain::moderation::{ModerationDecision, Verdict};
use raccolta::domain::types::{ModerationOutcome, OwnerKind, ProcessStatus};

#[derive(Default)]
struct State {
    adverts: HashMap<Uuid, AdvertRecord>,
    estimates: HashMap<Uuid, Vec<AdvertEstimateRecord>>,
    statuses: Vec<StatusRecord>,
    notes: Vec<ModerationNoteRecord>,
    events: Vec<AdvertEventRecord>,
    jobs: Vec<NewJobRecord>,
}

/// A single shared backend implementing every repository trait, the way the
/// Postgres adapter does.
#[derive(Default)]
pub struct MemoryRepositories {
    state: Mutex<State>,
}

impl MemoryRepositories {
    pub fn new() -> Arc<Self> {
        let now = OffsetDateTime::now_utc();
        let mut state = State::default();
        for (position, name) in ["preparation", "collecting", "realization", "finished"]
            .iter()
            .enumerate()
        {
            state.statuses.push(StatusRecord {
                id: Uuid::new_v4(),
                entity_type: "advert".to_string(),
                name: (*name).to_string(),
                position: position as i32,
                created_at: now,
            });
        }
        Arc::new(Self {
            state: Mutex::new(state),
        })
    }

    pub async fn enqueued_jobs(&self) -> Vec<NewJobRecord> {
        self.state.lock().await.jobs.clone()
    }

    pub async fn all_notes(&self) -> Vec<ModerationNoteRecord> {
        self.state.lock().await.notes.clone()
    }

    pub async fn all_events(&self) -> Vec<AdvertEventRecord> {
        self.state.lock().await.events.clone()
    }
}

#[async_trait]
impl AdvertsRepo for MemoryRepositories {
    async fn find_advert(&self, id: Uuid) -> Result<Option<AdvertRecord>, RepoError> {
        Ok(self.state.lock().await.adverts.get(&id).cloned())
    }

    async fn find_draft_of(&self, origin_id: Uuid) -> Result<Option<AdvertRecord>, RepoError> {
        Ok(self
            .state
            .lock()
            .await
            .adverts
            .values()
            .find(|advert| advert.origin_id == Some(origin_id))
            .cloned())
    }

    async fn exists_draft_for(&self, origin_id: Uuid) -> Result<bool, RepoError> {
        Ok(self
            .state
            .lock()
            .await
            .adverts
            .values()
            .any(|advert| advert.origin_id == Some(origin_id)))
    }

    async fn list_adverts(
        &self,
        scope: AdvertListScope,
        owner_id: Option<Uuid>,
    ) -> Result<Vec<AdvertRecord>, RepoError> {
        let state = self.state.lock().await;
        let mut matches: Vec<AdvertRecord> = state
            .adverts
            .values()
            .filter(|advert| matches_scope(advert, scope))
            .filter(|advert| owner_id.is_none_or(|owner| advert.owner_id == owner))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(matches)
    }
}

fn matches_scope(advert: &AdvertRecord, scope: AdvertListScope) -> bool {
    match scope {
        AdvertListScope::Published => {
            advert.origin_id.is_none()
                && advert.is_available == ModerationOutcome::Allowed
                && advert.owner_kind == OwnerKind::Organization
        }
        AdvertListScope::Pending => {
            advert.origin_id.is_none()
                && advert.is_available == ModerationOutcome::Waiting
                && advert.owner_kind == OwnerKind::Organization
        }
        AdvertListScope::Banned => {
            advert.origin_id.is_none() && advert.is_available == ModerationOutcome::Banned
        }
        AdvertListScope::Drafts => {
            advert.origin_id.is_some() && advert.owner_kind == OwnerKind::Organization
        }
    }
}

#[async_trait]
impl AdvertsWriteRepo for MemoryRepositories {
    async fn create_advert(&self, params: CreateAdvertParams) -> Result<AdvertRecord, RepoError> {
        let mut state = self.state.lock().await;
        let status = first_status(&state.statuses, "advert")?;
        let now = OffsetDateTime::now_utc();

        let advert = AdvertRecord {
            id: Uuid::new_v4(),
            title: params.title,
            category_id: params.category_id,
            location_id: params.location_id,
            logo: params.logo,
            small_logo: params.small_logo,
            video: params.video,
            short_description: params.short_description,
            description: params.description,
            status_id: status.id,
            owner_id: params.owner_id,
            owner_kind: params.owner_kind,
            origin_id: None,
            ended_at: params.ended_at,
            total_amount: params.total_amount,
            collected_amount: 0,
            charter: params.charter,
            charter_approved: None,
            registry_extract: params.registry_extract,
            registry_extract_approved: None,
            meeting_minutes: params.meeting_minutes,
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
        };

        state.adverts.insert(advert.id, advert.clone());
        Ok(advert)
    }

    async fn save_advert(&self, advert: &AdvertRecord) -> Result<AdvertRecord, RepoError> {
        let mut state = self.state.lock().await;
        let previous = state
            .adverts
            .get(&advert.id)
            .map(|existing| existing.is_available)
            .ok_or(RepoError::NotFound)?;

        let mut record = advert.clone();
        auto_extend_on_save(Some(previous), &mut record, OffsetDateTime::now_utc());
        state.adverts.insert(record.id, record.clone());
        Ok(record)
    }

    async fn mark_submitted(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut state = self.state.lock().await;
        let advert = state.adverts.get_mut(&id).ok_or(RepoError::NotFound)?;
        if advert.process_status.is_pending() {
            return Ok(false);
        }
        advert.process_status = ProcessStatus::Check;
        advert.updated_at = OffsetDateTime::now_utc();
        Ok(true)
    }

    async fn create_draft(
        &self,
        draft: NewDraft,
        estimates: Vec<EstimateInput>,
    ) -> Result<AdvertRecord, RepoError> {
        let mut state = self.state.lock().await;

        if state
            .adverts
            .values()
            .any(|advert| advert.origin_id == Some(draft.origin_id))
        {
            return Err(RepoError::Duplicate {
                constraint: "adverts_origin_id_key".to_string(),
            });
        }

        let now = OffsetDateTime::now_utc();
        let mut record = AdvertRecord {
            id: draft.id,
            title: String::new(),
            category_id: Uuid::nil(),
            location_id: None,
            logo: None,
            small_logo: None,
            video: String::new(),
            short_description: String::new(),
            description: String::new(),
            status_id: draft.status_id,
            owner_id: Uuid::nil(),
            owner_kind: OwnerKind::Organization,
            origin_id: Some(draft.origin_id),
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
        };
        draft.fields.apply_to(&mut record);

        let copies: Vec<AdvertEstimateRecord> = estimates
            .into_iter()
            .map(|item| AdvertEstimateRecord {
                id: Uuid::new_v4(),
                advert_id: record.id,
                title: item.title,
                amount: item.amount,
                created_at: now,
                updated_at: now,
            })
            .collect();

        state.adverts.insert(record.id, record.clone());
        state.estimates.insert(record.id, copies);
        Ok(record)
    }

    async fn apply_draft(&self, draft_id: Uuid) -> Result<Option<AdvertRecord>, RepoError> {
        let mut state = self.state.lock().await;

        let Some(draft) = state
            .adverts
            .get(&draft_id)
            .filter(|row| row.process_status == ProcessStatus::Apply)
            .cloned()
        else {
            return Ok(None);
        };

        let origin_id = draft.origin_id.ok_or_else(|| {
            RepoError::integrity(format!("draft {draft_id} has no origin advert"))
        })?;
        let origin = state
            .adverts
            .get(&origin_id)
            .cloned()
            .ok_or_else(|| RepoError::integrity(format!("origin {origin_id} vanished")))?;

        let now = OffsetDateTime::now_utc();
        let previous = origin.is_available;
        let mut merged = origin;
        DraftFields::of(&draft).apply_to(&mut merged);
        auto_extend_on_save(Some(previous), &mut merged, now);
        merged.updated_at = now;

        let reparented: Vec<AdvertEstimateRecord> = state
            .estimates
            .remove(&draft_id)
            .unwrap_or_default()
            .into_iter()
            .map(|mut estimate| {
                estimate.advert_id = origin_id;
                estimate
            })
            .collect();
        state.estimates.insert(origin_id, reparented);

        state.adverts.remove(&draft_id);
        state.adverts.insert(merged.id, merged.clone());
        Ok(Some(merged))
    }
}

#[async_trait]
impl EstimatesRepo for MemoryRepositories {
    async fn list_estimates(
        &self,
        advert_id: Uuid,
    ) -> Result<Vec<AdvertEstimateRecord>, RepoError> {
        Ok(self
            .state
            .lock()
            .await
            .estimates
            .get(&advert_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn replace_estimates(
        &self,
        advert_id: Uuid,
        items: Vec<EstimateInput>,
    ) -> Result<Vec<AdvertEstimateRecord>, RepoError> {
        let mut state = self.state.lock().await;
        if !state.adverts.contains_key(&advert_id) {
            return Err(RepoError::NotFound);
        }

        let now = OffsetDateTime::now_utc();
        let records: Vec<AdvertEstimateRecord> = items
            .into_iter()
            .map(|item| AdvertEstimateRecord {
                id: Uuid::new_v4(),
                advert_id,
                title: item.title,
                amount: item.amount,
                created_at: now,
                updated_at: now,
            })
            .collect();
        state.estimates.insert(advert_id, records.clone());
        Ok(records)
    }
}

fn first_status(statuses: &[StatusRecord], entity_type: &str) -> Result<StatusRecord, RepoError> {
    statuses
        .iter()
        .filter(|status| status.entity_type == entity_type)
        .min_by_key(|status| status.position)
        .cloned()
        .ok_or(RepoError::NotFound)
}

#[async_trait]
impl StatusesRepo for MemoryRepositories {
    async fn first_status_for(&self, entity_type: &str) -> Result<StatusRecord, RepoError> {
        let state = self.state.lock().await;
        first_status(&state.statuses, entity_type)
    }
}

#[async_trait]
impl ModerationNotesRepo for MemoryRepositories {
    async fn append_note(
        &self,
        note: NewModerationNote,
    ) -> Result<ModerationNoteRecord, RepoError> {
        let mut state = self.state.lock().await;
        let record = ModerationNoteRecord {
            id: Uuid::new_v4(),
            advert_id: note.advert_id,
            outcome: note.outcome,
            note: note.note,
            created_by: note.created_by,
            created_at: OffsetDateTime::now_utc(),
        };
        state.notes.push(record.clone());
        Ok(record)
    }

    async fn list_notes(&self, advert_id: Uuid) -> Result<Vec<ModerationNoteRecord>, RepoError> {
        Ok(self
            .state
            .lock()
            .await
            .notes
            .iter()
            .filter(|note| note.advert_id == advert_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EventsRepo for MemoryRepositories {
    async fn append_event(&self, event: NewAdvertEvent) -> Result<AdvertEventRecord, RepoError> {
        let mut state = self.state.lock().await;
        let record = AdvertEventRecord {
            id: Uuid::new_v4(),
            advert_id: event.advert_id,
            kind: event.kind,
            percent: event.percent,
            description: event.description,
            created_at: OffsetDateTime::now_utc(),
        };
        state.events.push(record.clone());
        Ok(record)
    }

    async fn list_events(&self, advert_id: Uuid) -> Result<Vec<AdvertEventRecord>, RepoError> {
        Ok(self
            .state
            .lock()
            .await
            .events
            .iter()
            .filter(|event| event.advert_id == advert_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl JobsRepo for MemoryRepositories {
    async fn enqueue_job(&self, job: NewJobRecord) -> Result<String, RepoError> {
        let mut state = self.state.lock().await;
        state.jobs.push(job);
        Ok(Uuid::new_v4().to_string())
    }
}

pub fn draft_service(repos: &Arc<MemoryRepositories>) -> DraftService {
    DraftService::new(
        repos.clone(),
        repos.clone(),
        repos.clone(),
        repos.clone(),
    )
}

pub fn moderation_service(repos: &Arc<MemoryRepositories>) -> ModerationService {
    ModerationService::new(repos.clone(), repos.clone(), repos.clone(), repos.clone())
}

pub fn merge_service(repos: &Arc<MemoryRepositories>) -> MergeService {
    MergeService::new(repos.clone(), repos.clone())
}

pub fn allow_decision() -> ModerationDecision {
    ModerationDecision {
        verdict: Verdict::Allow,
        note: "documents verified".to_string(),
        moderator_id: Some(Uuid::new_v4()),
    }
}

pub fn ban_decision() -> ModerationDecision {
    ModerationDecision {
        verdict: Verdict::Ban,
        note: "charter is missing a signature".to_string(),
        moderator_id: Some(Uuid::new_v4()),
    }
}

pub fn sample_create_params(owner_id: Uuid) -> CreateAdvertParams {
    CreateAdvertParams {
        title: "playground renovation".to_string(),
        category_id: Uuid::new_v4(),
        location_id: Some(Uuid::new_v4()),
        logo: Some("logos/playground.png".to_string()),
        small_logo: None,
        video: "https://youtu.be/abc123".to_string(),
        short_description: "new equipment for the yard".to_string(),
        description: "replace the rusted slide and swings".to_string(),
        owner_id,
        owner_kind: OwnerKind::Organization,
        ended_at: None,
        total_amount: 500_000,
        charter: Some("docs/charter.pdf".to_string()),
        registry_extract: None,
        meeting_minutes: None,
    }
}

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::engagement::domain::{
    EngagementEvent, Event, EventDraft, EventId, EventStatus, Participant, ParticipantId,
    Profile, UserId,
};
use crate::engagement::memory::InMemoryEngagementStore;
use crate::engagement::repository::{
    CascadeSummary, ChangeFeed, ChangeSubscription, EngagementStore, StoreError, Table,
};
use crate::engagement::service::{EngagementService, ServiceSettings};

pub(super) fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 14, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn event_draft() -> EventDraft {
    EventDraft {
        name: "Mindful Leadership Summit".to_string(),
        description: "Two days of workshops and talks".to_string(),
        start_date: at(9, 0),
        end_date: at(17, 30),
        location: Some("Main Hall".to_string()),
        status: EventStatus::Upcoming,
        organizer_id: UserId::from("organizer-1"),
    }
}

pub(super) fn profile(user: &str, name: &str, skills: &[&str], interests: &[&str]) -> Profile {
    Profile {
        user_id: UserId::from(user),
        full_name: name.to_string(),
        email: None,
        skills: skills.iter().map(|value| value.to_string()).collect::<BTreeSet<_>>(),
        interests: interests
            .iter()
            .map(|value| value.to_string())
            .collect::<BTreeSet<_>>(),
    }
}

pub(super) fn build_service() -> (
    EngagementService<InMemoryEngagementStore>,
    Arc<InMemoryEngagementStore>,
) {
    let store = Arc::new(InMemoryEngagementStore::new());
    let service = EngagementService::new(store.clone(), ServiceSettings::default());
    (service, store)
}

/// Service with one event and one joined participant.
pub(super) fn seeded_service() -> (
    EngagementService<InMemoryEngagementStore>,
    Arc<InMemoryEngagementStore>,
    Event,
    ParticipantId,
) {
    let (service, store) = build_service();
    let event = service.create_event(event_draft()).expect("event created");
    let participant = service
        .join_event(&event.id, &UserId::from("user-ada"))
        .expect("participant joins");
    (service, store, event, participant.participant_id)
}

pub(super) struct UnavailableStore {
    feed: ChangeFeed,
}

impl UnavailableStore {
    pub(super) fn new() -> Self {
        Self {
            feed: ChangeFeed::default(),
        }
    }

    fn offline<T>() -> Result<T, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

impl EngagementStore for UnavailableStore {
    fn append_event(&self, _event: EngagementEvent) -> Result<EngagementEvent, StoreError> {
        Self::offline()
    }

    fn events_for_participant(
        &self,
        _participant_id: &ParticipantId,
    ) -> Result<Vec<EngagementEvent>, StoreError> {
        Self::offline()
    }

    fn recent_events(&self, _limit: usize) -> Result<Vec<EngagementEvent>, StoreError> {
        Self::offline()
    }

    fn insert_participant(&self, _participant: Participant) -> Result<Participant, StoreError> {
        Self::offline()
    }

    fn update_participant(&self, _participant: Participant) -> Result<(), StoreError> {
        Self::offline()
    }

    fn fetch_participant(&self, _id: &ParticipantId) -> Result<Option<Participant>, StoreError> {
        Self::offline()
    }

    fn participants_for_event(&self, _event_id: &EventId) -> Result<Vec<Participant>, StoreError> {
        Self::offline()
    }

    fn insert_event(&self, _event: Event) -> Result<Event, StoreError> {
        Self::offline()
    }

    fn fetch_event(&self, _id: &EventId) -> Result<Option<Event>, StoreError> {
        Self::offline()
    }

    fn delete_event(&self, _id: &EventId) -> Result<CascadeSummary, StoreError> {
        Self::offline()
    }

    fn upsert_profile(&self, _profile: Profile) -> Result<Profile, StoreError> {
        Self::offline()
    }

    fn fetch_profile(&self, _user_id: &UserId) -> Result<Option<Profile>, StoreError> {
        Self::offline()
    }

    fn subscribe(&self, table: Table) -> ChangeSubscription {
        self.feed.subscribe(table)
    }
}

/// Store whose reads succeed from a seeded in-memory copy but whose log appends fail.
pub(super) struct AppendFailsStore {
    pub(super) inner: InMemoryEngagementStore,
}

impl EngagementStore for AppendFailsStore {
    fn append_event(&self, _event: EngagementEvent) -> Result<EngagementEvent, StoreError> {
        Err(StoreError::Unavailable("connection reset".to_string()))
    }

    fn events_for_participant(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Vec<EngagementEvent>, StoreError> {
        self.inner.events_for_participant(participant_id)
    }

    fn recent_events(&self, limit: usize) -> Result<Vec<EngagementEvent>, StoreError> {
        self.inner.recent_events(limit)
    }

    fn insert_participant(&self, participant: Participant) -> Result<Participant, StoreError> {
        self.inner.insert_participant(participant)
    }

    fn update_participant(&self, participant: Participant) -> Result<(), StoreError> {
        self.inner.update_participant(participant)
    }

    fn fetch_participant(&self, id: &ParticipantId) -> Result<Option<Participant>, StoreError> {
        self.inner.fetch_participant(id)
    }

    fn participants_for_event(&self, event_id: &EventId) -> Result<Vec<Participant>, StoreError> {
        self.inner.participants_for_event(event_id)
    }

    fn insert_event(&self, event: Event) -> Result<Event, StoreError> {
        self.inner.insert_event(event)
    }

    fn fetch_event(&self, id: &EventId) -> Result<Option<Event>, StoreError> {
        self.inner.fetch_event(id)
    }

    fn delete_event(&self, id: &EventId) -> Result<CascadeSummary, StoreError> {
        self.inner.delete_event(id)
    }

    fn upsert_profile(&self, profile: Profile) -> Result<Profile, StoreError> {
        self.inner.upsert_profile(profile)
    }

    fn fetch_profile(&self, user_id: &UserId) -> Result<Option<Profile>, StoreError> {
        self.inner.fetch_profile(user_id)
    }

    fn subscribe(&self, table: Table) -> ChangeSubscription {
        self.inner.subscribe(table)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

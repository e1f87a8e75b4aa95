use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    EngagementEvent, Event, EventId, Participant, ParticipantId, Profile, UserId,
};
use super::repository::{
    CascadeSummary, ChangeFeed, ChangeKind, ChangeNotification, ChangeSubscription,
    EngagementStore, StoreError, Table,
};

#[derive(Default)]
struct Tables {
    events: HashMap<EventId, Event>,
    participants: BTreeMap<ParticipantId, Participant>,
    engagement_log: Vec<EngagementEvent>,
    profiles: HashMap<UserId, Profile>,
}

impl Tables {
    fn event_of(&self, participant_id: &ParticipantId) -> Option<EventId> {
        self.participants
            .get(participant_id)
            .map(|participant| participant.event_id.clone())
    }
}

/// Process-local store used by the service binary, the demo, and tests.
#[derive(Clone, Default)]
pub struct InMemoryEngagementStore {
    tables: Arc<Mutex<Tables>>,
    feed: ChangeFeed,
}

impl InMemoryEngagementStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(feed: ChangeFeed) -> Self {
        Self {
            tables: Arc::default(),
            feed,
        }
    }

    pub fn engagement_log_len(&self) -> Result<usize, StoreError> {
        Ok(self.tables()?.engagement_log.len())
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory tables poisoned".to_string()))
    }

    fn notify(&self, table: Table, kind: ChangeKind, record_id: &str, event_id: Option<EventId>) {
        self.feed.publish(ChangeNotification {
            table,
            kind,
            record_id: record_id.to_string(),
            event_id,
        });
    }
}

impl EngagementStore for InMemoryEngagementStore {
    fn append_event(&self, event: EngagementEvent) -> Result<EngagementEvent, StoreError> {
        let event_id = {
            let mut tables = self.tables()?;
            if tables.engagement_log.iter().any(|row| row.id == event.id) {
                return Err(StoreError::Conflict);
            }
            tables.engagement_log.push(event.clone());
            tables.event_of(&event.participant_id)
        };
        self.notify(
            Table::EngagementLogs,
            ChangeKind::Insert,
            event.id.as_str(),
            event_id,
        );
        Ok(event)
    }

    fn events_for_participant(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Vec<EngagementEvent>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .engagement_log
            .iter()
            .filter(|row| &row.participant_id == participant_id)
            .cloned()
            .collect())
    }

    fn recent_events(&self, limit: usize) -> Result<Vec<EngagementEvent>, StoreError> {
        let tables = self.tables()?;
        let mut rows: Vec<EngagementEvent> = tables.engagement_log.iter().rev().cloned().collect();
        rows.sort_by(|left, right| right.occurred_at.cmp(&left.occurred_at));
        rows.truncate(limit);
        Ok(rows)
    }

    fn insert_participant(&self, participant: Participant) -> Result<Participant, StoreError> {
        {
            let mut tables = self.tables()?;
            if !tables.events.contains_key(&participant.event_id) {
                return Err(StoreError::NotFound);
            }
            let duplicate = tables.participants.contains_key(&participant.id)
                || tables.participants.values().any(|existing| {
                    existing.event_id == participant.event_id
                        && existing.user_id == participant.user_id
                });
            if duplicate {
                return Err(StoreError::Conflict);
            }
            tables
                .participants
                .insert(participant.id.clone(), participant.clone());
        }
        self.notify(
            Table::Participants,
            ChangeKind::Insert,
            participant.id.as_str(),
            Some(participant.event_id.clone()),
        );
        Ok(participant)
    }

    fn update_participant(&self, participant: Participant) -> Result<(), StoreError> {
        let id = participant.id.clone();
        let event_id = participant.event_id.clone();
        {
            let mut tables = self.tables()?;
            match tables.participants.get_mut(&id) {
                Some(slot) => *slot = participant,
                None => return Err(StoreError::NotFound),
            }
        }
        self.notify(
            Table::Participants,
            ChangeKind::Update,
            id.as_str(),
            Some(event_id),
        );
        Ok(())
    }

    fn fetch_participant(&self, id: &ParticipantId) -> Result<Option<Participant>, StoreError> {
        let tables = self.tables()?;
        Ok(tables.participants.get(id).cloned())
    }

    fn participants_for_event(&self, event_id: &EventId) -> Result<Vec<Participant>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .participants
            .values()
            .filter(|participant| &participant.event_id == event_id)
            .cloned()
            .collect())
    }

    fn insert_event(&self, event: Event) -> Result<Event, StoreError> {
        {
            let mut tables = self.tables()?;
            if tables.events.contains_key(&event.id) {
                return Err(StoreError::Conflict);
            }
            tables.events.insert(event.id.clone(), event.clone());
        }
        self.notify(
            Table::Events,
            ChangeKind::Insert,
            event.id.as_str(),
            Some(event.id.clone()),
        );
        Ok(event)
    }

    fn fetch_event(&self, id: &EventId) -> Result<Option<Event>, StoreError> {
        let tables = self.tables()?;
        Ok(tables.events.get(id).cloned())
    }

    fn delete_event(&self, id: &EventId) -> Result<CascadeSummary, StoreError> {
        let removed_participants: Vec<ParticipantId>;
        let engagement_events;
        {
            let mut tables = self.tables()?;
            if tables.events.remove(id).is_none() {
                return Err(StoreError::NotFound);
            }

            removed_participants = tables
                .participants
                .values()
                .filter(|participant| &participant.event_id == id)
                .map(|participant| participant.id.clone())
                .collect();
            for participant_id in &removed_participants {
                tables.participants.remove(participant_id);
            }

            let before = tables.engagement_log.len();
            tables
                .engagement_log
                .retain(|row| !removed_participants.contains(&row.participant_id));
            engagement_events = before - tables.engagement_log.len();
        }

        for participant_id in &removed_participants {
            self.notify(
                Table::Participants,
                ChangeKind::Delete,
                participant_id.as_str(),
                Some(id.clone()),
            );
        }
        self.notify(Table::Events, ChangeKind::Delete, id.as_str(), Some(id.clone()));

        Ok(CascadeSummary {
            participants: removed_participants.len(),
            engagement_events,
        })
    }

    fn upsert_profile(&self, profile: Profile) -> Result<Profile, StoreError> {
        let kind = {
            let mut tables = self.tables()?;
            match tables
                .profiles
                .insert(profile.user_id.clone(), profile.clone())
            {
                Some(_) => ChangeKind::Update,
                None => ChangeKind::Insert,
            }
        };
        self.notify(Table::Profiles, kind, profile.user_id.as_str(), None);
        Ok(profile)
    }

    fn fetch_profile(&self, user_id: &UserId) -> Result<Option<Profile>, StoreError> {
        let tables = self.tables()?;
        Ok(tables.profiles.get(user_id).cloned())
    }

    fn subscribe(&self, table: Table) -> ChangeSubscription {
        self.feed.subscribe(table)
    }
}

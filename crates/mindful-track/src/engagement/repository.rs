use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::warn;

use super::domain::{
    EngagementEvent, Event, EventId, Participant, ParticipantId, Profile, UserId,
};

/// Storage abstraction over the hosted tables so the service can be exercised in isolation.
///
/// Each call is a single operation; implementations must make every write atomic on its own
/// and publish a [`ChangeNotification`] once it is visible.
pub trait EngagementStore: Send + Sync {
    fn append_event(&self, event: EngagementEvent) -> Result<EngagementEvent, StoreError>;
    fn events_for_participant(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Vec<EngagementEvent>, StoreError>;
    /// Most recent rows first by `occurred_at`.
    fn recent_events(&self, limit: usize) -> Result<Vec<EngagementEvent>, StoreError>;

    /// Fails with [`StoreError::NotFound`] when the event does not exist and with
    /// [`StoreError::Conflict`] when the user already participates in it.
    fn insert_participant(&self, participant: Participant) -> Result<Participant, StoreError>;
    fn update_participant(&self, participant: Participant) -> Result<(), StoreError>;
    fn fetch_participant(&self, id: &ParticipantId) -> Result<Option<Participant>, StoreError>;
    fn participants_for_event(&self, event_id: &EventId) -> Result<Vec<Participant>, StoreError>;

    fn insert_event(&self, event: Event) -> Result<Event, StoreError>;
    fn fetch_event(&self, id: &EventId) -> Result<Option<Event>, StoreError>;
    /// Removes the event together with its participants and their engagement rows.
    fn delete_event(&self, id: &EventId) -> Result<CascadeSummary, StoreError>;

    fn upsert_profile(&self, profile: Profile) -> Result<Profile, StoreError>;
    fn fetch_profile(&self, user_id: &UserId) -> Result<Option<Profile>, StoreError>;

    fn subscribe(&self, table: Table) -> ChangeSubscription;
}

/// Error enumeration for storage failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Rows removed by a cascading event delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeSummary {
    pub participants: usize,
    pub engagement_events: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Events,
    Participants,
    EngagementLogs,
    Profiles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotification {
    pub table: Table,
    pub kind: ChangeKind,
    pub record_id: String,
    /// Event the changed row belongs to, when the store can tell.
    pub event_id: Option<EventId>,
}

/// Fan-out of change notifications to any number of subscribers.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeNotification>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishing without subscribers is not an error.
    pub fn publish(&self, notification: ChangeNotification) {
        let _ = self.sender.send(notification);
    }

    pub fn subscribe(&self, table: Table) -> ChangeSubscription {
        ChangeSubscription {
            table,
            event_id: None,
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Receiver filtered to one table and, optionally, one event.
///
/// Delivery is best effort: a subscriber that falls behind skips the notifications it missed
/// and continues with newer ones.
#[derive(Debug)]
pub struct ChangeSubscription {
    table: Table,
    event_id: Option<EventId>,
    receiver: broadcast::Receiver<ChangeNotification>,
}

impl ChangeSubscription {
    pub fn for_event(mut self, event_id: EventId) -> Self {
        self.event_id = Some(event_id);
        self
    }

    pub fn table(&self) -> Table {
        self.table
    }

    fn accepts(&self, notification: &ChangeNotification) -> bool {
        if notification.table != self.table {
            return false;
        }
        match &self.event_id {
            Some(expected) => notification.event_id.as_ref() == Some(expected),
            None => true,
        }
    }

    /// Waits for the next matching notification; `None` once the feed is closed.
    pub async fn recv(&mut self) -> Option<ChangeNotification> {
        loop {
            match self.receiver.recv().await {
                Ok(notification) if self.accepts(&notification) => return Some(notification),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(table = ?self.table, skipped, "change subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next matching notification already queued, without waiting.
    pub fn try_recv(&mut self) -> Option<ChangeNotification> {
        loop {
            match self.receiver.try_recv() {
                Ok(notification) if self.accepts(&notification) => return Some(notification),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(table = ?self.table, skipped, "change subscriber lagged");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(table: Table, event: &str) -> ChangeNotification {
        ChangeNotification {
            table,
            kind: ChangeKind::Insert,
            record_id: "row-1".to_string(),
            event_id: Some(EventId::from(event)),
        }
    }

    #[test]
    fn subscription_filters_by_table_and_event() {
        let feed = ChangeFeed::new(8);
        let mut participants = feed
            .subscribe(Table::Participants)
            .for_event(EventId::from("evt-a"));

        feed.publish(notification(Table::EngagementLogs, "evt-a"));
        feed.publish(notification(Table::Participants, "evt-b"));
        feed.publish(notification(Table::Participants, "evt-a"));

        let received = participants.try_recv().expect("matching notification");
        assert_eq!(received.event_id, Some(EventId::from("evt-a")));
        assert!(participants.try_recv().is_none());
    }

    #[test]
    fn lagging_subscriber_keeps_receiving() {
        let feed = ChangeFeed::new(2);
        let mut logs = feed.subscribe(Table::EngagementLogs);

        for _ in 0..5 {
            feed.publish(notification(Table::EngagementLogs, "evt-a"));
        }

        assert!(logs.try_recv().is_some());
        assert!(logs.try_recv().is_some());
        assert!(logs.try_recv().is_none());
    }

    #[test]
    fn publishing_without_subscribers_is_silent() {
        let feed = ChangeFeed::default();
        feed.publish(notification(Table::Events, "evt-a"));
    }
}

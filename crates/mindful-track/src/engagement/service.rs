use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::domain::{
    ActivityFeedEntry, ActivityPayload, EngagementEvent, EngagementEventId, Event, EventDraft, EventId,
    NewEngagementEvent, Participant, ParticipantId, ParticipantStatus, ParticipantView, Profile,
    SessionId, UserId,
};
use super::matching::{rank_mentors, MentorMatch, MentorProfile, DEFAULT_MATCH_LIMIT};
use super::repository::{
    CascadeSummary, ChangeSubscription, EngagementStore, StoreError, Table,
};
use super::scoring::{aggregate, CategoryTargets, EngagementCalculator, ScoreWeights, ScoringError};

pub const DEFAULT_RECENT_ACTIVITY_LIMIT: usize = 10;

/// Tunables for scoring and list sizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServiceSettings {
    pub weights: ScoreWeights,
    pub targets: CategoryTargets,
    pub recent_activity_limit: usize,
    pub mentor_match_limit: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            targets: CategoryTargets::default(),
            recent_activity_limit: DEFAULT_RECENT_ACTIVITY_LIMIT,
            mentor_match_limit: DEFAULT_MATCH_LIMIT,
        }
    }
}

/// Service composing the engagement store, score calculator, and mentor ranking.
pub struct EngagementService<S> {
    store: Arc<S>,
    calculator: EngagementCalculator,
    settings: ServiceSettings,
}

static EVENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static PARTICIPANT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static ENGAGEMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_event_id() -> EventId {
    let id = EVENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    EventId(format!("evt-{id:06}"))
}

fn next_participant_id() -> ParticipantId {
    let id = PARTICIPANT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ParticipantId(format!("ptc-{id:06}"))
}

fn next_engagement_event_id() -> EngagementEventId {
    let id = ENGAGEMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    EngagementEventId(format!("log-{id:06}"))
}

impl<S> EngagementService<S>
where
    S: EngagementStore + 'static,
{
    pub fn new(store: Arc<S>, settings: ServiceSettings) -> Self {
        Self {
            store,
            calculator: EngagementCalculator::new(settings.weights),
            settings,
        }
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn calculator(&self) -> &EngagementCalculator {
        &self.calculator
    }

    /// Append one activity to the engagement log.
    ///
    /// Not idempotent: submitting the same activity twice stores two rows. Store failures are
    /// returned as-is and never retried here.
    pub fn log_engagement(
        &self,
        request: NewEngagementEvent,
    ) -> Result<EngagementEvent, EngagementServiceError> {
        request
            .activity
            .validate()
            .map_err(EngagementServiceError::InvalidInput)?;
        self.require_participant(&request.participant_id)?;

        let activity_type = request.activity.activity_type();
        let event = EngagementEvent {
            id: next_engagement_event_id(),
            participant_id: request.participant_id,
            session_id: request.session_id,
            points: request
                .points
                .unwrap_or_else(|| activity_type.default_points()),
            activity: request.activity,
            occurred_at: request.occurred_at.unwrap_or_else(Utc::now),
        };

        let stored = self.store.append_event(event).map_err(|err| {
            warn!(error = %err, %activity_type, "failed to log engagement");
            err
        })?;
        info!(
            participant = %stored.participant_id,
            %activity_type,
            points = stored.points,
            "engagement logged"
        );
        Ok(stored)
    }

    pub fn check_in(
        &self,
        participant_id: &ParticipantId,
        session_id: &SessionId,
    ) -> Result<EngagementEvent, EngagementServiceError> {
        self.log_engagement(
            NewEngagementEvent::new(participant_id.clone(), ActivityPayload::Checkin)
                .in_session(session_id.clone()),
        )
    }

    pub fn download_resource(
        &self,
        participant_id: &ParticipantId,
        resource_id: &str,
        session_id: Option<&SessionId>,
    ) -> Result<EngagementEvent, EngagementServiceError> {
        let mut request = NewEngagementEvent::new(
            participant_id.clone(),
            ActivityPayload::ResourceDownload {
                resource_id: resource_id.to_string(),
            },
        );
        request.session_id = session_id.cloned();
        self.log_engagement(request)
    }

    pub fn submit_feedback(
        &self,
        participant_id: &ParticipantId,
        session_id: &SessionId,
        rating: u8,
        comment: Option<String>,
    ) -> Result<EngagementEvent, EngagementServiceError> {
        self.log_engagement(
            NewEngagementEvent::new(
                participant_id.clone(),
                ActivityPayload::Feedback { rating, comment },
            )
            .in_session(session_id.clone()),
        )
    }

    /// Register a user for an event with zeroed sub-scores.
    pub fn join_event(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<ParticipantView, EngagementServiceError> {
        self.event(event_id)?;

        let participant = Participant::registered(
            next_participant_id(),
            user_id.clone(),
            event_id.clone(),
            Utc::now(),
        );
        let stored = self
            .store
            .insert_participant(participant)
            .map_err(|err| match err {
                StoreError::NotFound => {
                    EngagementServiceError::NotFound(format!("event {event_id}"))
                }
                other => other.into(),
            })?;
        info!(event = %event_id, user = %user_id, participant = %stored.id, "participant joined");
        Ok(stored.view(&self.calculator)?)
    }

    /// Recompute the participant's sub-scores from the full engagement log.
    pub fn refresh_scores(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<ParticipantView, EngagementServiceError> {
        let mut participant = self.require_participant(participant_id)?;
        let events = self.store.events_for_participant(participant_id)?;

        let scores = aggregate(&events, &self.settings.targets);
        participant.apply_sub_scores(scores, Utc::now());
        if participant.status == ParticipantStatus::Registered && !events.is_empty() {
            participant.status = ParticipantStatus::Active;
        }

        let view = participant.view(&self.calculator)?;
        self.store.update_participant(participant)?;
        debug!(
            participant = %participant_id,
            engagement_score = view.engagement_score,
            "scores refreshed"
        );
        Ok(view)
    }

    pub fn participant(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<ParticipantView, EngagementServiceError> {
        let participant = self.require_participant(participant_id)?;
        Ok(participant.view(&self.calculator)?)
    }

    /// Participants of an event, highest engagement score first.
    pub fn leaderboard(
        &self,
        event_id: &EventId,
    ) -> Result<Vec<ParticipantView>, EngagementServiceError> {
        self.event(event_id)?;

        let mut views = self
            .store
            .participants_for_event(event_id)?
            .iter()
            .map(|participant| participant.view(&self.calculator))
            .collect::<Result<Vec<_>, ScoringError>>()?;
        views.sort_by(|left, right| right.engagement_score.total_cmp(&left.engagement_score));
        Ok(views)
    }

    /// Newest rows first, each joined with its participant's user and profile.
    pub fn recent_activity(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<ActivityFeedEntry>, EngagementServiceError> {
        let limit = limit.unwrap_or(self.settings.recent_activity_limit);
        let rows = self.store.recent_events(limit)?;

        let mut owners: HashMap<ParticipantId, (Option<UserId>, Option<Profile>)> =
            HashMap::new();
        let mut feed = Vec::with_capacity(rows.len());
        for event in rows {
            if !owners.contains_key(&event.participant_id) {
                let user_id = self
                    .store
                    .fetch_participant(&event.participant_id)?
                    .map(|participant| participant.user_id);
                let profile = match &user_id {
                    Some(user_id) => self.store.fetch_profile(user_id)?,
                    None => None,
                };
                owners.insert(event.participant_id.clone(), (user_id, profile));
            }

            let (user_id, profile) = owners
                .get(&event.participant_id)
                .cloned()
                .unwrap_or_default();
            feed.push(ActivityFeedEntry {
                event,
                user_id,
                full_name: profile.as_ref().map(|profile| profile.full_name.clone()),
                email: profile.and_then(|profile| profile.email),
            });
        }
        Ok(feed)
    }

    pub fn participant_activity(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Vec<EngagementEvent>, EngagementServiceError> {
        self.require_participant(participant_id)?;
        Ok(self.store.events_for_participant(participant_id)?)
    }

    /// Rank the other participants of the same event as mentors for `participant_id`.
    pub fn recommend_mentors(
        &self,
        participant_id: &ParticipantId,
        limit: Option<usize>,
    ) -> Result<Vec<MentorMatch>, EngagementServiceError> {
        let participant = self.require_participant(participant_id)?;
        let Some(profile) = self.store.fetch_profile(&participant.user_id)? else {
            debug!(participant = %participant_id, "no profile, skipping mentor matching");
            return Ok(Vec::new());
        };
        let query = MentorProfile::from_profile(participant.id.clone(), &profile);

        let mut pool = Vec::new();
        for candidate in self.store.participants_for_event(&participant.event_id)? {
            if candidate.id == participant.id {
                continue;
            }
            if let Some(profile) = self.store.fetch_profile(&candidate.user_id)? {
                pool.push(MentorProfile::from_profile(candidate.id, &profile));
            }
        }

        let limit = limit.unwrap_or(self.settings.mentor_match_limit);
        Ok(rank_mentors(&query, &pool, limit))
    }

    pub fn upsert_profile(&self, profile: Profile) -> Result<Profile, EngagementServiceError> {
        if profile.full_name.trim().is_empty() {
            return Err(EngagementServiceError::InvalidInput(
                "full_name must not be empty".to_string(),
            ));
        }
        Ok(self.store.upsert_profile(profile)?)
    }

    pub fn profile(&self, user_id: &UserId) -> Result<Profile, EngagementServiceError> {
        self.store
            .fetch_profile(user_id)?
            .ok_or_else(|| EngagementServiceError::NotFound(format!("profile {user_id}")))
    }

    pub fn create_event(&self, draft: EventDraft) -> Result<Event, EngagementServiceError> {
        draft
            .validate()
            .map_err(EngagementServiceError::InvalidInput)?;
        let event = self
            .store
            .insert_event(Event::from_draft(next_event_id(), draft))?;
        info!(event = %event.id, name = %event.name, "event created");
        Ok(event)
    }

    pub fn event(&self, event_id: &EventId) -> Result<Event, EngagementServiceError> {
        self.store
            .fetch_event(event_id)?
            .ok_or_else(|| EngagementServiceError::NotFound(format!("event {event_id}")))
    }

    /// Copy every field of an event under a fresh identifier.
    pub fn clone_event(&self, event_id: &EventId) -> Result<Event, EngagementServiceError> {
        let source = self.event(event_id)?;
        let copy = self
            .store
            .insert_event(Event::from_draft(next_event_id(), source.to_draft()))?;
        info!(source = %event_id, event = %copy.id, "event cloned");
        Ok(copy)
    }

    pub fn delete_event(&self, event_id: &EventId) -> Result<CascadeSummary, EngagementServiceError> {
        let summary = self.store.delete_event(event_id).map_err(|err| match err {
            StoreError::NotFound => EngagementServiceError::NotFound(format!("event {event_id}")),
            other => other.into(),
        })?;
        info!(
            event = %event_id,
            participants = summary.participants,
            engagement_events = summary.engagement_events,
            "event deleted"
        );
        Ok(summary)
    }

    pub fn subscribe(&self, table: Table) -> ChangeSubscription {
        self.store.subscribe(table)
    }

    fn require_participant(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Participant, EngagementServiceError> {
        self.store
            .fetch_participant(participant_id)?
            .ok_or_else(|| {
                EngagementServiceError::NotFound(format!("participant {participant_id}"))
            })
    }
}

/// Error raised by the engagement service.
#[derive(Debug, thiserror::Error)]
pub enum EngagementServiceError {
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

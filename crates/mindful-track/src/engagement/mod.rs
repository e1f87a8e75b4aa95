//! Engagement tracking for event participants.
//!
//! Activity is appended to an engagement log through [`EngagementService`], aggregated into
//! percentage sub-scores per category, and combined into a weighted engagement score. Storage
//! is reached only through the [`EngagementStore`] trait so the service can be exercised
//! against the in-memory store or a failing double.

pub mod domain;
pub mod matching;
pub mod memory;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ActivityCategory, ActivityFeedEntry, ActivityPayload, ActivityType, EngagementEvent, EngagementEventId, Event,
    EventDraft, EventId, EventStatus, NewEngagementEvent, Participant, ParticipantId,
    ParticipantStatus, ParticipantView, Profile, SessionId, UserId,
};
pub use matching::{rank_mentors, MentorMatch, MentorProfile, DEFAULT_MATCH_LIMIT};
pub use memory::InMemoryEngagementStore;
pub use repository::{
    ChangeFeed, ChangeKind, ChangeNotification, ChangeSubscription, EngagementStore, StoreError,
    Table,
};
pub use router::engagement_router;
pub use scoring::{
    aggregate, calculate, CategoryTargets, EngagementCalculator, ScoreWeights, ScoringError,
    SubScores,
};
pub use service::{EngagementService, EngagementServiceError, ServiceSettings};

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::scoring::{EngagementCalculator, ScoringError, SubScores};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(
    /// Identifier of a real-world gathering.
    EventId
);
string_id!(
    /// Identifier of a user's membership in one event.
    ParticipantId
);
string_id!(
    /// Identifier of the authenticated account behind a participant.
    UserId
);
string_id!(
    /// Identifier of a session within an event.
    SessionId
);
string_id!(
    /// Identifier assigned to each appended engagement log row.
    EngagementEventId
);

/// Fixed vocabulary of tracked activities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Checkin,
    ResourceDownload,
    Feedback,
    QrScan,
    NfcScan,
    NfcBoothVisit,
    PageVisit,
    BrowserClick,
}

impl ActivityType {
    pub const ALL: [ActivityType; 8] = [
        ActivityType::Checkin,
        ActivityType::ResourceDownload,
        ActivityType::Feedback,
        ActivityType::QrScan,
        ActivityType::NfcScan,
        ActivityType::NfcBoothVisit,
        ActivityType::PageVisit,
        ActivityType::BrowserClick,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ActivityType::Checkin => "checkin",
            ActivityType::ResourceDownload => "resource_download",
            ActivityType::Feedback => "feedback",
            ActivityType::QrScan => "qr_scan",
            ActivityType::NfcScan => "nfc_scan",
            ActivityType::NfcBoothVisit => "nfc_booth_visit",
            ActivityType::PageVisit => "page_visit",
            ActivityType::BrowserClick => "browser_click",
        }
    }

    /// Sub-score bucket the activity's points accumulate into.
    pub const fn category(self) -> ActivityCategory {
        match self {
            ActivityType::Checkin
            | ActivityType::QrScan
            | ActivityType::NfcScan
            | ActivityType::NfcBoothVisit => ActivityCategory::Attendance,
            ActivityType::Feedback | ActivityType::PageVisit | ActivityType::BrowserClick => {
                ActivityCategory::Participation
            }
            ActivityType::ResourceDownload => ActivityCategory::Resources,
        }
    }

    /// Points awarded when the caller does not supply its own value.
    pub const fn default_points(self) -> u32 {
        match self {
            ActivityType::Checkin => 10,
            ActivityType::ResourceDownload => 5,
            ActivityType::Feedback => 15,
            ActivityType::QrScan | ActivityType::NfcScan => 10,
            ActivityType::NfcBoothVisit => 8,
            ActivityType::PageVisit | ActivityType::BrowserClick => 1,
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityCategory {
    Attendance,
    Participation,
    Resources,
}

impl ActivityCategory {
    pub const fn label(self) -> &'static str {
        match self {
            ActivityCategory::Attendance => "attendance",
            ActivityCategory::Participation => "participation",
            ActivityCategory::Resources => "resources",
        }
    }
}

impl fmt::Display for ActivityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Activity metadata, one shape per activity type.
///
/// The activity type is carried by the variant itself, so a feedback row can never hold a
/// scanned payload and vice versa. On the wire the variant becomes `activity_type` and its
/// fields become `metadata`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "activity_type", content = "metadata", rename_all = "snake_case")]
pub enum ActivityPayload {
    Checkin,
    ResourceDownload {
        resource_id: String,
    },
    Feedback {
        rating: u8,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        comment: Option<String>,
    },
    QrScan {
        scanned: String,
    },
    NfcScan {
        scanned: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        serial_number: Option<String>,
    },
    NfcBoothVisit {
        booth_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scanned: Option<String>,
    },
    PageVisit {
        path: String,
    },
    BrowserClick {
        target: String,
    },
}

impl ActivityPayload {
    pub const fn activity_type(&self) -> ActivityType {
        match self {
            ActivityPayload::Checkin => ActivityType::Checkin,
            ActivityPayload::ResourceDownload { .. } => ActivityType::ResourceDownload,
            ActivityPayload::Feedback { .. } => ActivityType::Feedback,
            ActivityPayload::QrScan { .. } => ActivityType::QrScan,
            ActivityPayload::NfcScan { .. } => ActivityType::NfcScan,
            ActivityPayload::NfcBoothVisit { .. } => ActivityType::NfcBoothVisit,
            ActivityPayload::PageVisit { .. } => ActivityType::PageVisit,
            ActivityPayload::BrowserClick { .. } => ActivityType::BrowserClick,
        }
    }

    /// Checks the payload-specific constraints, returning a reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            ActivityPayload::Checkin => Ok(()),
            ActivityPayload::ResourceDownload { resource_id } => {
                require_text("resource_id", resource_id)
            }
            ActivityPayload::Feedback { rating, .. } => {
                if (1..=5).contains(rating) {
                    Ok(())
                } else {
                    Err(format!("feedback rating must be between 1 and 5 (got {rating})"))
                }
            }
            ActivityPayload::QrScan { scanned } | ActivityPayload::NfcScan { scanned, .. } => {
                require_text("scanned", scanned)
            }
            ActivityPayload::NfcBoothVisit { booth_id, .. } => require_text("booth_id", booth_id),
            ActivityPayload::PageVisit { path } => require_text("path", path),
            ActivityPayload::BrowserClick { target } => require_text("target", target),
        }
    }
}

fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{field} must not be empty"))
    } else {
        Ok(())
    }
}

/// Ingestion request for a single tracked activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEngagementEvent {
    pub participant_id: ParticipantId,
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(flatten)]
    pub activity: ActivityPayload,
    /// Overrides the activity type's default points.
    #[serde(default)]
    pub points: Option<u32>,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
}

impl NewEngagementEvent {
    pub fn new(participant_id: ParticipantId, activity: ActivityPayload) -> Self {
        Self {
            participant_id,
            session_id: None,
            activity,
            points: None,
            occurred_at: None,
        }
    }

    pub fn in_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn with_points(mut self, points: u32) -> Self {
        self.points = Some(points);
        self
    }
}

/// Immutable row of the engagement log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementEvent {
    pub id: EngagementEventId,
    pub participant_id: ParticipantId,
    pub session_id: Option<SessionId>,
    #[serde(flatten)]
    pub activity: ActivityPayload,
    pub points: u32,
    pub occurred_at: DateTime<Utc>,
}

impl EngagementEvent {
    pub fn activity_type(&self) -> ActivityType {
        self.activity.activity_type()
    }
}

/// Engagement row joined with the participant and profile it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityFeedEntry {
    #[serde(flatten)]
    pub event: EngagementEvent,
    pub user_id: Option<UserId>,
    pub full_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Registered,
    Active,
    Inactive,
}

impl ParticipantStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ParticipantStatus::Registered => "registered",
            ParticipantStatus::Active => "active",
            ParticipantStatus::Inactive => "inactive",
        }
    }
}

/// Stored participant row. Sub-scores are percentages in `0..=100`; the engagement score is
/// never stored and is derived through [`Participant::view`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub user_id: UserId,
    pub event_id: EventId,
    pub attendance_score: f64,
    pub participation_score: f64,
    pub resource_score: f64,
    pub status: ParticipantStatus,
    pub joined_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Participant {
    pub fn registered(
        id: ParticipantId,
        user_id: UserId,
        event_id: EventId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            event_id,
            attendance_score: 0.0,
            participation_score: 0.0,
            resource_score: 0.0,
            status: ParticipantStatus::Registered,
            joined_at: now,
            updated_at: now,
        }
    }

    pub fn sub_scores(&self) -> SubScores {
        SubScores {
            attendance: self.attendance_score,
            participation: self.participation_score,
            resources: self.resource_score,
        }
    }

    pub fn apply_sub_scores(&mut self, scores: SubScores, now: DateTime<Utc>) {
        self.attendance_score = scores.attendance;
        self.participation_score = scores.participation;
        self.resource_score = scores.resources;
        self.updated_at = now;
    }

    pub fn view(&self, calculator: &EngagementCalculator) -> Result<ParticipantView, ScoringError> {
        let engagement_score = calculator.score(&self.sub_scores())?;
        Ok(ParticipantView {
            participant_id: self.id.clone(),
            user_id: self.user_id.clone(),
            event_id: self.event_id.clone(),
            status: self.status.label(),
            attendance_score: self.attendance_score,
            participation_score: self.participation_score,
            resource_score: self.resource_score,
            engagement_score,
        })
    }
}

/// Participant projection including the derived engagement score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantView {
    pub participant_id: ParticipantId,
    pub user_id: UserId,
    pub event_id: EventId,
    pub status: &'static str,
    pub attendance_score: f64,
    pub participation_score: f64,
    pub resource_score: f64,
    pub engagement_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Draft,
    Upcoming,
    Live,
    Completed,
}

/// Organizer-supplied event fields, everything except the identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "default_event_status")]
    pub status: EventStatus,
    pub organizer_id: UserId,
}

fn default_event_status() -> EventStatus {
    EventStatus::Draft
}

impl EventDraft {
    pub fn validate(&self) -> Result<(), String> {
        require_text("name", &self.name)?;
        if self.end_date < self.start_date {
            return Err(format!(
                "end_date {} precedes start_date {}",
                self.end_date, self.start_date
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: Option<String>,
    pub status: EventStatus,
    pub organizer_id: UserId,
}

impl Event {
    pub fn from_draft(id: EventId, draft: EventDraft) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            start_date: draft.start_date,
            end_date: draft.end_date,
            location: draft.location,
            status: draft.status,
            organizer_id: draft.organizer_id,
        }
    }

    /// Every field except the identity, used when cloning an event.
    pub fn to_draft(&self) -> EventDraft {
        EventDraft {
            name: self.name.clone(),
            description: self.description.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            location: self.location.clone(),
            status: self.status,
            organizer_id: self.organizer_id.clone(),
        }
    }
}

/// Public profile of a user, used for mentor matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub skills: BTreeSet<String>,
    #[serde(default)]
    pub interests: BTreeSet<String>,
}

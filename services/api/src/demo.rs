use crate::infra::{in_memory_service, InMemoryEngagementService};
use chrono::{Duration, Utc};
use clap::Args;
use mindful_track::engagement::{
    ActivityPayload, EventDraft, EventId, EventStatus, NewEngagementEvent, ParticipantId,
    Profile, ServiceSettings, SessionId, UserId,
};
use mindful_track::error::AppError;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Number of mentor suggestions to print per participant.
    #[arg(long)]
    pub(crate) mentors: Option<usize>,
    /// Skip the mentor matching portion of the demo.
    #[arg(long)]
    pub(crate) skip_mentors: bool,
}

struct Attendee {
    user: &'static str,
    name: &'static str,
    skills: &'static [&'static str],
    interests: &'static [&'static str],
    check_ins: usize,
    feedback: Option<u8>,
    downloads: usize,
}

const ATTENDEES: [Attendee; 4] = [
    Attendee {
        user: "user-ada",
        name: "Ada Okafor",
        skills: &["React", "Python"],
        interests: &["AI", "Mindfulness"],
        check_ins: 4,
        feedback: Some(5),
        downloads: 2,
    },
    Attendee {
        user: "user-bo",
        name: "Bo Lindqvist",
        skills: &["react", "python", "design"],
        interests: &["ai"],
        check_ins: 6,
        feedback: Some(4),
        downloads: 1,
    },
    Attendee {
        user: "user-cy",
        name: "Cy Moreno",
        skills: &["python"],
        interests: &["mindfulness"],
        check_ins: 2,
        feedback: None,
        downloads: 3,
    },
    Attendee {
        user: "user-dee",
        name: "Dee Park",
        skills: &["go"],
        interests: &["music"],
        check_ins: 1,
        feedback: None,
        downloads: 0,
    },
];

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let settings = ServiceSettings::default();
    let mentor_limit = args.mentors.unwrap_or(settings.mentor_match_limit);
    let service = in_memory_service(settings);

    let start = Utc::now();
    let event = service.create_event(EventDraft {
        name: "Mindful Leadership Summit".to_string(),
        description: "Workshops, talks, and a shared resource library".to_string(),
        start_date: start,
        end_date: start + Duration::hours(8),
        location: Some("Main Hall".to_string()),
        status: EventStatus::Live,
        organizer_id: UserId::from("organizer-1"),
    })?;
    println!("MindfulTrack demo");
    println!("Event {} ({})", event.name, event.id);

    let session = SessionId::from("session-keynote");
    let mut participants = Vec::with_capacity(ATTENDEES.len());
    for attendee in &ATTENDEES {
        let participant = seed_attendee(&service, attendee, &event.id, &session)?;
        participants.push((attendee.name, participant));
    }

    println!("\nLeaderboard");
    for (rank, view) in service.leaderboard(&event.id)?.iter().enumerate() {
        println!(
            "  {}. {} | engagement {:.1} (attendance {:.0} / participation {:.0} / resources {:.0}) [{}]",
            rank + 1,
            view.user_id,
            view.engagement_score,
            view.attendance_score,
            view.participation_score,
            view.resource_score,
            view.status
        );
    }

    println!("\nRecent activity");
    for entry in service.recent_activity(Some(5))? {
        let who = match (&entry.full_name, &entry.user_id) {
            (Some(name), _) => name.clone(),
            (None, Some(user_id)) => user_id.to_string(),
            (None, None) => entry.event.participant_id.to_string(),
        };
        println!(
            "  - {who} {} (+{} pts)",
            entry.event.activity_type(),
            entry.event.points
        );
    }

    if args.skip_mentors {
        return Ok(());
    }

    println!("\nMentor suggestions (top {mentor_limit})");
    for (name, participant_id) in &participants {
        let matches = service.recommend_mentors(participant_id, Some(mentor_limit))?;
        if matches.is_empty() {
            println!("  {name}: no overlapping skills or interests");
            continue;
        }
        let summary = matches
            .iter()
            .map(|candidate| format!("{} ({})", candidate.display_name, candidate.score))
            .collect::<Vec<_>>()
            .join(", ");
        println!("  {name}: {summary}");
    }

    Ok(())
}

fn seed_attendee(
    service: &InMemoryEngagementService,
    attendee: &Attendee,
    event_id: &EventId,
    session: &SessionId,
) -> Result<ParticipantId, AppError> {
    let user_id = UserId::from(attendee.user);
    service.upsert_profile(Profile {
        user_id: user_id.clone(),
        full_name: attendee.name.to_string(),
        email: None,
        skills: attendee.skills.iter().map(|skill| skill.to_string()).collect(),
        interests: attendee
            .interests
            .iter()
            .map(|interest| interest.to_string())
            .collect(),
    })?;

    let participant_id = service.join_event(event_id, &user_id)?.participant_id;
    for _ in 0..attendee.check_ins {
        service.check_in(&participant_id, session)?;
    }
    if let Some(rating) = attendee.feedback {
        service.submit_feedback(&participant_id, session, rating, None)?;
    }
    for index in 0..attendee.downloads {
        service.download_resource(&participant_id, &format!("worksheet-{index}"), Some(session))?;
    }
    service.log_engagement(NewEngagementEvent::new(
        participant_id.clone(),
        ActivityPayload::PageVisit {
            path: "/agenda".to_string(),
        },
    ))?;

    service.refresh_scores(&participant_id)?;
    Ok(participant_id)
}

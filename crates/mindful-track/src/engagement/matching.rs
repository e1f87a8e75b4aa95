//! Mentor matching: overlap scoring plus a descending, truncated ranking.

use std::collections::BTreeSet;

use serde::Serialize;

use super::domain::{ParticipantId, Profile};

pub const DEFAULT_MATCH_LIMIT: usize = 3;

const SKILL_WEIGHT: u32 = 2;
const INTEREST_WEIGHT: u32 = 1;

/// Skills and interests of one participant, trimmed and lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentorProfile {
    pub participant_id: ParticipantId,
    pub display_name: String,
    pub skills: BTreeSet<String>,
    pub interests: BTreeSet<String>,
}

impl MentorProfile {
    pub fn new<S, I>(
        participant_id: ParticipantId,
        display_name: impl Into<String>,
        skills: S,
        interests: I,
    ) -> Self
    where
        S: IntoIterator,
        S::Item: AsRef<str>,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Self {
            participant_id,
            display_name: display_name.into(),
            skills: normalize(skills),
            interests: normalize(interests),
        }
    }

    pub fn from_profile(participant_id: ParticipantId, profile: &Profile) -> Self {
        Self::new(
            participant_id,
            profile.full_name.clone(),
            &profile.skills,
            &profile.interests,
        )
    }
}

fn normalize<T>(values: T) -> BTreeSet<String>
where
    T: IntoIterator,
    T::Item: AsRef<str>,
{
    values
        .into_iter()
        .map(|value| value.as_ref().trim().to_lowercase())
        .filter(|value| !value.is_empty())
        .collect()
}

/// Ranked candidate with the overlap that produced its score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MentorMatch {
    pub participant_id: ParticipantId,
    pub display_name: String,
    pub score: u32,
    pub shared_skills: Vec<String>,
    pub shared_interests: Vec<String>,
}

/// `2 * |shared skills| + |shared interests|`.
pub fn match_score(query: &MentorProfile, candidate: &MentorProfile) -> u32 {
    let skills = query.skills.intersection(&candidate.skills).count() as u32;
    let interests = query.interests.intersection(&candidate.interests).count() as u32;
    SKILL_WEIGHT * skills + INTEREST_WEIGHT * interests
}

/// Candidates with a positive score, best first, at most `limit` of them. Ties keep pool
/// order and the query participant is never matched with itself.
pub fn rank_mentors<'a, P>(query: &MentorProfile, pool: P, limit: usize) -> Vec<MentorMatch>
where
    P: IntoIterator<Item = &'a MentorProfile>,
{
    let mut matches: Vec<MentorMatch> = pool
        .into_iter()
        .filter(|candidate| candidate.participant_id != query.participant_id)
        .filter_map(|candidate| {
            let score = match_score(query, candidate);
            (score > 0).then(|| MentorMatch {
                participant_id: candidate.participant_id.clone(),
                display_name: candidate.display_name.clone(),
                score,
                shared_skills: query
                    .skills
                    .intersection(&candidate.skills)
                    .cloned()
                    .collect(),
                shared_interests: query
                    .interests
                    .intersection(&candidate.interests)
                    .cloned()
                    .collect(),
            })
        })
        .collect();

    matches.sort_by(|left, right| right.score.cmp(&left.score));
    matches.truncate(limit);
    matches
}

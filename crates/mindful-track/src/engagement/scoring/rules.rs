use serde::Serialize;

use super::super::domain::{ActivityCategory, EngagementEvent};
use super::{ScoringError, SubScores};

/// Points that count as a full 100% in each category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryTargets {
    attendance: u32,
    participation: u32,
    resources: u32,
}

impl CategoryTargets {
    pub fn new(attendance: u32, participation: u32, resources: u32) -> Result<Self, ScoringError> {
        for (category, target) in [
            (ActivityCategory::Attendance, attendance),
            (ActivityCategory::Participation, participation),
            (ActivityCategory::Resources, resources),
        ] {
            if target == 0 {
                return Err(ScoringError::InvalidTarget { category });
            }
        }

        Ok(Self {
            attendance,
            participation,
            resources,
        })
    }

    pub fn target(&self, category: ActivityCategory) -> u32 {
        match category {
            ActivityCategory::Attendance => self.attendance,
            ActivityCategory::Participation => self.participation,
            ActivityCategory::Resources => self.resources,
        }
    }
}

impl Default for CategoryTargets {
    fn default() -> Self {
        Self {
            attendance: 100,
            participation: 150,
            resources: 50,
        }
    }
}

/// Sums logged points per category and converts each total to a capped percentage.
pub fn aggregate<'a, I>(events: I, targets: &CategoryTargets) -> SubScores
where
    I: IntoIterator<Item = &'a EngagementEvent>,
{
    let mut attendance: u64 = 0;
    let mut participation: u64 = 0;
    let mut resources: u64 = 0;

    for event in events {
        let points = u64::from(event.points);
        match event.activity_type().category() {
            ActivityCategory::Attendance => attendance += points,
            ActivityCategory::Participation => participation += points,
            ActivityCategory::Resources => resources += points,
        }
    }

    SubScores {
        attendance: percentage(attendance, targets.target(ActivityCategory::Attendance)),
        participation: percentage(
            participation,
            targets.target(ActivityCategory::Participation),
        ),
        resources: percentage(resources, targets.target(ActivityCategory::Resources)),
    }
}

fn percentage(points: u64, target: u32) -> f64 {
    (points as f64 / f64::from(target) * 100.0).min(100.0)
}

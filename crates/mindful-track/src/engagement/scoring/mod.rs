//! Weighted engagement scoring.
//!
//! Sub-scores are percentage-normalized (`0..=100`). Raw log points are converted at the
//! boundary by [`aggregate`] so the calculator only ever sees percentages.

mod rules;
mod weights;

pub use rules::{aggregate, CategoryTargets};
pub use weights::ScoreWeights;

use serde::{Deserialize, Serialize};

use super::domain::ActivityCategory;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("{field} must be a finite, non-negative number (got {value})")]
    InvalidInput { field: &'static str, value: f64 },
    #[error("score weights must be non-negative and sum to 1.0 (got sum {sum})")]
    InvalidWeights { sum: f64 },
    #[error("{category} target must be greater than zero")]
    InvalidTarget { category: ActivityCategory },
}

/// Attendance, participation and resource sub-scores of one participant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub attendance: f64,
    pub participation: f64,
    pub resources: f64,
}

/// Stateless calculator combining sub-scores with a validated weight set.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngagementCalculator {
    weights: ScoreWeights,
}

impl EngagementCalculator {
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    pub fn calculate(
        &self,
        attendance: f64,
        participation: f64,
        resources: f64,
    ) -> Result<f64, ScoringError> {
        let attendance = checked_input("attendance", attendance)?;
        let participation = checked_input("participation", participation)?;
        let resources = checked_input("resources", resources)?;

        Ok(attendance * self.weights.attendance()
            + participation * self.weights.participation()
            + resources * self.weights.resources())
    }

    pub fn score(&self, scores: &SubScores) -> Result<f64, ScoringError> {
        self.calculate(scores.attendance, scores.participation, scores.resources)
    }
}

/// Engagement score with the default 35/40/25 weighting.
pub fn calculate(attendance: f64, participation: f64, resources: f64) -> Result<f64, ScoringError> {
    EngagementCalculator::default().calculate(attendance, participation, resources)
}

fn checked_input(field: &'static str, value: f64) -> Result<f64, ScoringError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ScoringError::InvalidInput { field, value })
    }
}

use serde::Serialize;

use super::ScoringError;

pub(crate) const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Category weights applied to the three sub-scores. Always sums to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreWeights {
    attendance: f64,
    participation: f64,
    resources: f64,
}

impl ScoreWeights {
    pub const ATTENDANCE: f64 = 0.35;
    pub const PARTICIPATION: f64 = 0.40;
    pub const RESOURCES: f64 = 0.25;

    pub fn new(attendance: f64, participation: f64, resources: f64) -> Result<Self, ScoringError> {
        let sum = attendance + participation + resources;
        let each_valid = [attendance, participation, resources]
            .iter()
            .all(|weight| weight.is_finite() && *weight >= 0.0);
        if !each_valid || (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ScoringError::InvalidWeights { sum });
        }

        Ok(Self {
            attendance,
            participation,
            resources,
        })
    }

    pub fn attendance(&self) -> f64 {
        self.attendance
    }

    pub fn participation(&self) -> f64 {
        self.participation
    }

    pub fn resources(&self) -> f64 {
        self.resources
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            attendance: Self::ATTENDANCE,
            participation: Self::PARTICIPATION,
            resources: Self::RESOURCES,
        }
    }
}

//! Next-bar direction calls from a trained model.

use std::fmt;

use super::error::TraderError;
use super::signal::Action;

/// Predicted move of the next close relative to the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Buy on an expected rise, Sell otherwise.
    pub fn action(self) -> Action {
        match self {
            Direction::Up => Action::Buy,
            Direction::Down => Action::Sell,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.action(), f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub direction: Direction,
    /// Probability of `Up`, when the model produces one.
    pub probability: Option<f64>,
}

impl Prediction {
    pub fn new(direction: Direction) -> Self {
        Prediction {
            direction,
            probability: None,
        }
    }

    /// Up when `p_up >= 0.5`. Rejects values outside [0, 1].
    pub fn from_probability(p_up: f64) -> Result<Self, TraderError> {
        if !(0.0..=1.0).contains(&p_up) {
            return Err(TraderError::malformed(format!(
                "probability {p_up} is outside [0, 1]"
            )));
        }
        let direction = if p_up >= 0.5 {
            Direction::Up
        } else {
            Direction::Down
        };
        Ok(Prediction {
            direction,
            probability: Some(p_up),
        })
    }
}

/// A fitted model that scores one feature vector, laid out as
/// [`FEATURE_COLUMNS`](super::labeler::FEATURE_COLUMNS).
pub trait Predictor {
    fn predict(&self, features: &[f64; 9]) -> Result<Prediction, TraderError>;
}

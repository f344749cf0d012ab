use serde::{Deserialize, Serialize};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Workflow-efficiency feedback, `POST /api/metrics/feedback`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub usefulness: u8,
    pub accuracy: u8,
    pub response_time: u8,
    pub workload_reduction: u8,
    pub comments: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeedbackError {
    #[error("{field} rating must be between {MIN_RATING} and {MAX_RATING} (got {value})")]
    RatingOutOfRange { field: &'static str, value: u8 },
    #[error("Feedback category is required")]
    MissingCategory,
}

impl Feedback {
    pub fn validate(&self) -> Result<(), FeedbackError> {
        let ratings = [
            ("usefulness", self.usefulness),
            ("accuracy", self.accuracy),
            ("response_time", self.response_time),
            ("workload_reduction", self.workload_reduction),
        ];
        for (field, value) in ratings {
            if !(MIN_RATING..=MAX_RATING).contains(&value) {
                return Err(FeedbackError::RatingOutOfRange { field, value });
            }
        }
        if self.category.trim().is_empty() {
            return Err(FeedbackError::MissingCategory);
        }
        Ok(())
    }
}

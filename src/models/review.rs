use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use sqlx::FromRow;

use crate::error::{Error, Result};
use crate::models::candidate::CandidateStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i32,
    pub phase: i16,
    pub candidate_id: i32,
    pub user_id: i32,
    pub criteria_ratings: Option<JsonValue>,
    pub notes: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub final_score: Option<Decimal>,
    pub hire_decision: Option<bool>,
    pub final_comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewPhase {
    One,
    Two,
}

impl ReviewPhase {
    pub fn as_i16(self) -> i16 {
        match self {
            ReviewPhase::One => 1,
            ReviewPhase::Two => 2,
        }
    }
}

/// Where a candidate sits in the two-phase review, derived from its reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStage {
    NoReview,
    Phase1Submitted,
    Phase2Submitted { hire_decision: bool },
}

impl ReviewStage {
    pub fn from_reviews(reviews: &[Review]) -> Self {
        if let Some(final_review) = reviews.iter().find(|r| r.phase == 2) {
            return ReviewStage::Phase2Submitted {
                hire_decision: final_review.hire_decision.unwrap_or(false),
            };
        }
        if reviews.iter().any(|r| r.phase == 1) {
            ReviewStage::Phase1Submitted
        } else {
            ReviewStage::NoReview
        }
    }

    /// Checks that a review of `phase` may be added from this stage.
    pub fn accepts(self, phase: ReviewPhase) -> Result<()> {
        match (self, phase) {
            (ReviewStage::NoReview, ReviewPhase::One) => Ok(()),
            (ReviewStage::Phase1Submitted, ReviewPhase::Two) => Ok(()),
            (ReviewStage::NoReview, ReviewPhase::Two) => Err(Error::Conflict(
                "A phase 1 review must be submitted before phase 2".to_string(),
            )),
            (_, ReviewPhase::One) => Err(Error::Conflict(
                "A phase 1 review already exists for this candidate".to_string(),
            )),
            (_, ReviewPhase::Two) => Err(Error::Conflict(
                "A phase 2 review already exists for this candidate".to_string(),
            )),
        }
    }
}

/// Status implied by the reviews. `None` means reviews do not decide the status
/// and the current value stands.
pub fn derive_status(reviews: &[Review]) -> Option<CandidateStatus> {
    match ReviewStage::from_reviews(reviews) {
        ReviewStage::Phase2Submitted { hire_decision: true } => Some(CandidateStatus::Reviewed),
        ReviewStage::Phase2Submitted { hire_decision: false } => Some(CandidateStatus::Rejected),
        ReviewStage::NoReview | ReviewStage::Phase1Submitted => None,
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Criterion {
    pub id: &'static str,
    pub label: &'static str,
}

pub const REVIEW_CRITERIA: [Criterion; 5] = [
    Criterion { id: "technical_skills", label: "Technical skills" },
    Criterion { id: "problem_solving", label: "Problem solving" },
    Criterion { id: "communication", label: "Communication and soft skills" },
    Criterion { id: "culture_fit", label: "Culture fit" },
    Criterion { id: "teamwork", label: "Teamwork" },
];

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// Validates phase-1 ratings: a non-empty object of known criterion ids, each
/// rated with an integer from 1 to 5.
pub fn validate_criteria_ratings(ratings: &JsonValue) -> Result<Map<String, JsonValue>> {
    let Some(map) = ratings.as_object() else {
        return Err(Error::Validation(
            "criteriaRatings must be an object of criterion ratings".to_string(),
        ));
    };
    if map.is_empty() {
        return Err(Error::Validation(
            "criteriaRatings are required for a phase 1 review".to_string(),
        ));
    }

    for (key, value) in map {
        if !REVIEW_CRITERIA.iter().any(|c| c.id == key) {
            return Err(Error::Validation(format!("Unknown review criterion '{}'", key)));
        }
        match value.as_i64() {
            Some(score) if (MIN_RATING..=MAX_RATING).contains(&score) => {}
            _ => {
                return Err(Error::Validation(format!(
                    "Rating for '{}' must be an integer between {} and {}",
                    key, MIN_RATING, MAX_RATING
                )))
            }
        }
    }

    Ok(map.clone())
}

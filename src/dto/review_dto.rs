use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, Result};
use crate::models::review::validate_criteria_ratings;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseOneReviewPayload {
    pub criteria_ratings: Option<JsonValue>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseTwoReviewPayload {
    pub final_score: Option<f64>,
    pub hire_decision: Option<bool>,
    pub final_comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseOneReview {
    pub criteria_ratings: Map<String, JsonValue>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseTwoReview {
    pub final_score: Decimal,
    pub hire_decision: bool,
    pub final_comment: Option<String>,
}

impl TryFrom<PhaseOneReviewPayload> for PhaseOneReview {
    type Error = Error;

    fn try_from(payload: PhaseOneReviewPayload) -> Result<Self> {
        let ratings = payload.criteria_ratings.ok_or_else(|| {
            Error::Validation("criteriaRatings are required for a phase 1 review".to_string())
        })?;
        Ok(Self {
            criteria_ratings: validate_criteria_ratings(&ratings)?,
            notes: blank_to_none(payload.notes),
        })
    }
}

impl TryFrom<PhaseTwoReviewPayload> for PhaseTwoReview {
    type Error = Error;

    fn try_from(payload: PhaseTwoReviewPayload) -> Result<Self> {
        let (Some(score), Some(hire_decision)) = (payload.final_score, payload.hire_decision)
        else {
            return Err(Error::Validation(
                "finalScore and hireDecision are required for a phase 2 review".to_string(),
            ));
        };
        let final_score = Decimal::from_f64(score)
            .ok_or_else(|| Error::Validation("finalScore must be a finite number".to_string()))?;

        Ok(Self {
            final_score,
            hire_decision,
            final_comment: blank_to_none(payload.final_comment),
        })
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

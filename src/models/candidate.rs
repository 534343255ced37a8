use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use sqlx::FromRow;

use crate::error::Error;
use crate::models::review::Review;
use crate::models::tag::Tag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "candidate_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    Pending,
    Reviewed,
    Rejected,
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::Pending => "pending",
            CandidateStatus::Reviewed => "reviewed",
            CandidateStatus::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for CandidateStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(CandidateStatus::Pending),
            "reviewed" => Ok(CandidateStatus::Reviewed),
            "rejected" => Ok(CandidateStatus::Rejected),
            other => Err(Error::Validation(format!("Unknown candidate status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: i32,
    pub uuid: String,
    pub sender: String,
    pub status: CandidateStatus,
    pub full_name: String,
    pub email: String,
    pub github_link: Option<String>,
    pub raw_answers: JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A candidate together with its reviews (phase, then creation order) and
/// tags (alphabetical).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateDetail {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub reviews: Vec<Review>,
    pub tags: Vec<Tag>,
}

// Intake form field ids, followed by the plain names older bot revisions send.
const FULL_NAME_KEYS: &[&str] = &["screen_0_TextInput_0", "fullName", "full_name"];
const EMAIL_KEYS: &[&str] = &["screen_0_TextInput_1", "email"];
const GITHUB_KEYS: &[&str] = &["screen_0_TextInput_4", "githubLink", "github_link"];

const MISSING_ANSWER: &str = "N/A";

#[derive(Debug, Clone, PartialEq)]
pub struct NewCandidate {
    pub uuid: String,
    pub sender: String,
    pub full_name: String,
    pub email: String,
    pub github_link: Option<String>,
    pub raw_answers: JsonValue,
}

impl NewCandidate {
    pub fn from_answers(uuid: String, sender: String, answers: Map<String, JsonValue>) -> Self {
        let full_name =
            first_answer(&answers, FULL_NAME_KEYS).unwrap_or_else(|| MISSING_ANSWER.to_string());
        let email =
            first_answer(&answers, EMAIL_KEYS).unwrap_or_else(|| MISSING_ANSWER.to_string());
        let github_link = first_answer(&answers, GITHUB_KEYS);

        Self {
            uuid,
            sender,
            full_name,
            email,
            github_link,
            raw_answers: JsonValue::Object(answers),
        }
    }
}

fn first_answer(answers: &Map<String, JsonValue>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| answers.get(*k))
        .filter_map(|v| v.as_str())
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

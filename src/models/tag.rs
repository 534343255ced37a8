use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: i32,
    pub name: String,
}

/// A tag joined through `candidate_tags`.
#[derive(Debug, Clone, FromRow)]
pub struct CandidateTag {
    pub candidate_id: i32,
    pub id: i32,
    pub name: String,
}

impl From<CandidateTag> for Tag {
    fn from(row: CandidateTag) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

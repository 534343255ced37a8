use sqlx::{PgConnection, PgPool};

use crate::dto::review_dto::{PhaseOneReview, PhaseTwoReview};
use crate::error::{Error, Result};
use crate::models::candidate::CandidateStatus;
use crate::models::review::{derive_status, Review, ReviewPhase, ReviewStage};
use crate::services::candidate_service::candidate_not_found;

const REVIEW_COLUMNS: &str = "id, phase, candidate_id, user_id, criteria_ratings, notes, \
     final_score, hire_decision, final_comment, created_at";

/// Outcome of a phase-2 submission.
#[derive(Debug, Clone)]
pub struct FinalReview {
    pub review: Review,
    pub status: Option<CandidateStatus>,
}

/// Enforces the two-phase review lifecycle: phase 1 first, one review per
/// phase, and the candidate status follows the phase-2 decision.
#[derive(Clone)]
pub struct ReviewService {
    pool: PgPool,
}

impl ReviewService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_phase_one(
        &self,
        candidate_id: i32,
        reviewer_id: i32,
        input: PhaseOneReview,
    ) -> Result<Review> {
        let mut tx = self.pool.begin().await?;

        let reviews = load_candidate_reviews(&mut tx, candidate_id).await?;
        ReviewStage::from_reviews(&reviews).accepts(ReviewPhase::One)?;

        let review = sqlx::query_as::<_, Review>(&format!(
            "INSERT INTO reviews (phase, candidate_id, user_id, criteria_ratings, notes) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            REVIEW_COLUMNS
        ))
        .bind(ReviewPhase::One.as_i16())
        .bind(candidate_id)
        .bind(reviewer_id)
        .bind(serde_json::Value::Object(input.criteria_ratings))
        .bind(input.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| duplicate_phase(e, ReviewPhase::One))?;

        tx.commit().await?;
        tracing::info!(candidate_id, reviewer_id, phase = 1, review_id = review.id, "review submitted");
        Ok(review)
    }

    pub async fn create_phase_two(
        &self,
        candidate_id: i32,
        reviewer_id: i32,
        input: PhaseTwoReview,
    ) -> Result<FinalReview> {
        let mut tx = self.pool.begin().await?;

        let mut reviews = load_candidate_reviews(&mut tx, candidate_id).await?;
        ReviewStage::from_reviews(&reviews).accepts(ReviewPhase::Two)?;

        let review = sqlx::query_as::<_, Review>(&format!(
            "INSERT INTO reviews (phase, candidate_id, user_id, final_score, hire_decision, final_comment) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            REVIEW_COLUMNS
        ))
        .bind(ReviewPhase::Two.as_i16())
        .bind(candidate_id)
        .bind(reviewer_id)
        .bind(input.final_score)
        .bind(input.hire_decision)
        .bind(input.final_comment)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| duplicate_phase(e, ReviewPhase::Two))?;

        reviews.push(review.clone());
        let status = derive_status(&reviews);
        if let Some(status) = status {
            sqlx::query("UPDATE candidates SET status = $1, updated_at = NOW() WHERE id = $2")
                .bind(status)
                .bind(candidate_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        tracing::info!(
            candidate_id,
            reviewer_id,
            phase = 2,
            review_id = review.id,
            hire_decision = input.hire_decision,
            status = ?status,
            "review submitted"
        );
        Ok(FinalReview { review, status })
    }
}

/// Locks the candidate row for the rest of the transaction and returns its
/// reviews.
async fn load_candidate_reviews(conn: &mut PgConnection, candidate_id: i32) -> Result<Vec<Review>> {
    let locked: Option<i32> = sqlx::query_scalar("SELECT id FROM candidates WHERE id = $1 FOR UPDATE")
        .bind(candidate_id)
        .fetch_optional(&mut *conn)
        .await?;
    if locked.is_none() {
        return Err(candidate_not_found(candidate_id));
    }
    reviews_for(conn, candidate_id).await
}

async fn reviews_for(conn: &mut PgConnection, candidate_id: i32) -> Result<Vec<Review>> {
    let reviews = sqlx::query_as::<_, Review>(&format!(
        "SELECT {} FROM reviews WHERE candidate_id = $1 ORDER BY phase ASC, created_at ASC, id ASC",
        REVIEW_COLUMNS
    ))
    .bind(candidate_id)
    .fetch_all(conn)
    .await?;
    Ok(reviews)
}

fn duplicate_phase(err: sqlx::Error, phase: ReviewPhase) -> Error {
    match Error::from(err) {
        Error::Conflict(_) => Error::Conflict(format!(
            "A phase {} review already exists for this candidate",
            phase.as_i16()
        )),
        other => other,
    }
}

use std::collections::HashMap;

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::dto::candidate_dto::{CandidatePage, CandidateSearchQuery, UpdateCandidatePayload};
use crate::error::{Error, Result};
use crate::models::candidate::{Candidate, CandidateDetail, NewCandidate};
use crate::models::review::Review;
use crate::models::tag::{CandidateTag, Tag};
use crate::services::tag_service;

const CANDIDATE_COLUMNS: &str = "c.id, c.uuid, c.sender, c.status, c.full_name, c.email, \
     c.github_link, c.raw_answers, c.created_at, c.updated_at";

#[derive(Clone)]
pub struct CandidateService {
    pool: PgPool,
}

/// What a successful delete removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletedCandidate {
    pub candidate_id: i32,
    pub reviews_deleted: u64,
}

impl CandidateService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Stores a candidate decoded from the intake webhook, attaching the named
    /// tags in the same transaction.
    pub async fn ingest(&self, new: NewCandidate, tag_names: &[String]) -> Result<CandidateDetail> {
        let mut tx = self.pool.begin().await?;

        let candidate = sqlx::query_as::<_, Candidate>(
            r#"
            INSERT INTO candidates (uuid, sender, full_name, email, github_link, raw_answers)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, uuid, sender, status, full_name, email, github_link, raw_answers, created_at, updated_at
            "#,
        )
        .bind(&new.uuid)
        .bind(&new.sender)
        .bind(&new.full_name)
        .bind(&new.email)
        .bind(&new.github_link)
        .bind(&new.raw_answers)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match Error::from(e) {
            Error::Conflict(_) => Error::Conflict(format!(
                "A candidate with uuid '{}' already exists",
                new.uuid
            )),
            other => other,
        })?;

        let tags = if tag_names.is_empty() {
            Vec::new()
        } else {
            tag_service::attach_by_name(&mut tx, candidate.id, tag_names).await?
        };

        tx.commit().await?;

        tracing::info!(
            candidate_id = candidate.id,
            uuid = %candidate.uuid,
            tags = tags.len(),
            "candidate ingested"
        );

        Ok(CandidateDetail {
            candidate,
            reviews: Vec::new(),
            tags,
        })
    }

    /// All candidates, newest first.
    pub async fn list(&self) -> Result<Vec<CandidateDetail>> {
        let candidates = sqlx::query_as::<_, Candidate>(&format!(
            "SELECT {} FROM candidates c ORDER BY c.created_at DESC, c.id DESC",
            CANDIDATE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        self.with_relations(candidates).await
    }

    pub async fn search(&self, query: &CandidateSearchQuery) -> Result<CandidatePage> {
        let filters = SearchFilters::from_query(query)?;
        let page = query.page();
        let per_page = query.per_page();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM candidates c");
        filters.push_where(&mut count);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut items = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM candidates c",
            CANDIDATE_COLUMNS
        ));
        filters.push_where(&mut items);
        items
            .push(" ORDER BY c.created_at DESC, c.id DESC LIMIT ")
            .push_bind(per_page)
            .push(" OFFSET ")
            .push_bind(query.offset());
        let candidates: Vec<Candidate> = items.build_query_as().fetch_all(&self.pool).await?;

        let details = self.with_relations(candidates).await?;
        Ok(CandidatePage::new(details, total, page, per_page))
    }

    pub async fn get(&self, id: i32) -> Result<CandidateDetail> {
        let candidate = sqlx::query_as::<_, Candidate>(&format!(
            "SELECT {} FROM candidates c WHERE c.id = $1",
            CANDIDATE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| candidate_not_found(id))?;

        let mut details = self.with_relations(vec![candidate]).await?;
        details.pop().ok_or_else(|| candidate_not_found(id))
    }

    /// Partial update of the operator-editable fields. Text fields are stored
    /// as given; callers trim them before validating.
    pub async fn update(&self, id: i32, payload: UpdateCandidatePayload) -> Result<CandidateDetail> {
        let updated: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE candidates
            SET status = COALESCE($1, status),
                full_name = COALESCE($2, full_name),
                email = COALESCE($3, email),
                github_link = CASE
                    WHEN $4::text IS NULL THEN github_link
                    WHEN $4::text = '' THEN NULL
                    ELSE $4::text
                END,
                updated_at = NOW()
            WHERE id = $5
            RETURNING id
            "#,
        )
        .bind(payload.status)
        .bind(payload.full_name)
        .bind(payload.email)
        .bind(payload.github_link)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        if updated.is_none() {
            return Err(candidate_not_found(id));
        }
        tracing::info!(candidate_id = id, "candidate updated");
        self.get(id).await
    }

    /// Removes the candidate, its reviews and its tag links as one unit.
    pub async fn delete(&self, id: i32) -> Result<DeletedCandidate> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM candidate_tags WHERE candidate_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let reviews_deleted = sqlx::query("DELETE FROM reviews WHERE candidate_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let deleted: Option<i32> =
            sqlx::query_scalar("DELETE FROM candidates WHERE id = $1 RETURNING id")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        if deleted.is_none() {
            tx.rollback().await?;
            return Err(candidate_not_found(id));
        }

        tx.commit().await?;
        tracing::info!(candidate_id = id, reviews_deleted, "candidate deleted");

        Ok(DeletedCandidate {
            candidate_id: id,
            reviews_deleted,
        })
    }

    async fn with_relations(&self, candidates: Vec<Candidate>) -> Result<Vec<CandidateDetail>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = candidates.iter().map(|c| c.id).collect();

        let reviews = sqlx::query_as::<_, Review>(
            r#"
            SELECT id, phase, candidate_id, user_id, criteria_ratings, notes, final_score, hire_decision, final_comment, created_at
            FROM reviews
            WHERE candidate_id = ANY($1)
            ORDER BY phase ASC, created_at ASC, id ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let tags = sqlx::query_as::<_, CandidateTag>(
            r#"
            SELECT ct.candidate_id, t.id, t.name
            FROM candidate_tags ct
            JOIN tags t ON t.id = ct.tag_id
            WHERE ct.candidate_id = ANY($1)
            ORDER BY t.name ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut reviews_by_candidate: HashMap<i32, Vec<Review>> = HashMap::new();
        for review in reviews {
            reviews_by_candidate
                .entry(review.candidate_id)
                .or_default()
                .push(review);
        }
        let mut tags_by_candidate: HashMap<i32, Vec<Tag>> = HashMap::new();
        for tag in tags {
            tags_by_candidate
                .entry(tag.candidate_id)
                .or_default()
                .push(tag.into());
        }

        Ok(candidates
            .into_iter()
            .map(|candidate| CandidateDetail {
                reviews: reviews_by_candidate.remove(&candidate.id).unwrap_or_default(),
                tags: tags_by_candidate.remove(&candidate.id).unwrap_or_default(),
                candidate,
            })
            .collect())
    }
}

pub fn candidate_not_found(id: i32) -> Error {
    Error::NotFound(format!("Candidate {} not found", id))
}

struct SearchFilters {
    name_pattern: Option<String>,
    statuses: Vec<String>,
    tag_names: Vec<String>,
}

impl SearchFilters {
    fn from_query(query: &CandidateSearchQuery) -> Result<Self> {
        let statuses = query
            .statuses()?
            .into_iter()
            .map(|s| s.as_str().to_string())
            .collect();

        let mut tag_names: Vec<String> = query
            .tag_names()
            .into_iter()
            .map(|t| t.to_lowercase())
            .collect();
        tag_names.sort();
        tag_names.dedup();

        Ok(Self {
            name_pattern: query.search_term().map(|s| format!("%{}%", escape_like(&s))),
            statuses,
            tag_names,
        })
    }

    fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE TRUE");
        if let Some(pattern) = &self.name_pattern {
            qb.push(" AND c.full_name ILIKE ").push_bind(pattern.clone());
        }
        if !self.statuses.is_empty() {
            qb.push(" AND c.status::text = ANY(")
                .push_bind(self.statuses.clone())
                .push(")");
        }
        if !self.tag_names.is_empty() {
            // Candidate must carry every requested tag.
            qb.push(
                " AND c.id IN (SELECT ct.candidate_id FROM candidate_tags ct \
                 JOIN tags t ON t.id = ct.tag_id WHERE LOWER(t.name) = ANY(",
            )
            .push_bind(self.tag_names.clone())
            .push(") GROUP BY ct.candidate_id HAVING COUNT(DISTINCT LOWER(t.name)) = ")
            .push_bind(self.tag_names.len() as i64)
            .push(")");
        }
    }
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

use sqlx::{PgConnection, PgPool};

use crate::error::{Error, Result};
use crate::models::tag::Tag;
use crate::services::candidate_service::candidate_not_found;

#[derive(Clone)]
pub struct TagService {
    pool: PgPool,
}

impl TagService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(tags)
    }

    pub async fn create(&self, name: &str) -> Result<Tag> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("Tag name cannot be empty".to_string()));
        }

        sqlx::query_as::<_, Tag>("INSERT INTO tags (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match Error::from(e) {
                Error::Conflict(_) => Error::Conflict(format!("Tag '{}' already exists", name)),
                other => other,
            })
    }

    /// Idempotently links tags to a candidate and returns the candidate's tags.
    pub async fn attach(&self, candidate_id: i32, tag_ids: &[i32]) -> Result<Vec<Tag>> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i32> = sqlx::query_scalar("SELECT id FROM candidates WHERE id = $1")
            .bind(candidate_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(candidate_not_found(candidate_id));
        }

        // A missing tag id trips the foreign key and surfaces as InvalidReference.
        sqlx::query(
            r#"
            INSERT INTO candidate_tags (candidate_id, tag_id)
            SELECT $1, UNNEST($2::int[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(candidate_id)
        .bind(tag_ids)
        .execute(&mut *tx)
        .await?;

        let tags = tags_for_candidate(&mut tx, candidate_id).await?;
        tx.commit().await?;

        tracing::info!(candidate_id, attached = tag_ids.len(), "tags attached");
        Ok(tags)
    }

    pub async fn detach(&self, candidate_id: i32, tag_id: i32) -> Result<()> {
        let result =
            sqlx::query("DELETE FROM candidate_tags WHERE candidate_id = $1 AND tag_id = $2")
                .bind(candidate_id)
                .bind(tag_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "Tag {} is not attached to candidate {}",
                tag_id, candidate_id
            )));
        }
        Ok(())
    }
}

/// Links tags by name on an open connection. Names match case-insensitively
/// and every name must exist.
pub async fn attach_by_name(
    conn: &mut PgConnection,
    candidate_id: i32,
    names: &[String],
) -> Result<Vec<Tag>> {
    let wanted = normalize_names(names);
    let found = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags WHERE LOWER(name) = ANY($1)")
        .bind(&wanted)
        .fetch_all(&mut *conn)
        .await?;

    let missing = missing_names(&wanted, &found);
    if !missing.is_empty() {
        return Err(Error::InvalidReference(format!(
            "Unknown tags: {}",
            missing.join(", ")
        )));
    }

    let ids: Vec<i32> = found.iter().map(|t| t.id).collect();
    sqlx::query(
        r#"
        INSERT INTO candidate_tags (candidate_id, tag_id)
        SELECT $1, UNNEST($2::int[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(candidate_id)
    .bind(&ids)
    .execute(&mut *conn)
    .await?;

    tags_for_candidate(conn, candidate_id).await
}

async fn tags_for_candidate(conn: &mut PgConnection, candidate_id: i32) -> Result<Vec<Tag>> {
    let tags = sqlx::query_as::<_, Tag>(
        r#"
        SELECT t.id, t.name
        FROM candidate_tags ct
        JOIN tags t ON t.id = ct.tag_id
        WHERE ct.candidate_id = $1
        ORDER BY t.name ASC
        "#,
    )
    .bind(candidate_id)
    .fetch_all(conn)
    .await?;
    Ok(tags)
}

fn normalize_names(names: &[String]) -> Vec<String> {
    let mut wanted: Vec<String> = names.iter().map(|n| n.trim().to_lowercase()).collect();
    wanted.sort();
    wanted.dedup();
    wanted
}

fn missing_names<'a>(wanted: &'a [String], found: &[Tag]) -> Vec<&'a str> {
    wanted
        .iter()
        .filter(|n| !found.iter().any(|t| t.name.to_lowercase() == **n))
        .map(String::as_str)
        .collect()
}

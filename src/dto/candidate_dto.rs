use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{Error, Result};
use crate::models::candidate::{CandidateDetail, CandidateStatus};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;
/// Keeps `(page - 1) * per_page` well inside `i64`.
pub const MAX_PAGE: i64 = 1_000_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCandidatePayload {
    pub status: Option<CandidateStatus>,
    #[validate(length(min = 1, message = "fullName cannot be empty"))]
    pub full_name: Option<String>,
    #[validate(email(message = "email must be a valid address"))]
    pub email: Option<String>,
    /// An empty string clears the link.
    pub github_link: Option<String>,
}

impl UpdateCandidatePayload {
    /// Trims every text field so validation sees what will be stored.
    pub fn trimmed(self) -> Self {
        fn trim(value: Option<String>) -> Option<String> {
            value.map(|s| s.trim().to_string())
        }
        Self {
            status: self.status,
            full_name: trim(self.full_name),
            email: trim(self.email),
            github_link: trim(self.github_link),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.full_name.is_none()
            && self.email.is_none()
            && self.github_link.is_none()
    }
}

/// Dashboard filters. `status` and `tags` are comma separated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateSearchQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub tags: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl CandidateSearchQuery {
    pub fn statuses(&self) -> Result<Vec<CandidateStatus>> {
        split_list(self.status.as_deref())
            .into_iter()
            .map(|s| s.parse())
            .collect()
    }

    pub fn tag_names(&self) -> Vec<String> {
        split_list(self.tags.as_deref())
    }

    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).clamp(1, MAX_PAGE)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.per_page()
    }
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePage {
    pub items: Vec<CandidateDetail>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl CandidatePage {
    pub fn new(items: Vec<CandidateDetail>, total: i64, page: i64, per_page: i64) -> Self {
        let total_pages = (total + per_page - 1) / per_page;
        Self {
            items,
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTagPayload {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AttachTagsPayload {
    #[validate(length(min = 1, message = "tagIds cannot be empty"))]
    pub tag_ids: Vec<i32>,
}

pub fn ensure_has_changes(payload: &UpdateCandidatePayload) -> Result<()> {
    if payload.is_empty() {
        return Err(Error::Validation(
            "At least one of status, fullName, email, githubLink is required".to_string(),
        ));
    }
    Ok(())
}

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    dto::candidate_dto::CreateTagPayload, error::Result, models::review::REVIEW_CRITERIA,
    utils::validation::ApiJson, AppState,
};

#[utoipa::path(
    get,
    path = "/api/tags",
    responses(
        (status = 200, description = "Tag catalog in alphabetical order")
    )
)]
#[axum::debug_handler]
pub async fn list_tags(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let tags = state.tag_service.list().await?;
    Ok(Json(tags))
}

#[utoipa::path(
    post,
    path = "/api/tags",
    request_body = CreateTagPayload,
    responses(
        (status = 201, description = "Tag created"),
        (status = 400, description = "Empty name"),
        (status = 409, description = "Tag already exists")
    )
)]
#[axum::debug_handler]
pub async fn create_tag(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateTagPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let tag = state.tag_service.create(&payload.name).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

#[utoipa::path(
    get,
    path = "/api/review-criteria",
    responses(
        (status = 200, description = "Criteria rated in a phase 1 review")
    )
)]
pub async fn list_review_criteria() -> impl IntoResponse {
    Json(REVIEW_CRITERIA)
}

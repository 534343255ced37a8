use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use validator::Validate;

use crate::{
    dto::{
        candidate_dto::{
            ensure_has_changes, AttachTagsPayload, CandidateSearchQuery, UpdateCandidatePayload,
        },
        review_dto::{PhaseOneReview, PhaseOneReviewPayload, PhaseTwoReview, PhaseTwoReviewPayload},
        webhook_dto::{IngestCandidatePayload, IngestCandidateResponse},
    },
    error::Result,
    middleware::auth::CurrentUser,
    utils::validation::{ApiJson, ApiPath, ApiQuery},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/candidates",
    request_body = IngestCandidatePayload,
    responses(
        (status = 201, description = "Candidate saved", body = Json<IngestCandidateResponse>),
        (status = 400, description = "Missing fields or malformed message_body"),
        (status = 401, description = "Invalid API key"),
        (status = 409, description = "Candidate uuid already ingested")
    )
)]
#[axum::debug_handler]
pub async fn ingest_candidate(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<IngestCandidatePayload>,
) -> Result<impl IntoResponse> {
    let (new, tags) = payload.into_new_candidate()?;
    let detail = state.candidate_service.ingest(new, &tags).await?;
    Ok((
        StatusCode::CREATED,
        Json(IngestCandidateResponse::saved(detail.candidate.id)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/candidates",
    responses(
        (status = 200, description = "All candidates, newest first")
    )
)]
#[axum::debug_handler]
pub async fn list_candidates(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let candidates = state.candidate_service.list().await?;
    Ok(Json(candidates))
}

#[utoipa::path(
    get,
    path = "/api/candidates/search",
    params(
        ("search" = Option<String>, Query, description = "Substring of the full name"),
        ("status" = Option<String>, Query, description = "Comma separated statuses"),
        ("tags" = Option<String>, Query, description = "Comma separated tag names, all required"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Page of matching candidates"),
        (status = 400, description = "Unknown status")
    )
)]
#[axum::debug_handler]
pub async fn search_candidates(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CandidateSearchQuery>,
) -> Result<impl IntoResponse> {
    let page = state.candidate_service.search(&query).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/candidates/{id}",
    params(
        ("id" = i32, Path, description = "Candidate ID")
    ),
    responses(
        (status = 200, description = "Candidate with reviews and tags"),
        (status = 404, description = "Candidate not found")
    )
)]
#[axum::debug_handler]
pub async fn get_candidate(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse> {
    let candidate = state.candidate_service.get(id).await?;
    Ok(Json(candidate))
}

#[utoipa::path(
    put,
    path = "/api/candidates/{id}",
    params(
        ("id" = i32, Path, description = "Candidate ID")
    ),
    request_body = UpdateCandidatePayload,
    responses(
        (status = 200, description = "Candidate updated"),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Candidate not found")
    )
)]
#[axum::debug_handler]
pub async fn update_candidate(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<UpdateCandidatePayload>,
) -> Result<impl IntoResponse> {
    let payload = payload.trimmed();
    payload.validate()?;
    ensure_has_changes(&payload)?;
    let candidate = state.candidate_service.update(id, payload).await?;
    Ok(Json(candidate))
}

#[utoipa::path(
    delete,
    path = "/api/candidates/{id}",
    params(
        ("id" = i32, Path, description = "Candidate ID")
    ),
    responses(
        (status = 204, description = "Candidate and its reviews deleted"),
        (status = 404, description = "Candidate not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_candidate(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse> {
    state.candidate_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/candidates/{id}/phase-one",
    params(
        ("id" = i32, Path, description = "Candidate ID")
    ),
    request_body = PhaseOneReviewPayload,
    responses(
        (status = 201, description = "Phase 1 review stored"),
        (status = 400, description = "Invalid criteria ratings"),
        (status = 404, description = "Candidate not found"),
        (status = 409, description = "Phase 1 already reviewed")
    )
)]
#[axum::debug_handler]
pub async fn submit_phase_one(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<PhaseOneReviewPayload>,
) -> Result<impl IntoResponse> {
    let review = PhaseOneReview::try_from(payload)?;
    let review = state
        .review_service
        .create_phase_one(id, user.id, review)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

#[utoipa::path(
    post,
    path = "/api/candidates/{id}/phase-two",
    params(
        ("id" = i32, Path, description = "Candidate ID")
    ),
    request_body = PhaseTwoReviewPayload,
    responses(
        (status = 201, description = "Phase 2 review stored and status updated"),
        (status = 400, description = "Missing score or decision"),
        (status = 404, description = "Candidate not found"),
        (status = 409, description = "Phase 1 missing or phase 2 already reviewed")
    )
)]
#[axum::debug_handler]
pub async fn submit_phase_two(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<PhaseTwoReviewPayload>,
) -> Result<impl IntoResponse> {
    let review = PhaseTwoReview::try_from(payload)?;
    let result = state
        .review_service
        .create_phase_two(id, user.id, review)
        .await?;
    Ok((StatusCode::CREATED, Json(result.review)))
}

#[utoipa::path(
    post,
    path = "/api/candidates/{id}/tags",
    params(
        ("id" = i32, Path, description = "Candidate ID")
    ),
    request_body = AttachTagsPayload,
    responses(
        (status = 200, description = "Tags now attached to the candidate"),
        (status = 400, description = "Unknown tag id"),
        (status = 404, description = "Candidate not found")
    )
)]
#[axum::debug_handler]
pub async fn attach_tags(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<AttachTagsPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let tags = state.tag_service.attach(id, &payload.tag_ids).await?;
    Ok(Json(tags))
}

#[utoipa::path(
    delete,
    path = "/api/candidates/{id}/tags/{tag_id}",
    params(
        ("id" = i32, Path, description = "Candidate ID"),
        ("tag_id" = i32, Path, description = "Tag ID")
    ),
    responses(
        (status = 204, description = "Tag detached"),
        (status = 404, description = "Tag not attached")
    )
)]
#[axum::debug_handler]
pub async fn detach_tag(
    State(state): State<AppState>,
    ApiPath((id, tag_id)): ApiPath<(i32, i32)>,
) -> Result<impl IntoResponse> {
    state.tag_service.detach(id, tag_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub mod auth;
pub mod candidates;
pub mod health;
pub mod tags;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    config::Config,
    middleware::{
        auth::{require_api_key, require_bearer_auth},
        cors::cors_layer,
        rate_limit::{new_window_state, rate_limit_middleware},
        request_log::log_requests,
    },
    AppState,
};

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Assembles the HTTP surface. Each router group gets its own limiter. The
/// operator limiter runs after bearer auth so it counts per user.
pub fn build_router(state: AppState, config: &Config) -> Router {
    let window = config.rate_limit_window_secs;

    let bot_api = Router::new()
        .route("/api/candidates", post(candidates::ingest_candidate))
        .layer(from_fn_with_state(state.clone(), require_api_key))
        .layer(from_fn_with_state(
            new_window_state(config.bot_rate_limit, window),
            rate_limit_middleware,
        ));

    let auth_api = Router::new()
        .route("/api/auth/login", post(auth::login))
        .layer(from_fn_with_state(
            new_window_state(config.user_rate_limit, window),
            rate_limit_middleware,
        ));

    let operator_api = Router::new()
        .route("/api/candidates", get(candidates::list_candidates))
        .route("/api/candidates/search", get(candidates::search_candidates))
        .route(
            "/api/candidates/:id",
            get(candidates::get_candidate)
                .put(candidates::update_candidate)
                .delete(candidates::delete_candidate),
        )
        .route(
            "/api/candidates/:id/phase-one",
            post(candidates::submit_phase_one),
        )
        .route(
            "/api/candidates/:id/phase-two",
            post(candidates::submit_phase_two),
        )
        .route("/api/candidates/:id/tags", post(candidates::attach_tags))
        .route(
            "/api/candidates/:id/tags/:tag_id",
            delete(candidates::detach_tag),
        )
        .route("/api/tags", get(tags::list_tags).post(tags::create_tag))
        .route("/api/review-criteria", get(tags::list_review_criteria))
        .layer(from_fn_with_state(
            new_window_state(config.user_rate_limit, window),
            rate_limit_middleware,
        ))
        .layer(from_fn_with_state(state.clone(), require_bearer_auth));

    let api = bot_api
        .merge(auth_api)
        .merge(operator_api)
        .layer(from_fn_with_state(state.clone(), log_requests));

    Router::new()
        .route("/health", get(health::health))
        .merge(api)
        .with_state(state)
        .layer(cors_layer(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

use axum::{
    Router,
    routing::{get, post},
};

use crate::orchestrator::ReviewOrchestrator;

pub mod handlers;

use handlers::{
    aggregated_rating, create_review, delete_review, get_review, health, list_movie_reviews,
    list_user_reviews, update_review,
};

/// Service state shared by all REST handlers.
#[derive(Clone)]
pub struct ReviewServiceState {
    pub orchestrator: ReviewOrchestrator,
}

/// Returns the REST router of the review service.
///
/// Review routes are served both at the root and under the `/api` prefix.
pub fn build_router(state: ReviewServiceState) -> Router {
    let review_routes = Router::new()
        .route("/reviews", post(create_review))
        .route(
            "/reviews/{review_id}",
            get(get_review).put(update_review).delete(delete_review),
        )
        .route("/reviews/movie/{movie_id}", get(list_movie_reviews))
        .route("/reviews/user/{user_id}", get(list_user_reviews))
        .route("/movies/{movie_id}/rating", get(aggregated_rating));

    Router::new()
        .route("/health", get(health))
        .merge(review_routes.clone())
        .nest("/api", review_routes)
        .with_state(state)
}

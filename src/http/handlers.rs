use axum::{
    Json, debug_handler,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use log::info;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use super::ReviewServiceState;
use crate::{
    authentication::AuthorizedUser,
    error::ReviewError,
    input_structs::{CreateReviewInput, UpdateReviewInput},
    model::{AggregatedRating, ListQuery, Review, ReviewListing},
};

/// Raw pagination query of review listings, parsed leniently into a [`ListQuery`].
#[derive(Deserialize, Debug, Default)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
}

impl From<ListParams> for ListQuery {
    fn from(value: ListParams) -> Self {
        ListQuery::from_raw(
            value.page.as_deref(),
            value.limit.as_deref(),
            value.sort_by.as_deref(),
        )
    }
}

/// Turns body decoding failures into validation errors.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ReviewError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ReviewError::Validation(rejection.body_text()))
}

/// Turns malformed path ids into validation errors.
fn path_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ReviewError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| ReviewError::Validation(rejection.body_text()))
}

/// HTTP endpoint for liveness probes.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// HTTP endpoint to create a review of the authenticated user.
///
/// * `state` - Service state containing the orchestrator.
/// * `user` - Authenticated user owning the review.
/// * `body` - Movie, rating and comment of the review.
#[debug_handler(state = ReviewServiceState)]
pub async fn create_review(
    State(state): State<ReviewServiceState>,
    user: AuthorizedUser,
    body: Result<Json<CreateReviewInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Review>), ReviewError> {
    let input = json_body(body)?;
    info!("User `{}` creating review for movie `{}`.", user.id, input.movie_id);
    let review = state.orchestrator.create_review(user.id, input).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// HTTP endpoint to retrieve a review.
#[debug_handler(state = ReviewServiceState)]
pub async fn get_review(
    State(state): State<ReviewServiceState>,
    review_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Review>, ReviewError> {
    let review_id = path_id(review_id)?;
    Ok(Json(state.orchestrator.get_review(review_id).await?))
}

/// HTTP endpoint to update rating and comment of a review of the authenticated user.
///
/// * `state` - Service state containing the orchestrator.
/// * `user` - Authenticated user, must own the review.
/// * `review_id` - UUID of the review to update.
/// * `body` - Fields to update.
#[debug_handler(state = ReviewServiceState)]
pub async fn update_review(
    State(state): State<ReviewServiceState>,
    user: AuthorizedUser,
    review_id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateReviewInput>, JsonRejection>,
) -> Result<Json<Review>, ReviewError> {
    let review_id = path_id(review_id)?;
    let input = json_body(body)?;
    let review = state
        .orchestrator
        .update_review(user.id, review_id, input)
        .await?;
    Ok(Json(review))
}

/// HTTP endpoint to delete a review of the authenticated user.
#[debug_handler(state = ReviewServiceState)]
pub async fn delete_review(
    State(state): State<ReviewServiceState>,
    user: AuthorizedUser,
    review_id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ReviewError> {
    let review_id = path_id(review_id)?;
    state.orchestrator.delete_review(user.id, review_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// HTTP endpoint to list the reviews of a movie.
///
/// * `state` - Service state containing the orchestrator.
/// * `movie_id` - UUID of the movie.
/// * `params` - `page`, `limit` and `sort_by` query parameters.
#[debug_handler(state = ReviewServiceState)]
pub async fn list_movie_reviews(
    State(state): State<ReviewServiceState>,
    movie_id: Result<Path<Uuid>, PathRejection>,
    Query(params): Query<ListParams>,
) -> Result<Json<ReviewListing>, ReviewError> {
    let movie_id = path_id(movie_id)?;
    let listing = state
        .orchestrator
        .list_movie_reviews(movie_id, params.into())
        .await?;
    Ok(Json(listing))
}

/// HTTP endpoint to list the reviews written by a user.
#[debug_handler(state = ReviewServiceState)]
pub async fn list_user_reviews(
    State(state): State<ReviewServiceState>,
    user_id: Result<Path<Uuid>, PathRejection>,
    Query(params): Query<ListParams>,
) -> Result<Json<ReviewListing>, ReviewError> {
    let user_id = path_id(user_id)?;
    let listing = state
        .orchestrator
        .list_user_reviews(user_id, params.into())
        .await?;
    Ok(Json(listing))
}

/// HTTP endpoint to retrieve the aggregated rating of a movie.
#[debug_handler(state = ReviewServiceState)]
pub async fn aggregated_rating(
    State(state): State<ReviewServiceState>,
    movie_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<AggregatedRating>, ReviewError> {
    let movie_id = path_id(movie_id)?;
    Ok(Json(state.orchestrator.aggregated_rating(movie_id).await?))
}

use serde::Deserialize;
use uuid::Uuid;

/// Body of a review creation request.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewInput {
    /// UUID of the movie in review.
    pub movie_id: Uuid,
    /// Rating of review in 1-10 points. Bounds are checked by the orchestrator.
    pub rating: i32,
    /// Optional comment of at most 2000 characters.
    #[serde(default)]
    pub comment: Option<String>,
}

/// Body of a review update request. Absent fields keep their stored value.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReviewInput {
    /// Rating of review in 1-10 points to update.
    #[serde(default)]
    pub rating: Option<i32>,
    /// Comment to update, an empty comment removes it.
    #[serde(default)]
    pub comment: Option<String>,
}

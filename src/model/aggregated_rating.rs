use serde::Serialize;
use uuid::Uuid;

/// Average rating and rating count of a movie. Derived on every request, never stored.
#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedRating {
    /// UUID of the rated movie.
    pub movie_id: Uuid,
    /// Average rating, exactly `0` when the movie has no reviews.
    pub average_rating: f64,
    /// Number of reviews of the movie.
    pub rating_count: u64,
}

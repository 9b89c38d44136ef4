use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::ReviewError,
    model::{AggregatedRating, ListQuery, Review, ReviewPage, ReviewPatch},
};

pub mod memory;
pub mod mongodb;

pub use memory::InMemoryReviewRepository;
pub use mongodb::MongoReviewRepository;

/// Persistence of review rows.
///
/// Implementations enforce the one-review-per-user-per-movie invariant atomically in `create`.
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Inserts a new review. Fails with [`ReviewError::DuplicateReview`] if the user already
    /// reviewed the movie.
    async fn create(&self, review: &Review) -> Result<(), ReviewError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Review, ReviewError>;

    /// Applies `patch` in one step to the review matching both `id` and `user_id` and returns the
    /// stored result. Fails with [`ReviewError::NotFound`] if no such review exists.
    async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        patch: &ReviewPatch,
    ) -> Result<Review, ReviewError>;

    /// Deletes the review if a row matches both `id` and `user_id`.
    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<(), ReviewError>;

    async fn list_by_movie(&self, movie_id: Uuid, query: &ListQuery)
        -> Result<ReviewPage, ReviewError>;

    async fn list_by_user(&self, user_id: Uuid, query: &ListQuery)
        -> Result<ReviewPage, ReviewError>;

    async fn aggregate(&self, movie_id: Uuid) -> Result<AggregatedRating, ReviewError>;
}

use std::sync::Arc;

use chrono::Utc;
use futures::{StreamExt, join, stream};
use log::{error, info, warn};
use uuid::Uuid;

use crate::{
    error::ReviewError,
    gateway::{LookupError, MovieLookup, UserLookup},
    input_structs::{CreateReviewInput, UpdateReviewInput},
    model::{
        AggregatedRating, ListQuery, Rating, Review, ReviewListing, ReviewPatch,
        review::validate_comment,
    },
    repository::ReviewRepository,
    telemetry::record_degraded_enrichment,
};

/// Upper bound of rows enriched concurrently within one listing.
const ENRICHMENT_FAN_OUT: usize = 8;

/// Request-time coordinator of the review service.
///
/// Gates writes and rating aggregates on the movie catalog, writes through the repository and
/// joins listings with user and movie metadata.
#[derive(Clone)]
pub struct ReviewOrchestrator {
    repository: Arc<dyn ReviewRepository>,
    movies: Arc<dyn MovieLookup>,
    users: Arc<dyn UserLookup>,
}

impl ReviewOrchestrator {
    pub fn new(
        repository: Arc<dyn ReviewRepository>,
        movies: Arc<dyn MovieLookup>,
        users: Arc<dyn UserLookup>,
    ) -> Self {
        Self {
            repository,
            movies,
            users,
        }
    }

    /// Creates a review of `user_id` after the movie catalog confirmed the movie.
    ///
    /// * `user_id` - UUID of the authenticated user owning the new review.
    /// * `input` - Movie, rating and comment of the new review.
    pub async fn create_review(
        &self,
        user_id: Uuid,
        input: CreateReviewInput,
    ) -> Result<Review, ReviewError> {
        let rating = Rating::new(input.rating)?;
        validate_comment(input.comment.as_deref())?;

        self.gate_movie(input.movie_id).await?;

        let review = Review::new(
            input.movie_id,
            user_id,
            rating,
            input.comment.filter(|comment| !comment.is_empty()),
        );
        self.repository.create(&review).await?;
        info!(
            "Review `{}` created for movie `{}` by user `{}`.",
            review.id, review.movie_id, review.user_id
        );
        Ok(review)
    }

    pub async fn get_review(&self, id: Uuid) -> Result<Review, ReviewError> {
        self.repository.get_by_id(id).await
    }

    /// Updates rating and comment of a review owned by `user_id`. Absent fields keep their stored
    /// value and an empty comment removes it.
    ///
    /// A review owned by somebody else is reported exactly like a missing one.
    pub async fn update_review(
        &self,
        user_id: Uuid,
        review_id: Uuid,
        input: UpdateReviewInput,
    ) -> Result<Review, ReviewError> {
        let rating = input.rating.map(Rating::new).transpose()?;
        validate_comment(input.comment.as_deref())?;

        let patch = ReviewPatch {
            rating,
            comment: input
                .comment
                .map(|comment| Some(comment).filter(|comment| !comment.is_empty())),
            updated_at: Utc::now(),
        };
        let review = self.repository.update(review_id, user_id, &patch).await?;
        info!("Review `{}` updated by user `{}`.", review_id, user_id);
        Ok(review)
    }

    pub async fn delete_review(&self, user_id: Uuid, review_id: Uuid) -> Result<(), ReviewError> {
        self.repository.delete(review_id, user_id).await?;
        info!("Review `{}` deleted by user `{}`.", review_id, user_id);
        Ok(())
    }

    /// Lists the reviews of a movie, enriched with usernames and the movie title.
    pub async fn list_movie_reviews(
        &self,
        movie_id: Uuid,
        query: ListQuery,
    ) -> Result<ReviewListing, ReviewError> {
        let page = self.repository.list_by_movie(movie_id, &query).await?;
        let reviews = self.enrich(page.nodes).await;
        info!(
            "Listed {} of {} reviews for movie `{}`.",
            reviews.len(),
            page.total_count,
            movie_id
        );
        Ok(ReviewListing::new(reviews, page.total_count, &query))
    }

    /// Lists the reviews written by a user, enriched with the username and movie titles.
    pub async fn list_user_reviews(
        &self,
        user_id: Uuid,
        query: ListQuery,
    ) -> Result<ReviewListing, ReviewError> {
        let page = self.repository.list_by_user(user_id, &query).await?;
        let reviews = self.enrich(page.nodes).await;
        info!(
            "Listed {} of {} reviews for user `{}`.",
            reviews.len(),
            page.total_count,
            user_id
        );
        Ok(ReviewListing::new(reviews, page.total_count, &query))
    }

    /// Average rating and rating count of a movie confirmed by the movie catalog.
    pub async fn aggregated_rating(&self, movie_id: Uuid) -> Result<AggregatedRating, ReviewError> {
        self.gate_movie(movie_id).await?;
        let aggregate = self.repository.aggregate(movie_id).await?;
        info!(
            "Aggregated rating of movie `{}`: {} over {} reviews.",
            movie_id, aggregate.average_rating, aggregate.rating_count
        );
        Ok(aggregate)
    }

    /// Fails unless the movie catalog confirms that the movie exists.
    async fn gate_movie(&self, movie_id: Uuid) -> Result<(), ReviewError> {
        match self.movies.exists(movie_id).await {
            Ok(true) => Ok(()),
            Ok(false) | Err(LookupError::NotFound(_)) => {
                warn!("Movie `{}` does not exist.", movie_id);
                Err(ReviewError::movie_not_found(movie_id))
            }
            Err(LookupError::Unavailable(reason)) => {
                error!("Could not verify existence of movie `{}`: {}", movie_id, reason);
                Err(ReviewError::DependencyUnavailable(format!(
                    "Could not verify existence of movie `{}`.",
                    movie_id
                )))
            }
        }
    }

    /// Resolves display fields of every review, keeping the input order.
    async fn enrich(&self, reviews: Vec<Review>) -> Vec<Review> {
        stream::iter(reviews)
            .map(|review| self.enrich_review(review))
            .buffered(ENRICHMENT_FAN_OUT)
            .collect()
            .await
    }

    /// Fills username and movie title. A failed lookup leaves its field unset.
    async fn enrich_review(&self, mut review: Review) -> Review {
        let (user, movie) = join!(
            self.users.info(review.user_id),
            self.movies.info(review.movie_id)
        );
        match user {
            Ok(user) => review.username = Some(user.username),
            Err(e) => {
                warn!(
                    "Failed to resolve user `{}` of review `{}`: {}",
                    review.user_id, review.id, e
                );
                record_degraded_enrichment("username");
            }
        }
        match movie {
            Ok(movie) => review.movie_title = Some(movie.title),
            Err(e) => {
                warn!(
                    "Failed to resolve movie `{}` of review `{}`: {}",
                    review.movie_id, review.id, e
                );
                record_degraded_enrichment("movie_title");
            }
        }
        review
    }
}

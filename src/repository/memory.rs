use std::{cmp::Ordering, collections::HashMap};

use async_trait::async_trait;
use log::{debug, warn};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::ReviewRepository;
use crate::{
    aggregation::aggregate_ratings,
    error::ReviewError,
    model::{AggregatedRating, ListQuery, Review, ReviewPage, ReviewPatch, SortKey},
};

/// Review rows and the (movie, user) uniqueness index, guarded together.
#[derive(Default)]
struct Tables {
    reviews: HashMap<Uuid, Review>,
    by_movie_and_user: HashMap<(Uuid, Uuid), Uuid>,
}

/// In-memory review repository.
///
/// Every instance owns its own tables. The uniqueness check and the insert happen under a single
/// write lock, which makes them one atomic operation.
#[derive(Default)]
pub struct InMemoryReviewRepository {
    tables: RwLock<Tables>,
}

impl InMemoryReviewRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn list_where<F>(&self, query: &ListQuery, predicate: F) -> ReviewPage
    where
        F: Fn(&Review) -> bool,
    {
        let tables = self.tables.read().await;
        let mut matching: Vec<Review> = tables
            .reviews
            .values()
            .filter(|review| predicate(review))
            .cloned()
            .collect();
        drop(tables);

        let total_count = matching.len() as u64;
        matching.sort_by(|a, b| compare_by(query.sort_key, a, b));
        let nodes = matching
            .into_iter()
            .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
            .take(query.page_size() as usize)
            .collect();
        ReviewPage { nodes, total_count }
    }
}

/// Orders two reviews according to `sort_key`, newest first among ties.
fn compare_by(sort_key: SortKey, a: &Review, b: &Review) -> Ordering {
    let newest_first = b.created_at.cmp(&a.created_at);
    match sort_key {
        SortKey::Recency => newest_first,
        SortKey::RatingDesc => b.rating.cmp(&a.rating).then(newest_first),
        SortKey::RatingAsc => a.rating.cmp(&b.rating).then(newest_first),
    }
}

#[async_trait]
impl ReviewRepository for InMemoryReviewRepository {
    async fn create(&self, review: &Review) -> Result<(), ReviewError> {
        let mut tables = self.tables.write().await;
        let key = (review.movie_id, review.user_id);
        if tables.by_movie_and_user.contains_key(&key) {
            warn!(
                "User `{}` has already reviewed movie `{}`.",
                review.user_id, review.movie_id
            );
            return Err(ReviewError::DuplicateReview {
                movie_id: review.movie_id,
                user_id: review.user_id,
            });
        }
        if tables.reviews.contains_key(&review.id) {
            return Err(ReviewError::StorageFailure(format!(
                "Review with UUID: `{}` already exists.",
                review.id
            )));
        }
        let mut stored = review.clone();
        stored.username = None;
        stored.movie_title = None;
        tables.by_movie_and_user.insert(key, review.id);
        tables.reviews.insert(review.id, stored);
        debug!("Created review `{}`.", review.id);
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Review, ReviewError> {
        let tables = self.tables.read().await;
        tables
            .reviews
            .get(&id)
            .cloned()
            .ok_or_else(|| ReviewError::review_not_found(id))
    }

    async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        patch: &ReviewPatch,
    ) -> Result<Review, ReviewError> {
        let mut tables = self.tables.write().await;
        match tables.reviews.get_mut(&id) {
            Some(stored) if stored.user_id == user_id => {
                patch.apply_to(stored);
                Ok(stored.clone())
            }
            _ => {
                warn!("No review `{}` owned by user `{}` to update.", id, user_id);
                Err(ReviewError::review_not_found(id))
            }
        }
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<(), ReviewError> {
        let mut tables = self.tables.write().await;
        let owned = matches!(tables.reviews.get(&id), Some(stored) if stored.user_id == user_id);
        if !owned {
            warn!("No review `{}` owned by user `{}` to delete.", id, user_id);
            return Err(ReviewError::review_not_found(id));
        }
        if let Some(removed) = tables.reviews.remove(&id) {
            tables
                .by_movie_and_user
                .remove(&(removed.movie_id, removed.user_id));
        }
        Ok(())
    }

    async fn list_by_movie(
        &self,
        movie_id: Uuid,
        query: &ListQuery,
    ) -> Result<ReviewPage, ReviewError> {
        Ok(self
            .list_where(query, |review| review.movie_id == movie_id)
            .await)
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        query: &ListQuery,
    ) -> Result<ReviewPage, ReviewError> {
        Ok(self
            .list_where(query, |review| review.user_id == user_id)
            .await)
    }

    async fn aggregate(&self, movie_id: Uuid) -> Result<AggregatedRating, ReviewError> {
        let tables = self.tables.read().await;
        let ratings = tables
            .reviews
            .values()
            .filter(|review| review.movie_id == movie_id)
            .map(|review| review.rating);
        Ok(aggregate_ratings(movie_id, ratings))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};

    use super::*;
    use crate::model::Rating;

    fn review_at(movie_id: Uuid, rating: i32, minutes_ago: i64) -> Review {
        let mut review = Review::new(movie_id, Uuid::new_v4(), Rating::new(rating).unwrap(), None);
        review.created_at = Utc::now() - Duration::minutes(minutes_ago);
        review.updated_at = review.created_at;
        review
    }

    #[tokio::test]
    async fn second_create_for_same_pair_is_a_duplicate() {
        let repository = InMemoryReviewRepository::new();
        let first = Review::new(Uuid::new_v4(), Uuid::new_v4(), Rating::new(5).unwrap(), None);
        let second = Review::new(first.movie_id, first.user_id, Rating::new(8).unwrap(), None);

        repository.create(&first).await.unwrap();
        let result = repository.create(&second).await;

        assert!(matches!(result, Err(ReviewError::DuplicateReview { .. })));
        assert_eq!(repository.get_by_id(first.id).await.unwrap().rating.value(), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn exactly_one_concurrent_create_succeeds() {
        let repository = Arc::new(InMemoryReviewRepository::new());
        let movie_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let attempts: Vec<_> = (0..16)
            .map(|_| {
                let repository = repository.clone();
                tokio::spawn(async move {
                    let review = Review::new(movie_id, user_id, Rating::new(6).unwrap(), None);
                    repository.create(&review).await
                })
            })
            .collect();

        let mut successes = 0;
        let mut duplicates = 0;
        for attempt in attempts {
            match attempt.await.unwrap() {
                Ok(()) => successes += 1,
                Err(ReviewError::DuplicateReview { .. }) => duplicates += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(duplicates, 15);
    }

    #[tokio::test]
    async fn rating_desc_breaks_ties_by_newest_first() {
        let repository = InMemoryReviewRepository::new();
        let movie_id = Uuid::new_v4();
        let earlier = review_at(movie_id, 3, 30);
        let later = review_at(movie_id, 3, 20);
        let best = review_at(movie_id, 5, 10);
        for review in [&earlier, &later, &best] {
            repository.create(review).await.unwrap();
        }

        let query = ListQuery::new(1, 10, SortKey::RatingDesc);
        let page = repository.list_by_movie(movie_id, &query).await.unwrap();
        let ids: Vec<Uuid> = page.nodes.iter().map(|review| review.id).collect();
        assert_eq!(ids, vec![best.id, later.id, earlier.id]);

        let query = ListQuery::new(1, 10, SortKey::RatingAsc);
        let page = repository.list_by_movie(movie_id, &query).await.unwrap();
        let ids: Vec<Uuid> = page.nodes.iter().map(|review| review.id).collect();
        assert_eq!(ids, vec![later.id, earlier.id, best.id]);

        let page = repository
            .list_by_movie(movie_id, &ListQuery::default())
            .await
            .unwrap();
        let ids: Vec<Uuid> = page.nodes.iter().map(|review| review.id).collect();
        assert_eq!(ids, vec![best.id, later.id, earlier.id]);
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty_with_total() {
        let repository = InMemoryReviewRepository::new();
        let movie_id = Uuid::new_v4();
        for minutes_ago in 0..3 {
            repository
                .create(&review_at(movie_id, 4, minutes_ago))
                .await
                .unwrap();
        }

        let page = repository
            .list_by_movie(movie_id, &ListQuery::new(2, 2, SortKey::Recency))
            .await
            .unwrap();
        assert_eq!(page.nodes.len(), 1);
        assert_eq!(page.total_count, 3);

        let page = repository
            .list_by_movie(movie_id, &ListQuery::new(7, 2, SortKey::Recency))
            .await
            .unwrap();
        assert!(page.nodes.is_empty());
        assert_eq!(page.total_count, 3);
    }

    #[tokio::test]
    async fn empty_movie_lists_nothing() {
        let repository = InMemoryReviewRepository::new();
        for page in 1..4 {
            let result = repository
                .list_by_movie(Uuid::new_v4(), &ListQuery::new(page, 5, SortKey::Recency))
                .await
                .unwrap();
            assert_eq!(result, ReviewPage::empty(0));
        }
    }

    #[tokio::test]
    async fn update_and_delete_require_ownership() {
        let repository = InMemoryReviewRepository::new();
        let review = Review::new(Uuid::new_v4(), Uuid::new_v4(), Rating::new(2).unwrap(), None);
        repository.create(&review).await.unwrap();

        let stranger = Uuid::new_v4();
        let patch = ReviewPatch {
            rating: Some(Rating::new(9).unwrap()),
            comment: Some(Some("Grew on me.".to_string())),
            updated_at: Utc::now(),
        };
        assert!(matches!(
            repository.update(review.id, stranger, &patch).await,
            Err(ReviewError::NotFound(_))
        ));
        assert!(matches!(
            repository.delete(review.id, stranger).await,
            Err(ReviewError::NotFound(_))
        ));

        let returned = repository
            .update(review.id, review.user_id, &patch)
            .await
            .unwrap();
        let stored = repository.get_by_id(review.id).await.unwrap();
        assert_eq!(returned, stored);
        assert_eq!(stored.rating.value(), 9);
        assert_eq!(stored.comment.as_deref(), Some("Grew on me."));

        repository.delete(review.id, review.user_id).await.unwrap();
        assert!(matches!(
            repository.get_by_id(review.id).await,
            Err(ReviewError::NotFound(_))
        ));
        let again = Review::new(review.movie_id, review.user_id, Rating::new(1).unwrap(), None);
        repository.create(&again).await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_partial_updates_keep_both_fields() {
        let repository = Arc::new(InMemoryReviewRepository::new());
        let review = Review::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Rating::new(5).unwrap(),
            Some("old".to_string()),
        );
        repository.create(&review).await.unwrap();

        let rating_only = ReviewPatch {
            rating: Some(Rating::new(9).unwrap()),
            comment: None,
            updated_at: Utc::now(),
        };
        let comment_only = ReviewPatch {
            rating: None,
            comment: Some(Some("new".to_string())),
            updated_at: Utc::now(),
        };
        let (first, second) = tokio::join!(
            repository.update(review.id, review.user_id, &rating_only),
            repository.update(review.id, review.user_id, &comment_only),
        );
        first.unwrap();
        second.unwrap();

        let stored = repository.get_by_id(review.id).await.unwrap();
        assert_eq!(stored.rating.value(), 9);
        assert_eq!(stored.comment.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn removing_a_comment_keeps_the_rating() {
        let repository = InMemoryReviewRepository::new();
        let review = Review::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Rating::new(4).unwrap(),
            Some("meh".to_string()),
        );
        repository.create(&review).await.unwrap();

        let patch = ReviewPatch {
            rating: None,
            comment: Some(None),
            updated_at: Utc::now(),
        };
        let stored = repository
            .update(review.id, review.user_id, &patch)
            .await
            .unwrap();
        assert_eq!(stored.rating.value(), 4);
        assert_eq!(stored.comment, None);
    }

    #[tokio::test]
    async fn aggregate_covers_only_the_movie() {
        let repository = InMemoryReviewRepository::new();
        let movie_id = Uuid::new_v4();
        for (rating, minutes_ago) in [(2, 3), (4, 2), (6, 1)] {
            repository
                .create(&review_at(movie_id, rating, minutes_ago))
                .await
                .unwrap();
        }
        repository
            .create(&review_at(Uuid::new_v4(), 10, 0))
            .await
            .unwrap();

        let aggregate = repository.aggregate(movie_id).await.unwrap();
        assert_eq!(aggregate.average_rating, 4.0);
        assert_eq!(aggregate.rating_count, 3);

        let empty = repository.aggregate(Uuid::new_v4()).await.unwrap();
        assert_eq!(empty.average_rating, 0.0);
        assert_eq!(empty.rating_count, 0);
    }
}

use async_trait::async_trait;
use bson::{Bson, DateTime, Document, doc};
use futures::TryStreamExt;
use log::{debug, error, info, warn};
use mongodb::{
    Client, Collection, Database, IndexModel,
    error::{Error, ErrorKind, WriteFailure},
    options::{
        ClientOptions, FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument,
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ReviewRepository;
use crate::{
    aggregation::aggregate_totals,
    error::ReviewError,
    model::{AggregatedRating, ListQuery, Rating, Review, ReviewPage, ReviewPatch, SortKey},
};

/// MongoDB server error code of a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

const UNIQUE_MOVIE_USER_INDEX: &str = "uq_movie_user_review";

/// Persisted shape of a review. Enrichment fields are not part of it.
#[derive(Debug, Serialize, Deserialize, Clone)]
struct ReviewDocument {
    _id: bson::Uuid,
    movie_id: bson::Uuid,
    user_id: bson::Uuid,
    rating: i32,
    comment: Option<String>,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<&Review> for ReviewDocument {
    fn from(review: &Review) -> Self {
        Self {
            _id: bson::Uuid::from_uuid_1(review.id),
            movie_id: bson::Uuid::from_uuid_1(review.movie_id),
            user_id: bson::Uuid::from_uuid_1(review.user_id),
            rating: review.rating.into(),
            comment: review.comment.clone(),
            created_at: DateTime::from_chrono(review.created_at),
            updated_at: DateTime::from_chrono(review.updated_at),
        }
    }
}

impl TryFrom<ReviewDocument> for Review {
    type Error = ReviewError;

    fn try_from(value: ReviewDocument) -> Result<Self, Self::Error> {
        let rating = Rating::new(value.rating).map_err(|_| {
            ReviewError::StorageFailure(format!(
                "Stored review `{}` has out of range rating {}.",
                value._id, value.rating
            ))
        })?;
        Ok(Review {
            id: value._id.to_uuid_1(),
            movie_id: value.movie_id.to_uuid_1(),
            user_id: value.user_id.to_uuid_1(),
            rating,
            comment: value.comment,
            created_at: value.created_at.to_chrono(),
            updated_at: value.updated_at.to_chrono(),
            username: None,
            movie_title: None,
        })
    }
}

/// Review repository backed by a MongoDB collection.
///
/// Uniqueness of (movie, user) is a unique compound index; its violation on insert is
/// translated into [`ReviewError::DuplicateReview`].
#[derive(Clone)]
pub struct MongoReviewRepository {
    collection: Collection<ReviewDocument>,
}

impl MongoReviewRepository {
    /// Establishes the database connection and makes sure the unique index exists.
    ///
    /// * `uri` - MongoDB connection string.
    /// * `database_name` - Name of the database holding the `reviews` collection.
    pub async fn connect(uri: &str, database_name: &str) -> Result<Self, ReviewError> {
        let mut client_options = ClientOptions::parse(uri).await.map_err(storage_failure)?;
        client_options.app_name = Some("Review".to_string());
        let client = Client::with_options(client_options).map_err(storage_failure)?;
        let repository = Self::new(&client.database(database_name));
        repository.create_indexes().await?;
        Ok(repository)
    }

    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection::<ReviewDocument>("reviews"),
        }
    }

    /// Creates the unique (movie, user) index and the listing indexes.
    ///
    /// Failing to create the unique index is fatal, as the duplicate invariant depends on it.
    async fn create_indexes(&self) -> Result<(), ReviewError> {
        let unique_index = IndexModel::builder()
            .keys(doc! { "movie_id": 1, "user_id": 1 })
            .options(
                IndexOptions::builder()
                    .name(UNIQUE_MOVIE_USER_INDEX.to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.collection
            .create_index(unique_index, None)
            .await
            .map_err(storage_failure)?;

        let listing_indexes = vec![
            IndexModel::builder()
                .keys(doc! { "movie_id": 1, "created_at": -1 })
                .options(IndexOptions::builder().name("idx_movie_created".to_string()).build())
                .build(),
            IndexModel::builder()
                .keys(doc! { "user_id": 1, "created_at": -1 })
                .options(IndexOptions::builder().name("idx_user_created".to_string()).build())
                .build(),
        ];
        if let Err(e) = self.collection.create_indexes(listing_indexes, None).await {
            warn!("Failed to create MongoDB listing indexes: {}", e);
        }
        info!("MongoDB indexes ensured for collection `reviews`.");
        Ok(())
    }

    async fn list(&self, filter: Document, query: &ListQuery) -> Result<ReviewPage, ReviewError> {
        let total_count = self
            .collection
            .count_documents(filter.clone(), None)
            .await
            .map_err(storage_failure)?;
        if total_count <= query.offset() {
            return Ok(ReviewPage::empty(total_count));
        }

        let find_options = FindOptions::builder()
            .sort(sorting_doc(query.sort_key))
            .skip(query.offset())
            .limit(i64::from(query.page_size()))
            .build();
        debug!("Listing reviews with filter {} and options {:?}.", filter, find_options);
        let documents: Vec<ReviewDocument> = self
            .collection
            .find(filter, find_options)
            .await
            .map_err(storage_failure)?
            .try_collect()
            .await
            .map_err(storage_failure)?;
        let nodes = documents
            .into_iter()
            .map(Review::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ReviewPage { nodes, total_count })
    }
}

/// Builds the MongoDB sort document of a sort key, newest first among equal ratings.
fn sorting_doc(sort_key: SortKey) -> Document {
    match sort_key {
        SortKey::Recency => doc! { "created_at": -1 },
        SortKey::RatingDesc => doc! { "rating": -1, "created_at": -1 },
        SortKey::RatingAsc => doc! { "rating": 1, "created_at": -1 },
    }
}

/// Builds the `$set` document of a patch, touching only the fields it changes.
fn patch_doc(patch: &ReviewPatch) -> Document {
    let mut set = doc! { "updated_at": DateTime::from_chrono(patch.updated_at) };
    if let Some(rating) = patch.rating {
        set.insert("rating", i32::from(rating));
    }
    if let Some(comment) = &patch.comment {
        set.insert(
            "comment",
            comment.clone().map(Bson::String).unwrap_or(Bson::Null),
        );
    }
    set
}

fn is_duplicate_key(error: &Error) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY_CODE
    )
}

fn storage_failure(error: Error) -> ReviewError {
    error!("MongoDB operation failed: {}", error);
    ReviewError::StorageFailure(error.to_string())
}

/// Reads a numeric field of an aggregation result, whatever integer width MongoDB picked.
fn number_field(document: &Document, key: &str) -> i64 {
    match document.get(key) {
        Some(Bson::Int32(value)) => i64::from(*value),
        Some(Bson::Int64(value)) => *value,
        Some(Bson::Double(value)) => *value as i64,
        _ => 0,
    }
}

#[async_trait]
impl ReviewRepository for MongoReviewRepository {
    async fn create(&self, review: &Review) -> Result<(), ReviewError> {
        debug!(
            "Inserting review `{}` for movie `{}` by user `{}`.",
            review.id, review.movie_id, review.user_id
        );
        match self
            .collection
            .insert_one(ReviewDocument::from(review), None)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => {
                warn!(
                    "User `{}` has already reviewed movie `{}` (unique index).",
                    review.user_id, review.movie_id
                );
                Err(ReviewError::DuplicateReview {
                    movie_id: review.movie_id,
                    user_id: review.user_id,
                })
            }
            Err(e) => Err(storage_failure(e)),
        }
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Review, ReviewError> {
        let filter = doc! { "_id": bson::Uuid::from_uuid_1(id) };
        match self.collection.find_one(filter, None).await {
            Ok(Some(document)) => Review::try_from(document),
            Ok(None) => Err(ReviewError::review_not_found(id)),
            Err(e) => Err(storage_failure(e)),
        }
    }

    async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        patch: &ReviewPatch,
    ) -> Result<Review, ReviewError> {
        let filter = doc! {
            "_id": bson::Uuid::from_uuid_1(id),
            "user_id": bson::Uuid::from_uuid_1(user_id),
        };
        let update = doc! { "$set": patch_doc(patch) };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        match self
            .collection
            .find_one_and_update(filter, update, options)
            .await
        {
            Ok(Some(document)) => Review::try_from(document),
            Ok(None) => {
                warn!("No review `{}` owned by user `{}` to update.", id, user_id);
                Err(ReviewError::review_not_found(id))
            }
            Err(e) => Err(storage_failure(e)),
        }
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<(), ReviewError> {
        let filter = doc! {
            "_id": bson::Uuid::from_uuid_1(id),
            "user_id": bson::Uuid::from_uuid_1(user_id),
        };
        let result = self
            .collection
            .delete_one(filter, None)
            .await
            .map_err(storage_failure)?;
        if result.deleted_count == 0 {
            warn!("No review `{}` owned by user `{}` to delete.", id, user_id);
            return Err(ReviewError::review_not_found(id));
        }
        Ok(())
    }

    async fn list_by_movie(
        &self,
        movie_id: Uuid,
        query: &ListQuery,
    ) -> Result<ReviewPage, ReviewError> {
        self.list(doc! { "movie_id": bson::Uuid::from_uuid_1(movie_id) }, query)
            .await
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        query: &ListQuery,
    ) -> Result<ReviewPage, ReviewError> {
        self.list(doc! { "user_id": bson::Uuid::from_uuid_1(user_id) }, query)
            .await
    }

    async fn aggregate(&self, movie_id: Uuid) -> Result<AggregatedRating, ReviewError> {
        let pipeline = vec![
            doc! { "$match": { "movie_id": bson::Uuid::from_uuid_1(movie_id) } },
            doc! {
                "$group": {
                    "_id": Bson::Null,
                    "rating_sum": { "$sum": "$rating" },
                    "rating_count": { "$sum": 1 },
                }
            },
        ];
        let totals: Option<Document> = self
            .collection
            .aggregate(pipeline, None)
            .await
            .map_err(storage_failure)?
            .try_next()
            .await
            .map_err(storage_failure)?;
        let (sum, count) = totals
            .map(|document| {
                (
                    number_field(&document, "rating_sum"),
                    number_field(&document, "rating_count").max(0) as u64,
                )
            })
            .unwrap_or((0, 0));
        Ok(aggregate_totals(movie_id, sum, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorting_documents_break_ties_by_creation() {
        let keys: Vec<String> = sorting_doc(SortKey::RatingAsc).keys().cloned().collect();
        assert_eq!(keys, vec!["rating", "created_at"]);
        assert_eq!(sorting_doc(SortKey::RatingAsc).get_i32("rating").unwrap(), 1);
        assert_eq!(sorting_doc(SortKey::RatingDesc).get_i32("rating").unwrap(), -1);
        assert_eq!(sorting_doc(SortKey::Recency).get_i32("created_at").unwrap(), -1);
    }

    #[test]
    fn document_conversion_drops_enrichment() {
        let mut review = Review::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Rating::new(8).unwrap(),
            Some("Tense.".to_string()),
        );
        review.username = Some("alice".to_string());
        review.movie_title = Some("Heat".to_string());

        let restored = Review::try_from(ReviewDocument::from(&review)).unwrap();
        assert_eq!(restored.id, review.id);
        assert_eq!(restored.rating, review.rating);
        assert_eq!(restored.comment, review.comment);
        assert_eq!(restored.username, None);
        assert_eq!(restored.movie_title, None);
        assert_eq!(
            restored.created_at.timestamp_millis(),
            review.created_at.timestamp_millis()
        );
    }

    #[test]
    fn patch_sets_only_changed_fields() {
        let rating_only = patch_doc(&ReviewPatch {
            rating: Some(Rating::new(9).unwrap()),
            comment: None,
            updated_at: chrono::Utc::now(),
        });
        assert_eq!(rating_only.get_i32("rating").unwrap(), 9);
        assert!(!rating_only.contains_key("comment"));
        assert!(rating_only.contains_key("updated_at"));

        let cleared = patch_doc(&ReviewPatch {
            rating: None,
            comment: Some(None),
            updated_at: chrono::Utc::now(),
        });
        assert!(!cleared.contains_key("rating"));
        assert_eq!(cleared.get("comment"), Some(&Bson::Null));
    }

    #[test]
    fn aggregation_numbers_accept_any_width() {
        let document = doc! { "a": 3i32, "b": 7i64, "c": 2.0f64 };
        assert_eq!(number_field(&document, "a"), 3);
        assert_eq!(number_field(&document, "b"), 7);
        assert_eq!(number_field(&document, "c"), 2);
        assert_eq!(number_field(&document, "missing"), 0);
    }
}

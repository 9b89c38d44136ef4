use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ReviewError;

/// Maximum length of a review comment in characters.
pub const MAX_COMMENT_CHARS: usize = 2000;

/// The review of a user about a movie.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Review UUID, generated by the writer.
    pub id: Uuid,
    /// UUID of the movie that the review is about.
    pub movie_id: Uuid,
    /// UUID of the user owning the review.
    pub user_id: Uuid,
    /// Rating of review in 1-10 points.
    pub rating: Rating,
    /// Optional free-text comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Timestamp when review was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp when review was last modified.
    pub updated_at: DateTime<Utc>,
    /// Username of the owner, resolved at read time. Never persisted.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub username: Option<String>,
    /// Title of the movie, resolved at read time. Never persisted.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub movie_title: Option<String>,
}

impl Review {
    /// Creates a new review with a fresh UUID and both timestamps set to now.
    pub fn new(movie_id: Uuid, user_id: Uuid, rating: Rating, comment: Option<String>) -> Self {
        let current_timestamp = Utc::now();
        Self {
            id: Uuid::new_v4(),
            movie_id,
            user_id,
            rating,
            comment,
            created_at: current_timestamp,
            updated_at: current_timestamp,
            username: None,
            movie_title: None,
        }
    }
}

/// Changes of a review by its owner. Absent fields keep their stored value.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewPatch {
    pub rating: Option<Rating>,
    /// `Some(None)` removes the stored comment.
    pub comment: Option<Option<String>>,
    pub updated_at: DateTime<Utc>,
}

impl ReviewPatch {
    /// Applies the changed fields to `review`.
    pub fn apply_to(&self, review: &mut Review) {
        if let Some(rating) = self.rating {
            review.rating = rating;
        }
        if let Some(comment) = &self.comment {
            review.comment = comment.clone();
        }
        review.updated_at = self.updated_at;
    }
}

/// Rating of a review, always within `1..=10`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: i32 = 1;
    pub const MAX: i32 = 10;

    pub fn new(value: i32) -> Result<Self, ReviewError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ReviewError::Validation(format!(
                "Rating must be between {} and {}, got {}.",
                Self::MIN,
                Self::MAX,
                value
            )))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i32> for Rating {
    type Error = ReviewError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Rating::new(value)
    }
}

impl From<Rating> for i32 {
    fn from(value: Rating) -> Self {
        i32::from(value.0)
    }
}

/// Checks that an optional comment stays within [`MAX_COMMENT_CHARS`].
pub fn validate_comment(comment: Option<&str>) -> Result<(), ReviewError> {
    match comment {
        Some(text) if text.chars().count() > MAX_COMMENT_CHARS => Err(ReviewError::Validation(
            format!("Comment must not exceed {} characters.", MAX_COMMENT_CHARS),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ratings_within_bounds() {
        for value in 1..=10 {
            assert_eq!(Rating::new(value).unwrap().value() as i32, value);
        }
    }

    #[test]
    fn rejects_ratings_outside_bounds() {
        assert!(matches!(Rating::new(0), Err(ReviewError::Validation(_))));
        assert!(matches!(Rating::new(11), Err(ReviewError::Validation(_))));
        assert!(matches!(Rating::new(-3), Err(ReviewError::Validation(_))));
    }

    #[test]
    fn comment_length_is_counted_in_characters() {
        let at_limit = "é".repeat(MAX_COMMENT_CHARS);
        assert!(validate_comment(Some(&at_limit)).is_ok());
        let over_limit = "a".repeat(MAX_COMMENT_CHARS + 1);
        assert!(validate_comment(Some(&over_limit)).is_err());
        assert!(validate_comment(None).is_ok());
    }

    #[test]
    fn transient_fields_are_omitted_when_unresolved() {
        let review = Review::new(Uuid::new_v4(), Uuid::new_v4(), Rating::new(7).unwrap(), None);
        let json = serde_json::to_value(&review).unwrap();
        assert!(json.get("username").is_none());
        assert!(json.get("movieTitle").is_none());
        assert_eq!(json["rating"], 7);
    }
}

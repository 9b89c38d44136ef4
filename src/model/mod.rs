pub mod aggregated_rating;
pub mod list_query;
pub mod review;
pub mod review_page;

pub use aggregated_rating::AggregatedRating;
pub use list_query::{ListQuery, SortKey};
pub use review::{Rating, Review, ReviewPatch};
pub use review_page::{ReviewListing, ReviewPage};

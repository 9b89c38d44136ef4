use serde::Serialize;

use super::{list_query::ListQuery, review::Review};

/// A page of reviews as returned by a repository listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewPage {
    /// The reviews on the requested page, in sort order.
    pub nodes: Vec<Review>,
    /// The total amount of reviews matching the listing, independent of the page.
    pub total_count: u64,
}

impl ReviewPage {
    pub fn empty(total_count: u64) -> Self {
        Self {
            nodes: Vec::new(),
            total_count,
        }
    }
}

/// A page of enriched reviews together with its pagination metadata.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewListing {
    pub reviews: Vec<Review>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
}

impl ReviewListing {
    pub fn new(reviews: Vec<Review>, total_count: u64, query: &ListQuery) -> Self {
        Self {
            reviews,
            total_count,
            page: query.page(),
            page_size: query.page_size(),
        }
    }
}

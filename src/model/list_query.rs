pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 50;

/// Describes the orders that a review listing can be sorted by.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum SortKey {
    /// Newest reviews first.
    #[default]
    Recency,
    /// Highest ratings first, newest first among equal ratings.
    RatingDesc,
    /// Lowest ratings first, newest first among equal ratings.
    RatingAsc,
}

impl SortKey {
    /// Parses the `sort_by` query value. Unknown values fall back to [`SortKey::Recency`].
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("rating_desc") => SortKey::RatingDesc,
            Some("rating_asc") => SortKey::RatingAsc,
            _ => SortKey::Recency,
        }
    }
}

/// Page, page size and sort order of a review listing.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ListQuery {
    page: u32,
    page_size: u32,
    pub sort_key: SortKey,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort_key: SortKey::default(),
        }
    }
}

impl ListQuery {
    /// Builds a query, raising `page` to at least 1 and clamping `page_size` into `1..=50`.
    pub fn new(page: u32, page_size: u32, sort_key: SortKey) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            sort_key,
        }
    }

    /// Builds a query from raw query string values.
    ///
    /// Missing, unparsable or non-positive `page` becomes 1, missing, unparsable or non-positive
    /// `limit` becomes the default page size and anything above the maximum is capped.
    pub fn from_raw(page: Option<&str>, limit: Option<&str>, sort_by: Option<&str>) -> Self {
        let page = page
            .and_then(|value| value.trim().parse::<i64>().ok())
            .filter(|value| *value > 0)
            .map(|value| u32::try_from(value).unwrap_or(u32::MAX))
            .unwrap_or(1);
        let page_size = limit
            .and_then(|value| value.trim().parse::<i64>().ok())
            .filter(|value| *value > 0)
            .map(|value| value.min(i64::from(MAX_PAGE_SIZE)) as u32)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        Self::new(page, page_size, SortKey::parse_lenient(sort_by))
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of rows skipped before the requested page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_values_are_missing() {
        let query = ListQuery::from_raw(None, None, None);
        assert_eq!(query, ListQuery::default());
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn lenient_parsing_matches_query_string_conventions() {
        let query = ListQuery::from_raw(Some("abc"), Some("-4"), Some("bogus"));
        assert_eq!(query.page(), 1);
        assert_eq!(query.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(query.sort_key, SortKey::Recency);

        let query = ListQuery::from_raw(Some("3"), Some("500"), Some("rating_asc"));
        assert_eq!(query.page(), 3);
        assert_eq!(query.page_size(), MAX_PAGE_SIZE);
        assert_eq!(query.sort_key, SortKey::RatingAsc);
        assert_eq!(query.offset(), 100);
    }

    #[test]
    fn new_clamps_into_bounds() {
        let query = ListQuery::new(0, 0, SortKey::RatingDesc);
        assert_eq!(query.page(), 1);
        assert_eq!(query.page_size(), 1);
        assert_eq!(ListQuery::new(2, 99, SortKey::Recency).page_size(), MAX_PAGE_SIZE);
    }
}

//! Rating aggregation over reviews already fetched by a repository.

use uuid::Uuid;

use crate::model::{AggregatedRating, Rating};

/// Computes average and count of `ratings` for a movie.
pub fn aggregate_ratings<I>(movie_id: Uuid, ratings: I) -> AggregatedRating
where
    I: IntoIterator<Item = Rating>,
{
    let (sum, count) = ratings
        .into_iter()
        .fold((0i64, 0u64), |(sum, count), rating| {
            (sum + i64::from(rating.value()), count + 1)
        });
    aggregate_totals(movie_id, sum, count)
}

/// Builds the aggregate from a precomputed rating sum and count.
///
/// The average is exactly `0` when `count` is zero.
pub fn aggregate_totals(movie_id: Uuid, sum: i64, count: u64) -> AggregatedRating {
    let average_rating = if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    };
    AggregatedRating {
        movie_id,
        average_rating,
        rating_count: count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratings(values: &[i32]) -> Vec<Rating> {
        values.iter().map(|v| Rating::new(*v).unwrap()).collect()
    }

    #[test]
    fn averages_ratings() {
        let movie_id = Uuid::new_v4();
        let aggregate = aggregate_ratings(movie_id, ratings(&[2, 4, 6]));
        assert_eq!(aggregate.movie_id, movie_id);
        assert_eq!(aggregate.average_rating, 4.0);
        assert_eq!(aggregate.rating_count, 3);
    }

    #[test]
    fn no_ratings_yield_zero_average() {
        let aggregate = aggregate_ratings(Uuid::new_v4(), Vec::new());
        assert_eq!(aggregate.average_rating, 0.0);
        assert!(!aggregate.average_rating.is_nan());
        assert_eq!(aggregate.rating_count, 0);
    }

    #[test]
    fn fractional_averages_are_kept() {
        let aggregate = aggregate_ratings(Uuid::new_v4(), ratings(&[10, 9]));
        assert_eq!(aggregate.average_rating, 9.5);
    }
}

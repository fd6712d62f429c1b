use serde::Serialize;
use std::collections::HashSet;

use super::Book;

const PERIODS: [(&str, i32, i32); 5] = [
    ("1600-1900: Early Period", 1600, 1900),
    ("1900-1950: Modern Era", 1900, 1950),
    ("1950-1980: Civil Rights & Beyond", 1950, 1980),
    ("1980-2000: Contemporary Wave", 1980, 2000),
    ("2000-2025: Current Voices", 2000, 2025),
];

#[derive(Debug, Clone, Serialize)]
pub struct TimelinePeriod {
    pub name: String,
    pub start: i32,
    pub end: i32,
    pub books: Vec<Book>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimelineStats {
    pub total: usize,
    pub years_span: i32,
    pub countries: usize,
    pub genres: usize,
}

/// Sorts by year and buckets into the named periods. Ranges are half-open and
/// books outside every range are dropped; empty periods are omitted.
pub fn group_by_period<'a, I>(books: I) -> Vec<TimelinePeriod>
where
    I: IntoIterator<Item = &'a Book>,
{
    let mut sorted: Vec<&Book> = books.into_iter().collect();
    sorted.sort_by_key(|book| book.year);

    let mut periods: Vec<TimelinePeriod> = PERIODS
        .iter()
        .map(|(name, start, end)| TimelinePeriod {
            name: name.to_string(),
            start: *start,
            end: *end,
            books: Vec::new(),
        })
        .collect();

    for book in sorted {
        if let Some(period) = periods
            .iter_mut()
            .find(|period| book.year >= period.start && book.year < period.end)
        {
            period.books.push(book.clone());
        }
    }

    periods.retain(|period| !period.books.is_empty());
    periods
}

pub fn timeline_stats<'a, I>(books: I) -> TimelineStats
where
    I: IntoIterator<Item = &'a Book>,
{
    let books: Vec<&Book> = books.into_iter().collect();
    let years_span = match (
        books.iter().map(|book| book.year).min(),
        books.iter().map(|book| book.year).max(),
    ) {
        (Some(min), Some(max)) => max - min,
        _ => 0,
    };
    let countries: HashSet<&str> = books.iter().map(|book| book.country.as_str()).collect();
    let genres: HashSet<_> = books.iter().map(|book| book.genre).collect();
    TimelineStats {
        total: books.len(),
        years_span,
        countries: countries.len(),
        genres: genres.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Genre;
    use crate::catalog::tests::book;

    #[test]
    fn groups_sorted_books_and_skips_out_of_range_years() {
        let books = vec![
            book(1, 1999, "USA", Genre::Poetry),
            book(2, 1900, "Mexico", Genre::History),
            book(3, 1550, "Spain", Genre::History),
            book(4, 1985, "Cuba", Genre::Diaspora),
            book(5, 2025, "USA", Genre::Poetry),
        ];
        let periods = group_by_period(&books);
        let names: Vec<&str> = periods.iter().map(|period| period.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["1900-1950: Modern Era", "1980-2000: Contemporary Wave"]
        );
        let ids: Vec<u64> = periods[1].books.iter().map(|book| book.id).collect();
        assert_eq!(ids, vec![4, 1]);
    }

    #[test]
    fn stats_count_distinct_countries_and_genres() {
        let books = vec![
            book(1, 1950, "USA", Genre::Poetry),
            book(2, 2010, "USA", Genre::Poetry),
            book(3, 1980, "Chile", Genre::Biography),
        ];
        let stats = timeline_stats(&books);
        assert_eq!(
            stats,
            TimelineStats {
                total: 3,
                years_span: 60,
                countries: 2,
                genres: 2
            }
        );
        assert_eq!(timeline_stats(Vec::<Book>::new().iter()).years_span, 0);
    }
}

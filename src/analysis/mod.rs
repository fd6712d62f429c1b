//! Keyword-level connection analysis between free text and selected books.
//!
//! [`analyze`] is total: it never fails and every collection in the result is
//! present (possibly empty) whatever the inputs.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

mod commentary;
mod linguistic;
mod temporal;

pub use commentary::{Commentary, identify_enhancements, identify_limitations};
pub use linguistic::{LinguisticStats, analyze_linguistic};
pub use temporal::{PeriodCount, TemporalStats, analyze_temporal, categorize_years};

use crate::catalog::{Book, Genre};
use crate::clock::format_timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub themes: bool,
    pub theory: bool,
    pub temporal: bool,
    pub geographic: bool,
    pub genre: bool,
    pub linguistic: bool,
}

impl AnalysisOptions {
    pub fn all() -> Self {
        Self {
            themes: true,
            theory: true,
            temporal: true,
            geographic: true,
            genre: true,
            linguistic: true,
        }
    }

    pub fn none() -> Self {
        Self {
            themes: false,
            theory: false,
            temporal: false,
            geographic: false,
            genre: false,
            linguistic: false,
        }
    }

    /// Builds options from dimension names (`themes`, `theory`, `temporal`,
    /// `geographic`, `genre`, `linguistic`). Unknown names are returned as the error.
    pub fn from_names<'a, I>(names: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut options = Self::none();
        for name in names {
            match name.trim().to_lowercase().as_str() {
                "themes" | "theme" => options.themes = true,
                "theory" | "theories" => options.theory = true,
                "temporal" => options.temporal = true,
                "geographic" | "geography" => options.geographic = true,
                "genre" | "genres" => options.genre = true,
                "linguistic" => options.linguistic = true,
                _ => return Err(name.to_string()),
            }
        }
        Ok(options)
    }
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self::all()
    }
}

/// A theme or theory term of `book` that occurs in the user text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub term: String,
    pub book: String,
    pub author: String,
}

impl Connection {
    fn new(term: &str, book: &Book) -> Self {
        Self {
            term: term.to_string(),
            book: book.title.clone(),
            author: book.author.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Connections {
    pub themes: Vec<Connection>,
    pub theories: Vec<Connection>,
    pub temporal: Option<TemporalStats>,
    pub geographic: Vec<String>,
    pub genres: Vec<Genre>,
    pub linguistic: Option<LinguisticStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub timestamp: String,
    pub user_text: String,
    pub books: Vec<Book>,
    pub connections: Connections,
    pub enhancements: Vec<Commentary>,
    pub limitations: Vec<Commentary>,
}

pub fn analyze(text: &str, books: &[Book], options: &AnalysisOptions) -> AnalysisResult {
    analyze_at(text, books, options, OffsetDateTime::now_utc())
}

/// Same as [`analyze`] with an explicit timestamp, so the output depends on
/// its arguments only.
pub fn analyze_at(
    text: &str,
    books: &[Book],
    options: &AnalysisOptions,
    at: OffsetDateTime,
) -> AnalysisResult {
    let connections = find_connections(text, books, options);
    let enhancements = identify_enhancements(&connections);
    let limitations = identify_limitations(books);

    AnalysisResult {
        timestamp: format_timestamp(at),
        user_text: text.to_string(),
        books: books.to_vec(),
        connections,
        enhancements,
        limitations,
    }
}

pub fn find_connections(text: &str, books: &[Book], options: &AnalysisOptions) -> Connections {
    let text_lower = text.to_lowercase();
    let mut connections = Connections::default();
    let mut years = Vec::new();

    for book in books {
        if options.themes {
            connections.themes.extend(
                book.themes
                    .iter()
                    .filter(|theme| theme_matches(&text_lower, theme))
                    .map(|theme| Connection::new(theme, book)),
            );
        }
        if options.theory {
            connections.theories.extend(
                book.connecting_theory
                    .iter()
                    .filter(|theory| theory_matches(&text_lower, theory))
                    .map(|theory| Connection::new(theory, book)),
            );
        }
        if options.temporal {
            years.push(book.year);
        }
        if options.geographic && !connections.geographic.contains(&book.country) {
            connections.geographic.push(book.country.clone());
        }
        if options.genre && !connections.genres.contains(&book.genre) {
            connections.genres.push(book.genre);
        }
    }

    if options.temporal {
        connections.temporal = analyze_temporal(&years);
    }
    if options.linguistic {
        connections.linguistic = Some(analyze_linguistic(text));
    }
    connections
}

/// Plain case-insensitive substring containment of the whole theme.
fn theme_matches(text_lower: &str, theme: &str) -> bool {
    let theme = theme.trim().to_lowercase();
    !theme.is_empty() && text_lower.contains(&theme)
}

/// Only the first whitespace-delimited word of the theory has to occur,
/// unlike [`theme_matches`].
fn theory_matches(text_lower: &str, theory: &str) -> bool {
    let theory = theory.to_lowercase();
    match theory.split_whitespace().next() {
        Some(first) => text_lower.contains(first),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::book;
    use time::macros::datetime;

    fn themed(id: u64, themes: &[&str], theories: &[&str]) -> Book {
        let mut book = book(id, 1990, "United States", Genre::Diaspora);
        book.themes = themes.iter().map(|theme| theme.to_string()).collect();
        book.connecting_theory = theories.iter().map(|theory| theory.to_string()).collect();
        book
    }

    #[test]
    fn all_options_off_yields_empty_but_defined_collections() {
        let books = vec![themed(1, &["ocean"], &["Borderlands Theory"])];
        let result = analyze("the ocean and the borderlands", &books, &AnalysisOptions::none());
        assert!(result.connections.themes.is_empty());
        assert!(result.connections.theories.is_empty());
        assert!(result.connections.temporal.is_none());
        assert!(result.connections.geographic.is_empty());
        assert!(result.connections.genres.is_empty());
        assert!(result.connections.linguistic.is_none());
        assert_eq!(result.enhancements.len(), 1);
        assert_eq!(result.books.len(), 1);
    }

    #[test]
    fn empty_inputs_are_safe() {
        let result = analyze("", &[], &AnalysisOptions::all());
        assert!(result.connections.themes.is_empty());
        assert!(result.connections.temporal.is_none());
        let linguistic = result.connections.linguistic.expect("linguistic");
        assert_eq!(linguistic.word_count, 0);
        assert_eq!(linguistic.average_word_length, 0.0);
    }

    #[test]
    fn theme_matching_is_case_insensitive_substring() {
        let books = vec![themed(1, &["ocean", "exile"], &[])];
        let connections = find_connections("I love the Ocean deeply", &books, &AnalysisOptions::all());
        assert_eq!(
            connections.themes,
            vec![Connection {
                term: "ocean".to_string(),
                book: "Book 1".to_string(),
                author: "Author 1".to_string(),
            }]
        );
    }

    #[test]
    fn shared_themes_are_counted_per_book() {
        let books = vec![themed(1, &["Memory"], &[]), themed(2, &["memory"], &[])];
        let connections = find_connections("collective memory", &books, &AnalysisOptions::all());
        assert_eq!(connections.themes.len(), 2);
        assert_eq!(connections.themes[0].term, "Memory");
        assert_eq!(connections.themes[1].book, "Book 2");
    }

    #[test]
    fn theory_matches_on_first_word_only() {
        let books = vec![themed(1, &[], &["Borderlands Theory", "Code-Switching"])];

        let connections = find_connections("Life in the borderlands", &books, &AnalysisOptions::all());
        let terms: Vec<&str> = connections.theories.iter().map(|c| c.term.as_str()).collect();
        assert_eq!(terms, vec!["Borderlands Theory"]);

        // Hyphenated first words are not split: "code" alone is not enough.
        let connections = find_connections("code and switching", &books, &AnalysisOptions::all());
        assert!(connections.theories.is_empty());

        let connections = find_connections("constant code-switching", &books, &AnalysisOptions::all());
        let terms: Vec<&str> = connections.theories.iter().map(|c| c.term.as_str()).collect();
        assert_eq!(terms, vec!["Code-Switching"]);
    }

    #[test]
    fn theme_needs_the_whole_phrase_while_theory_does_not() {
        let books = vec![themed(1, &["mestiza consciousness"], &["Mestiza Consciousness"])];
        let connections = find_connections("a mestiza voice", &books, &AnalysisOptions::all());
        assert!(connections.themes.is_empty());
        assert_eq!(connections.theories.len(), 1);
    }

    #[test]
    fn blank_terms_never_match() {
        let books = vec![themed(1, &["", "  "], &["", " "])];
        let connections = find_connections("anything at all", &books, &AnalysisOptions::all());
        assert!(connections.themes.is_empty());
        assert!(connections.theories.is_empty());
    }

    #[test]
    fn countries_and_genres_are_distinct_in_first_seen_order() {
        let books = vec![
            book(1, 1990, "Chile", Genre::Poetry),
            book(2, 1991, "Mexico", Genre::History),
            book(3, 1992, "Chile", Genre::Poetry),
        ];
        let connections = find_connections("text", &books, &AnalysisOptions::all());
        assert_eq!(connections.geographic, vec!["Chile", "Mexico"]);
        assert_eq!(connections.genres, vec![Genre::Poetry, Genre::History]);
        let temporal = connections.temporal.expect("temporal");
        assert_eq!(temporal.time_span, 2);
    }

    #[test]
    fn identical_inputs_give_identical_results() {
        let books = vec![
            themed(1, &["home", "identity"], &["Chicana Feminism"]),
            book(2, 1922, "Chile", Genre::Poetry),
        ];
        let at = datetime!(2024-05-01 12:00 UTC);
        let options = AnalysisOptions::all();
        let first = analyze_at("Home and identity in chicana writing", &books, &options, at);
        let second = analyze_at("Home and identity in chicana writing", &books, &options, at);
        assert_eq!(first, second);
        assert_eq!(first.timestamp, "2024-05-01T12:00:00Z");
        assert_eq!(first.connections.themes.len(), 2);
        assert_eq!(first.connections.theories.len(), 1);
        assert_eq!(first.limitations.len(), 7);
    }

    #[test]
    fn options_parse_from_names() {
        let options = AnalysisOptions::from_names(["themes", "Temporal"]).expect("options");
        assert!(options.themes && options.temporal);
        assert!(!options.theory && !options.linguistic);
        assert_eq!(AnalysisOptions::from_names(["vibes"]), Err("vibes".to_string()));
    }
}

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

mod timeline;

pub use timeline::{TimelinePeriod, TimelineStats, group_by_period, timeline_stats};

const EMBEDDED_CATALOG: &str = include_str!("../../data/books.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    Poetry,
    History,
    Biography,
    Autobiography,
    Diaspora,
    #[serde(rename = "the body")]
    TheBody,
}

impl Genre {
    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Poetry => "poetry",
            Genre::History => "history",
            Genre::Biography => "biography",
            Genre::Autobiography => "autobiography",
            Genre::Diaspora => "diaspora",
            Genre::TheBody => "the body",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: u64,
    pub title: String,
    pub author: String,
    pub year: i32,
    pub country: String,
    pub genre: Genre,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub connecting_theory: Vec<String>,
    #[serde(default, rename = "abstract")]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
}

/// Read-only book collection, loaded once.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    books: Vec<Book>,
}

impl Catalog {
    pub fn new(books: Vec<Book>) -> Result<Self> {
        let mut seen = HashSet::new();
        for book in &books {
            if !seen.insert(book.id) {
                return Err(anyhow!("duplicate book id {} in catalog", book.id));
            }
        }
        Ok(Self { books })
    }

    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_CATALOG).with_context(|| "failed to parse embedded catalog")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("failed to parse catalog: {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let books: Vec<Book> = serde_json::from_str(raw)?;
        Self::new(books)
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn get(&self, id: u64) -> Option<&Book> {
        self.books.iter().find(|book| book.id == id)
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn filter(&self, filter: &CatalogFilter) -> Vec<&Book> {
        self.books.iter().filter(|book| filter.matches(book)).collect()
    }

    /// Title/author lookup used when picking books for an analysis.
    pub fn search_titles(&self, term: &str) -> Vec<&Book> {
        let term = term.trim().to_lowercase();
        self.books
            .iter()
            .filter(|book| {
                term.is_empty()
                    || book.title.to_lowercase().contains(&term)
                    || book.author.to_lowercase().contains(&term)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogFilter {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub theory: Option<String>,
    pub years: Option<YearRange>,
}

impl CatalogFilter {
    pub fn matches(&self, book: &Book) -> bool {
        self.matches_search(book)
            && self.matches_genre(book)
            && self.matches_theory(book)
            && self.years.is_none_or(|range| range.contains(book.year))
    }

    fn matches_search(&self, book: &Book) -> bool {
        let Some(term) = non_empty_lower(self.search.as_deref()) else {
            return true;
        };
        book.title.to_lowercase().contains(&term)
            || book.author.to_lowercase().contains(&term)
            || book
                .themes
                .iter()
                .any(|theme| theme.to_lowercase().contains(&term))
            || book.summary.to_lowercase().contains(&term)
    }

    fn matches_genre(&self, book: &Book) -> bool {
        match non_empty_lower(self.genre.as_deref()) {
            Some(genre) => book.genre.as_str() == genre,
            None => true,
        }
    }

    fn matches_theory(&self, book: &Book) -> bool {
        match non_empty_lower(self.theory.as_deref()) {
            Some(theory) => book
                .connecting_theory
                .iter()
                .any(|item| item.to_lowercase() == theory),
            None => true,
        }
    }
}

fn non_empty_lower(value: Option<&str>) -> Option<String> {
    let value = value?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_lowercase())
    }
}

/// Inclusive `start-end` year range, e.g. `1900-1950`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn contains(&self, year: i32) -> bool {
        year >= self.start && year <= self.end
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let (start, end) = raw
            .trim()
            .split_once('-')
            .ok_or_else(|| anyhow!("invalid year range '{}' (expected START-END)", raw))?;
        let start = start
            .trim()
            .parse()
            .with_context(|| format!("invalid start year in '{}'", raw))?;
        let end = end
            .trim()
            .parse()
            .with_context(|| format!("invalid end year in '{}'", raw))?;
        Ok(Self { start, end })
    }
}

impl<'de> Deserialize<'de> for YearRange {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        YearRange::parse(&raw).map_err(serde::de::Error::custom)
    }
}

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::analysis::AnalysisResult;
use crate::catalog::Book;
use crate::clock::{format_timestamp, unix_millis};

pub const DEFAULT_HISTORY_LIMIT: usize = 50;
const SUMMARY_CHARS: usize = 200;
const STATE_FILE_NAME: &str = "state.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRef {
    pub id: u64,
    pub title: String,
    pub author: String,
}

impl From<&Book> for BookRef {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: u64,
    pub timestamp: String,
    pub user_text: String,
    pub full_text: String,
    pub books: Vec<BookRef>,
    pub analysis: AnalysisResult,
}

/// Newest-first analysis history capped at `limit` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    entries: Vec<HistoryEntry>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn with_entries(mut entries: Vec<HistoryEntry>, limit: usize) -> Self {
        let limit = limit.max(1);
        entries.truncate(limit);
        Self { entries, limit }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds an entry for `analysis` and puts it first. `now_millis` is the
    /// candidate id; ids stay strictly increasing even if the clock stalls.
    pub fn record(&mut self, analysis: AnalysisResult, now_millis: u64) -> &HistoryEntry {
        let id = match self.entries.first() {
            Some(latest) if latest.id >= now_millis => latest.id + 1,
            _ => now_millis,
        };
        let entry = HistoryEntry {
            id,
            timestamp: analysis.timestamp.clone(),
            user_text: summarize(&analysis.user_text),
            full_text: analysis.user_text.clone(),
            books: analysis.books.iter().map(BookRef::from).collect(),
            analysis,
        };
        self.entries.insert(0, entry);
        if self.entries.len() > self.limit {
            let evicted = self.entries.split_off(self.limit);
            debug!("evicted {} history entries", evicted.len());
        }
        &self.entries[0]
    }

    pub fn get(&self, id: u64) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn delete(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn export_json(&self) -> Result<String> {
        if self.entries.is_empty() {
            return Err(anyhow!("No history to export."));
        }
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }
}

fn summarize(text: &str) -> String {
    if text.chars().count() > SUMMARY_CHARS {
        let head: String = text.chars().take(SUMMARY_CHARS).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

pub fn export_file_name(at: time::OffsetDateTime) -> String {
    format!("literary-lens-history-{}.json", unix_millis(at))
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct StateFile {
    #[serde(default)]
    draft: Option<String>,
    #[serde(default)]
    histories: Vec<HistoryEntry>,
    #[serde(default, rename = "lastSavedAt")]
    last_saved_at: Option<String>,
}

/// JSON file holding the text draft and the analysis history.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.literary-lens/state.json`, or a relative directory when `HOME` is unset.
    pub fn default_location() -> Self {
        Self::at(crate::settings::app_dir().join(STATE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_history(&self, limit: usize) -> Result<History> {
        let state = self.read()?;
        Ok(History::with_entries(state.histories, limit))
    }

    pub fn save_history(&self, history: &History) -> Result<()> {
        let mut state = self.read()?;
        state.histories = history.entries().to_vec();
        self.write(&mut state)
    }

    pub fn load_draft(&self) -> Result<Option<String>> {
        Ok(self.read()?.draft)
    }

    pub fn save_draft(&self, text: &str) -> Result<()> {
        let mut state = self.read()?;
        state.draft = Some(text.to_string());
        self.write(&mut state)
    }

    pub fn clear_draft(&self) -> Result<()> {
        let mut state = self.read()?;
        state.draft = None;
        self.write(&mut state)
    }

    fn read(&self) -> Result<StateFile> {
        if !self.path.exists() {
            return Ok(StateFile::default());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read state: {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse state JSON: {}", self.path.display()))
    }

    fn write(&self, state: &mut StateFile) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).with_context(|| "failed to create state directory")?;
        }
        state.last_saved_at = Some(format_timestamp(time::OffsetDateTime::now_utc()));
        let content = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, content)
            .with_context(|| format!("failed to write state: {}", self.path.display()))?;
        debug!("state written to {}", self.path.display());
        Ok(())
    }
}

/// Writes the pretty-printed history into `dir` and returns the file path.
pub fn export_history(history: &History, dir: &Path, at: time::OffsetDateTime) -> Result<PathBuf> {
    let content = history.export_json()?;
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create export directory: {}", dir.display()))?;
    let path = dir.join(export_file_name(at));
    fs::write(&path, content)
        .with_context(|| format!("failed to write history export: {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisOptions, analyze_at};
    use crate::catalog::Genre;
    use crate::catalog::tests::book;
    use tempfile::tempdir;
    use time::macros::datetime;

    fn result(text: &str) -> AnalysisResult {
        let books = vec![book(7, 1990, "Peru", Genre::History)];
        analyze_at(
            text,
            &books,
            &AnalysisOptions::all(),
            datetime!(2024-03-01 00:00 UTC),
        )
    }

    #[test]
    fn fifty_one_records_keep_the_newest_fifty() {
        let mut history = History::new(DEFAULT_HISTORY_LIMIT);
        for i in 0..51u64 {
            history.record(result(&format!("text {}", i)), 1_000 + i);
        }
        assert_eq!(history.len(), 50);
        assert_eq!(history.entries()[0].full_text, "text 50");
        assert_eq!(history.entries()[49].full_text, "text 1");
        assert!(history.entries().iter().all(|entry| entry.full_text != "text 0"));
    }

    #[test]
    fn ids_stay_monotonic_when_the_clock_repeats() {
        let mut history = History::default();
        let first = history.record(result("a"), 5_000).id;
        let second = history.record(result("b"), 5_000).id;
        let third = history.record(result("c"), 4_000).id;
        assert_eq!((first, second, third), (5_000, 5_001, 5_002));
    }

    #[test]
    fn entry_carries_summary_and_book_refs() {
        let mut history = History::default();
        let long = "x".repeat(250);
        let entry = history.record(result(&long), 1).clone();
        assert_eq!(entry.user_text.chars().count(), 203);
        assert!(entry.user_text.ends_with("..."));
        assert_eq!(entry.full_text, long);
        assert_eq!(
            entry.books,
            vec![BookRef {
                id: 7,
                title: "Book 7".to_string(),
                author: "Author 7".to_string()
            }]
        );
        assert_eq!(entry.timestamp, "2024-03-01T00:00:00Z");
    }

    #[test]
    fn delete_and_clear() {
        let mut history = History::default();
        let id = history.record(result("a"), 10).id;
        history.record(result("b"), 20);
        assert!(history.delete(id));
        assert!(!history.delete(id));
        assert_eq!(history.len(), 1);
        history.clear();
        assert!(history.is_empty());
        assert!(history.export_json().is_err());
    }

    #[test]
    fn state_store_round_trips_history_and_draft() {
        let dir = tempdir().expect("tempdir");
        let store = StateStore::at(dir.path().join("nested").join("state.json"));
        assert!(store.load_history(50).expect("empty").is_empty());
        assert_eq!(store.load_draft().expect("draft"), None);

        let mut history = History::default();
        history.record(result("persist me"), 42);
        store.save_history(&history).expect("save history");
        store.save_draft("half-written thought").expect("save draft");

        let loaded = store.load_history(50).expect("load");
        assert_eq!(loaded, history);
        assert_eq!(
            store.load_draft().expect("draft").as_deref(),
            Some("half-written thought")
        );

        store.clear_draft().expect("clear draft");
        assert_eq!(store.load_draft().expect("draft"), None);
        assert_eq!(store.load_history(50).expect("load").len(), 1);
    }

    #[test]
    fn loading_applies_a_smaller_limit() {
        let dir = tempdir().expect("tempdir");
        let store = StateStore::at(dir.path().join("state.json"));
        let mut history = History::default();
        for i in 0..5 {
            history.record(result("t"), i);
        }
        store.save_history(&history).expect("save");
        assert_eq!(store.load_history(3).expect("load").len(), 3);
    }

    #[test]
    fn export_writes_timestamped_pretty_json() {
        let dir = tempdir().expect("tempdir");
        let mut history = History::default();
        history.record(result("export me"), 99);
        let at = datetime!(2024-01-02 03:04:05.250 UTC);
        let path = export_history(&history, dir.path(), at).expect("export");
        assert_eq!(
            path.file_name().and_then(|name| name.to_str()),
            Some("literary-lens-history-1704164645250.json")
        );
        let content = fs::read_to_string(path).expect("read export");
        assert!(content.starts_with("[\n  {"));
        let parsed: Vec<HistoryEntry> = serde_json::from_str(&content).expect("parse export");
        assert_eq!(parsed[0].full_text, "export me");
    }
}

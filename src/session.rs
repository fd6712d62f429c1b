use std::sync::Arc;
use tracing::info;

use crate::analysis::{AnalysisOptions, AnalysisResult, analyze_at};
use crate::catalog::{Book, Catalog};
use crate::clock::{Clock, unix_millis};
use crate::history::{History, HistoryEntry};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("Please enter some text to analyze.")]
    EmptyText,

    #[error("Please select at least one book for comparison.")]
    NoBooksSelected,

    #[error("Unknown book id {0}")]
    UnknownBook(u64),
}

/// Current selection, options and history for one user, with the catalog and
/// clock injected.
pub struct AnalysisSession {
    catalog: Arc<Catalog>,
    clock: Arc<dyn Clock>,
    selected: Vec<u64>,
    options: AnalysisOptions,
    history: History,
}

impl AnalysisSession {
    pub fn new(catalog: Arc<Catalog>, clock: Arc<dyn Clock>, history: History) -> Self {
        Self {
            catalog,
            clock,
            selected: Vec::new(),
            options: AnalysisOptions::default(),
            history,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    pub fn options(&self) -> AnalysisOptions {
        self.options
    }

    pub fn set_options(&mut self, options: AnalysisOptions) {
        self.options = options;
    }

    /// Adds the book when it is not selected yet, removes it otherwise.
    /// Returns whether the book is selected afterwards.
    pub fn toggle_book(&mut self, id: u64) -> Result<bool, AnalysisError> {
        if self.catalog.get(id).is_none() {
            return Err(AnalysisError::UnknownBook(id));
        }
        if let Some(pos) = self.selected.iter().position(|selected| *selected == id) {
            self.selected.remove(pos);
            Ok(false)
        } else {
            self.selected.push(id);
            Ok(true)
        }
    }

    pub fn select_books(&mut self, ids: &[u64]) -> Result<(), AnalysisError> {
        if let Some(unknown) = ids.iter().find(|id| self.catalog.get(**id).is_none()) {
            return Err(AnalysisError::UnknownBook(*unknown));
        }
        self.selected.clear();
        for id in ids {
            if !self.selected.contains(id) {
                self.selected.push(*id);
            }
        }
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn selected_books(&self) -> Vec<Book> {
        self.selected
            .iter()
            .filter_map(|id| self.catalog.get(*id).cloned())
            .collect()
    }

    /// Validates the input, runs the analysis over the selected books and
    /// records it in the history.
    pub fn generate(&mut self, text: &str) -> Result<AnalysisResult, AnalysisError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AnalysisError::EmptyText);
        }
        let books = self.selected_books();
        if books.is_empty() {
            return Err(AnalysisError::NoBooksSelected);
        }

        let now = self.clock.now();
        let result = analyze_at(text, &books, &self.options, now);
        let entry = self.history.record(result.clone(), unix_millis(now));
        info!(
            "analysis {} recorded ({} books, {} theme connections)",
            entry.id,
            books.len(),
            result.connections.themes.len()
        );
        Ok(result)
    }

    /// A stored entry together with the catalog books it still resolves to.
    pub fn view_history_item(&self, id: u64) -> Option<(&HistoryEntry, Vec<Book>)> {
        let entry = self.history.get(id)?;
        let books = entry
            .books
            .iter()
            .filter_map(|book| self.catalog.get(book.id).cloned())
            .collect();
        Some((entry, books))
    }

    /// Makes the entry's books the current selection and hands back its text.
    pub fn restore_selection(&mut self, id: u64) -> Option<String> {
        let entry = self.history.get(id)?;
        let ids: Vec<u64> = entry
            .books
            .iter()
            .map(|book| book.id)
            .filter(|id| self.catalog.get(*id).is_some())
            .collect();
        let text = entry.full_text.clone();
        self.selected = ids;
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Genre;
    use crate::catalog::tests::book;
    use crate::clock::tests::SteppingClock;
    use time::Duration;
    use time::macros::datetime;

    fn session() -> AnalysisSession {
        let mut poetry = book(1, 1922, "Chile", Genre::Poetry);
        poetry.themes = vec!["grief".to_string()];
        let catalog = Catalog::new(vec![
            poetry,
            book(2, 1987, "United States", Genre::Autobiography),
            book(3, 2014, "Mexico", Genre::Poetry),
        ])
        .expect("catalog");
        let clock = SteppingClock::new(datetime!(2024-06-01 10:00 UTC), Duration::milliseconds(1));
        AnalysisSession::new(Arc::new(catalog), Arc::new(clock), History::default())
    }

    #[test]
    fn rejects_blank_text_and_empty_selection() {
        let mut session = session();
        assert_eq!(session.generate("   "), Err(AnalysisError::EmptyText));
        assert_eq!(
            session.generate("some text"),
            Err(AnalysisError::NoBooksSelected)
        );
        assert!(session.history().is_empty());
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut session = session();
        assert_eq!(session.toggle_book(2), Ok(true));
        assert_eq!(session.toggle_book(1), Ok(true));
        let ids: Vec<u64> = session.selected_books().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(session.toggle_book(2), Ok(false));
        assert_eq!(session.toggle_book(99), Err(AnalysisError::UnknownBook(99)));
        assert_eq!(session.selected_books().len(), 1);
    }

    #[test]
    fn generate_records_history_newest_first() {
        let mut session = session();
        session.select_books(&[1, 3]).expect("select");
        let first = session.generate("  grief and more grief ").expect("analysis");
        assert_eq!(first.user_text, "grief and more grief");
        assert_eq!(first.connections.themes.len(), 1);
        assert_eq!(first.connections.geographic, vec!["Chile", "Mexico"]);

        session.select_books(&[2]).expect("select");
        session.generate("another").expect("analysis");

        let entries = session.history().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].full_text, "another");
        assert!(entries[0].id > entries[1].id);
    }

    #[test]
    fn history_item_resolves_books_and_restores_selection() {
        let mut session = session();
        session.select_books(&[3, 1]).expect("select");
        session.generate("text").expect("analysis");
        let id = session.history().entries()[0].id;
        session.clear_selection();

        let (entry, books) = session.view_history_item(id).expect("entry");
        assert_eq!(entry.full_text, "text");
        assert_eq!(books.iter().map(|b| b.id).collect::<Vec<_>>(), vec![3, 1]);

        assert_eq!(session.restore_selection(id).as_deref(), Some("text"));
        assert_eq!(session.selected_books().len(), 2);
        assert!(session.view_history_item(id + 1_000).is_none());
    }
}

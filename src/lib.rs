use anyhow::{Context, Result, anyhow};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod analysis;
pub mod catalog;
pub mod clock;
pub mod debounce;
pub mod history;
pub mod languages;
pub mod logging;
pub mod server;
pub mod session;
pub mod settings;
pub mod translation;

pub use analysis::{AnalysisOptions, AnalysisResult, analyze};
pub use catalog::{Book, Catalog, CatalogFilter, Genre};
pub use history::{History, HistoryEntry, StateStore};
pub use session::{AnalysisError, AnalysisSession};
pub use translation::{TranslationOutcome, TranslationReport, TranslationService};

use clock::{Clock, SystemClock};
use languages::LanguageCatalog;
use translation::{MyMemory, QualityReport};

#[derive(Debug, Clone)]
pub struct Config {
    pub settings_path: Option<String>,
    pub catalog_path: Option<String>,
    pub command: Command,
}

#[derive(Debug, Clone)]
pub enum Command {
    Books {
        filter: CatalogFilter,
        lookup: Option<String>,
    },
    Timeline {
        filter: CatalogFilter,
    },
    Analyze {
        books: Vec<u64>,
        only: Vec<String>,
    },
    Translate {
        from: String,
        to: String,
    },
    Detect,
    Languages,
    History(HistoryCommand),
    Draft(DraftCommand),
    Serve {
        addr: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub enum HistoryCommand {
    List,
    Show(u64),
    Delete(u64),
    Clear,
    Export { dir: PathBuf },
}

#[derive(Debug, Clone, Copy)]
pub enum DraftCommand {
    Save,
    Show,
    Clear,
}

impl Command {
    /// Commands that read their text from stdin.
    pub fn needs_input(&self) -> bool {
        matches!(
            self,
            Command::Analyze { .. }
                | Command::Translate { .. }
                | Command::Detect
                | Command::Draft(DraftCommand::Save)
        )
    }
}

pub async fn run(config: Config, input: Option<String>) -> Result<String> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path)?;
    let catalog_path = config
        .catalog_path
        .map(PathBuf::from)
        .or_else(|| settings.catalog_path.clone());
    let catalog = Arc::new(match catalog_path {
        Some(path) => Catalog::load(&path)?,
        None => Catalog::embedded()?,
    });
    let store = StateStore::default_location();
    let input = input.unwrap_or_default();

    match config.command {
        Command::Books { filter, lookup } => {
            let books: Vec<&Book> = match lookup {
                Some(term) => catalog.search_titles(&term),
                None => catalog.filter(&filter),
            };
            Ok(format_books(&books))
        }
        Command::Timeline { filter } => {
            let books = catalog.filter(&filter);
            Ok(format_timeline(&books))
        }
        Command::Analyze { books, only } => {
            let mut options = AnalysisOptions::all();
            if !only.is_empty() {
                options = AnalysisOptions::from_names(only.iter().map(String::as_str))
                    .map_err(|name| anyhow!("unknown analysis dimension '{}'", name))?;
            }
            let history = store.load_history(settings.history_limit)?;
            let mut session = AnalysisSession::new(catalog, Arc::new(SystemClock), history);
            session.select_books(&books)?;
            session.set_options(options);
            let result = session.generate(&input)?;
            store.save_history(session.history())?;
            Ok(serde_json::to_string_pretty(&result)?)
        }
        Command::Translate { from, to } => {
            let service = translation_service(&settings)?;
            let languages = LanguageCatalog::load()?;
            if !languages.is_known(&from) {
                return Err(anyhow!("unknown language code '{}'", from));
            }
            if !languages.is_target(&to) {
                return Err(anyhow!("'{}' is not a target language", to));
            }
            let report = service.translate_with_report(&input, &from, &to).await;
            if let Some(error) = report.error {
                return Err(anyhow!(error));
            }
            Ok(format_translation(&report, &languages))
        }
        Command::Detect => {
            let service = translation_service(&settings)?;
            let languages = LanguageCatalog::load()?;
            let code = service.detect_language(&input).await;
            Ok(format!("{}\t{}", code, languages.name(&code)))
        }
        Command::Languages => {
            let languages = LanguageCatalog::load()?;
            let lines: Vec<String> = languages
                .all_sorted()
                .into_iter()
                .map(|entry| format!("{}\t{}", entry.code, entry.name))
                .collect();
            Ok(lines.join("\n"))
        }
        Command::History(command) => run_history(command, &store, settings.history_limit),
        Command::Draft(command) => run_draft(command, &store, &input),
        Command::Serve { addr } => {
            let addr = addr.unwrap_or_else(|| settings.server_addr.clone());
            server::run_server(settings, catalog, store, addr).await?;
            Ok(String::new())
        }
    }
}

fn translation_service(settings: &settings::Settings) -> Result<TranslationService<MyMemory>> {
    let backend = MyMemory::new(
        settings.translation_endpoint.clone(),
        settings.request_timeout,
    )?;
    Ok(TranslationService::new(backend, settings.translation_config()))
}

fn run_history(command: HistoryCommand, store: &StateStore, limit: usize) -> Result<String> {
    let mut stored = store.load_history(limit)?;
    match command {
        HistoryCommand::List => Ok(format_history(&stored)),
        HistoryCommand::Show(id) => {
            let entry = stored
                .get(id)
                .ok_or_else(|| anyhow!("history entry {} not found", id))?;
            Ok(serde_json::to_string_pretty(entry)?)
        }
        HistoryCommand::Delete(id) => {
            if !stored.delete(id) {
                return Err(anyhow!("history entry {} not found", id));
            }
            store.save_history(&stored)?;
            Ok(format!("deleted {}", id))
        }
        HistoryCommand::Clear => {
            stored.clear();
            store.save_history(&stored)?;
            Ok("history cleared".to_string())
        }
        HistoryCommand::Export { dir } => {
            let path = history::export_history(&stored, &dir, SystemClock.now())?;
            Ok(path.display().to_string())
        }
    }
}

fn run_draft(command: DraftCommand, store: &StateStore, input: &str) -> Result<String> {
    match command {
        DraftCommand::Save => {
            store.save_draft(input)?;
            Ok("draft saved".to_string())
        }
        DraftCommand::Show => store
            .load_draft()?
            .with_context(|| "no draft saved"),
        DraftCommand::Clear => {
            store.clear_draft()?;
            Ok("draft cleared".to_string())
        }
    }
}

fn format_books(books: &[&Book]) -> String {
    let lines: Vec<String> = books
        .iter()
        .map(|book| {
            format!(
                "{:>3}  {} by {} ({}, {}) [{}]",
                book.id, book.title, book.author, book.year, book.country, book.genre
            )
        })
        .collect();
    lines.join("\n")
}

fn format_timeline(books: &[&Book]) -> String {
    let mut output = String::new();
    for period in catalog::group_by_period(books.iter().copied()) {
        let _ = writeln!(output, "{}", period.name);
        for book in &period.books {
            let _ = writeln!(output, "  {}  {} by {}", book.year, book.title, book.author);
        }
    }
    let stats = catalog::timeline_stats(books.iter().copied());
    let _ = write!(
        output,
        "books: {}, span: {} years, countries: {}, genres: {}",
        stats.total, stats.years_span, stats.countries, stats.genres
    );
    output
}

fn format_history(history: &History) -> String {
    if history.is_empty() {
        return "no history".to_string();
    }
    let lines: Vec<String> = history
        .entries()
        .iter()
        .map(|entry| {
            format!(
                "{}  {}  {} book(s)  {}",
                entry.id,
                entry.timestamp,
                entry.books.len(),
                entry.user_text.replace('\n', " ")
            )
        })
        .collect();
    lines.join("\n")
}

fn format_translation(report: &TranslationReport, languages: &LanguageCatalog) -> String {
    let mut output = report.translation.clone();
    let _ = write!(
        output,
        "\n\n{} -> {}",
        languages.name(&report.source_lang),
        languages.name(&report.target_lang)
    );
    if let Some(quality) = &report.quality {
        output.push_str(&format_quality(quality));
    }
    output
}

fn format_quality(report: &QualityReport) -> String {
    let mut output = format!("\nquality: {}", report.quality.as_str());
    for (label, notes) in [
        ("grammar", &report.grammar),
        ("structure", &report.structure),
        ("meaning", &report.meaning),
    ] {
        for note in notes {
            let _ = write!(output, "\n  {}: {}", label, note);
        }
    }
    output
}

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::catalog::Catalog;
use crate::clock::Clock;
use crate::debounce::Debouncer;
use crate::history::StateStore;
use crate::languages::LanguageCatalog;
use crate::session::AnalysisSession;
use crate::settings::Settings;
use crate::translation::{MyMemory, TranslationService};

pub(crate) struct ServerState {
    pub(crate) catalog: Arc<Catalog>,
    pub(crate) session: Mutex<AnalysisSession>,
    pub(crate) translator: TranslationService<MyMemory>,
    pub(crate) languages: LanguageCatalog,
    pub(crate) store: StateStore,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) auto_generate: Debouncer,
}

impl ServerState {
    pub(crate) fn new(
        settings: &Settings,
        catalog: Arc<Catalog>,
        store: StateStore,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let history = store.load_history(settings.history_limit)?;
        let backend = MyMemory::new(
            settings.translation_endpoint.clone(),
            settings.request_timeout,
        )?;
        Ok(Self {
            session: Mutex::new(AnalysisSession::new(catalog.clone(), clock.clone(), history)),
            catalog,
            translator: TranslationService::new(backend, settings.translation_config()),
            languages: LanguageCatalog::load()?,
            store,
            clock,
            auto_generate: Debouncer::new(settings.auto_generate_delay),
        })
    }
}

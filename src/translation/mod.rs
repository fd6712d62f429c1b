//! Machine translation of user text through a remote endpoint.
//!
//! [`TranslationService`] splits long input into sentence-aligned chunks,
//! requests them one at a time with a pause in between, rejoins the results
//! with script-aware spacing and caches the outcome per exact
//! `(text, source, target)` triple. Failures never escape as errors; they are
//! reported through [`TranslationOutcome::error`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

pub mod backend;
pub mod chunk;
pub mod pacing;
pub mod quality;
pub mod rejoin;

pub use backend::{ApiResponse, BackendFuture, MyMemory, TranslationBackend};
pub use chunk::{DEFAULT_CHUNK_LIMIT, split_text};
pub use pacing::{DEFAULT_REQUEST_DELAY, Pacer, PauseFuture, TokioPacer};
pub use quality::{Quality, QualityReport, analyze_translation};
pub use rejoin::{normalize, rejoin};

use crate::languages::{AUTO, SPANGLISH};

pub const DEFAULT_TARGET: &str = "en";
/// Language reported when detection is impossible or fails.
pub const FALLBACK_LANGUAGE: &str = "en";
const DETECTION_SAMPLE_CHARS: usize = 500;
const DETECTION_LANGPAIR: &str = "autodetect|en";
/// Source language assumed for every word of Spanglish input.
const SPANGLISH_WORD_SOURCE: &str = "es";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslateError {
    #[error("Rate limit reached. Please wait a moment.")]
    RateLimited,

    #[error("{0}")]
    Remote(String),

    #[error("Translation failed")]
    Failed,

    #[error("Network error: {0}")]
    Transport(String),
}

impl From<anyhow::Error> for TranslateError {
    fn from(err: anyhow::Error) -> Self {
        TranslateError::Transport(format!("{:#}", err))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslationConfig {
    pub chunk_limit: usize,
    pub request_delay: Duration,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            chunk_limit: DEFAULT_CHUNK_LIMIT,
            request_delay: DEFAULT_REQUEST_DELAY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub text: String,
    pub source: String,
    pub target: String,
}

impl CacheKey {
    fn new(text: &str, source: &str, target: &str) -> Self {
        Self {
            text: text.to_string(),
            source: source.to_string(),
            target: target.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationOutcome {
    pub translation: String,
    pub error: Option<String>,
}

impl TranslationOutcome {
    pub fn translated(translation: impl Into<String>) -> Self {
        Self {
            translation: translation.into(),
            error: None,
        }
    }

    pub fn failed(err: &TranslateError) -> Self {
        Self {
            translation: String::new(),
            error: Some(err.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// A finished translation with the language pair actually used and, when it
/// succeeded, its quality report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationReport {
    pub source_lang: String,
    pub target_lang: String,
    pub translation: String,
    pub error: Option<String>,
    pub quality: Option<QualityReport>,
}

pub struct TranslationService<B, P = TokioPacer> {
    backend: B,
    pacer: P,
    config: TranslationConfig,
    cache: Mutex<HashMap<CacheKey, TranslationOutcome>>,
    /// Held for the whole of a remote operation so chunk requests from
    /// concurrent calls never interleave.
    gate: tokio::sync::Mutex<()>,
}

impl<B: TranslationBackend> TranslationService<B> {
    pub fn new(backend: B, config: TranslationConfig) -> Self {
        Self::with_pacer(backend, TokioPacer, config)
    }
}

impl<B: TranslationBackend, P: Pacer> TranslationService<B, P> {
    pub fn with_pacer(backend: B, pacer: P, config: TranslationConfig) -> Self {
        Self {
            backend,
            pacer,
            config,
            cache: Mutex::new(HashMap::new()),
            gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> TranslationConfig {
        self.config
    }

    pub fn cache_len(&self) -> usize {
        self.lock_cache().len()
    }

    /// Best-effort source language of `text`; falls back to English.
    pub async fn detect_language(&self, text: &str) -> String {
        let text = text.trim();
        if text.is_empty() {
            return FALLBACK_LANGUAGE.to_string();
        }
        let sample: String = text.chars().take(DETECTION_SAMPLE_CHARS).collect();
        let _gate = self.gate.lock().await;
        match self.backend.request(&sample, DETECTION_LANGPAIR).await {
            Ok(response) => match response.detected_language {
                Some(code) => {
                    debug!("detected language {}", code);
                    code
                }
                None => {
                    warn!(
                        "language detection returned no language (status {}); assuming {}",
                        response.status, FALLBACK_LANGUAGE
                    );
                    FALLBACK_LANGUAGE.to_string()
                }
            },
            Err(err) => {
                warn!("language detection failed: {:#}", err);
                FALLBACK_LANGUAGE.to_string()
            }
        }
    }

    /// Translates `text` from `source` to `target`.
    ///
    /// Blank text resolves immediately without a request. Any failure aborts
    /// the remaining chunks, discards the partial translation and is reported
    /// through the outcome's `error`. Only successful outcomes are cached.
    pub async fn translate(&self, text: &str, source: &str, target: &str) -> TranslationOutcome {
        if text.trim().is_empty() {
            return TranslationOutcome::translated("");
        }
        let key = CacheKey::new(text, source, target);
        if let Some(hit) = self.cached(&key) {
            debug!("translation cache hit ({} -> {})", source, target);
            return hit;
        }

        let _gate = self.gate.lock().await;
        // A call holding the gate before us may have filled the entry.
        if let Some(hit) = self.cached(&key) {
            return hit;
        }

        if source == SPANGLISH {
            let (translation, complete) = self.translate_spanglish(text, target).await;
            let outcome = TranslationOutcome::translated(translation);
            if complete {
                self.store(key, outcome.clone());
            }
            return outcome;
        }

        match self.translate_chunks(text, source, target).await {
            Ok(translation) => {
                let outcome = TranslationOutcome::translated(translation);
                self.store(key, outcome.clone());
                outcome
            }
            Err(err) => {
                warn!("translation {} -> {} failed: {}", source, target, err);
                TranslationOutcome::failed(&err)
            }
        }
    }

    /// Resolves `auto` through detection, translates and scores the result.
    pub async fn translate_with_report(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> TranslationReport {
        let source = if source.trim().is_empty() || source == AUTO {
            self.detect_language(text).await
        } else {
            source.to_string()
        };
        let outcome = self.translate(text, &source, target).await;
        let quality = (outcome.is_ok() && !outcome.translation.is_empty())
            .then(|| analyze_translation(text, &outcome.translation, &source, target));
        TranslationReport {
            source_lang: source,
            target_lang: target.to_string(),
            translation: outcome.translation,
            error: outcome.error,
            quality,
        }
    }

    async fn translate_chunks(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslateError> {
        let chunks = split_text(text, self.config.chunk_limit);
        let langpair = format!("{}|{}", source, target);
        let mut translations = Vec::with_capacity(chunks.len());
        for (index, piece) in chunks.iter().enumerate() {
            debug!(
                "requesting chunk {}/{} ({} chars, {})",
                index + 1,
                chunks.len(),
                chunk::char_len(piece),
                langpair
            );
            translations.push(self.request_translation(piece, &langpair).await?);
        }
        info!("translated {} chunk(s) {}", chunks.len(), langpair);
        Ok(rejoin(&translations, target))
    }

    /// Word-by-word Spanish to `target`; words that cannot be translated are
    /// kept as written and the returned flag is `false`.
    async fn translate_spanglish(&self, text: &str, target: &str) -> (String, bool) {
        let langpair = format!("{}|{}", SPANGLISH_WORD_SOURCE, target);
        let mut rate_limited = false;
        let mut complete = true;
        let mut words = Vec::new();
        for word in text.split_whitespace() {
            let key = CacheKey::new(word, SPANGLISH_WORD_SOURCE, target);
            if let Some(hit) = self.cached(&key) {
                words.push(hit.translation);
                continue;
            }
            if rate_limited {
                complete = false;
                words.push(word.to_string());
                continue;
            }
            match self.request_translation(word, &langpair).await {
                Ok(translated) => {
                    self.store(key, TranslationOutcome::translated(translated.clone()));
                    words.push(translated);
                }
                Err(err) => {
                    debug!("keeping '{}' untranslated: {}", word, err);
                    complete = false;
                    if err == TranslateError::RateLimited {
                        warn!("rate limited; keeping the remaining words as written");
                        rate_limited = true;
                    }
                    words.push(word.to_string());
                }
            }
        }
        (words.join(" "), complete)
    }

    async fn request_translation(&self, text: &str, langpair: &str) -> Result<String, TranslateError> {
        self.pacer.pause(self.config.request_delay).await;
        let response = self.backend.request(text, langpair).await?;
        response.into_translation()
    }

    fn cached(&self, key: &CacheKey) -> Option<TranslationOutcome> {
        self.lock_cache().get(key).cloned()
    }

    fn store(&self, key: CacheKey, outcome: TranslationOutcome) {
        self.lock_cache().insert(key, outcome);
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, TranslationOutcome>> {
        self.cache.lock().unwrap_or_else(|err| err.into_inner())
    }
}

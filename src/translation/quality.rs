//! Rule-based plausibility checks for a finished translation.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::languages::{Script, script_of};

use super::chunk::char_len;

const PASSTHROUGH_PREFIX_CHARS: usize = 50;
/// Originals with at least this many words are expected to carry punctuation.
const PUNCTUATION_MIN_WORDS: usize = 8;

static SENTENCE_MARKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?。？！؟]+").expect("sentence mark pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Good,
    Moderate,
    Poor,
}

impl Quality {
    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Good => "good",
            Quality::Moderate => "moderate",
            Quality::Poor => "poor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    pub grammar: Vec<String>,
    pub structure: Vec<String>,
    pub meaning: Vec<String>,
    pub quality: Quality,
}

impl QualityReport {
    fn new() -> Self {
        Self {
            grammar: Vec::new(),
            structure: Vec::new(),
            meaning: Vec::new(),
            quality: Quality::Good,
        }
    }

    /// The score only ever gets worse.
    fn downgrade(&mut self, to: Quality) {
        self.quality = self.quality.max(to);
    }

    fn has_findings(&self) -> bool {
        !(self.grammar.is_empty() && self.structure.is_empty() && self.meaning.is_empty())
    }
}

pub fn analyze_translation(
    original: &str,
    translated: &str,
    _source_lang: &str,
    target_lang: &str,
) -> QualityReport {
    let mut report = QualityReport::new();
    let original_len = char_len(original);
    let translated_len = char_len(translated);

    if original_len > 0 {
        let ratio = translated_len as f64 / original_len as f64;
        if !(0.5..=2.0).contains(&ratio) {
            report
                .structure
                .push("Translation length differs significantly from original".to_string());
            report.downgrade(Quality::Moderate);
        }
    }

    let original_words = word_count(original);
    if original_words >= PUNCTUATION_MIN_WORDS && !original.chars().any(is_punctuation) {
        report
            .grammar
            .push("Original text has no punctuation".to_string());
        report.downgrade(Quality::Moderate);
    }

    if looks_untranslated(original, translated) {
        report
            .meaning
            .push("Some text may not have been translated".to_string());
        report.downgrade(Quality::Poor);
    }

    if translated.contains("???") || translated.contains("***") {
        report
            .grammar
            .push("Unknown characters detected".to_string());
        report.downgrade(Quality::Poor);
    }

    if sentence_count(original).abs_diff(sentence_count(translated)) > 2 {
        report
            .structure
            .push("Sentence structure differs from original".to_string());
    }

    let word_ratio = word_count(translated) as f64 / original_words.max(1) as f64;
    if !(0.6..=1.8).contains(&word_ratio) {
        report.meaning.push(format!(
            "Word count ratio: {:.2} (may indicate loss or addition of meaning)",
            word_ratio
        ));
    }

    match script_of(target_lang) {
        Script::Rtl => report
            .structure
            .push("Right-to-left language: ensure proper display direction".to_string()),
        Script::Cjk => report.structure.push(
            "CJK language: character-based translation (no spaces between words)".to_string(),
        ),
        Script::Spaced => {}
    }

    if !report.has_findings() {
        report.grammar.push("✓ Grammar appears consistent".to_string());
        report.structure.push("✓ Structure maintained well".to_string());
        report.meaning.push("✓ Meaning likely preserved".to_string());
    }
    report
}

/// The translation repeats the opening of the original verbatim.
fn looks_untranslated(original: &str, translated: &str) -> bool {
    let original = original.trim();
    if original.is_empty() {
        return false;
    }
    let prefix: String = original
        .to_lowercase()
        .chars()
        .take(PASSTHROUGH_PREFIX_CHARS)
        .collect();
    translated.to_lowercase().contains(&prefix)
}

fn sentence_count(text: &str) -> usize {
    SENTENCE_MARKS.find_iter(text).count().max(1)
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn is_punctuation(ch: char) -> bool {
    ch.is_ascii_punctuation() || matches!(ch, '。' | '，' | '、' | '？' | '！' | '؟' | '،' | '¿' | '¡' | '…')
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGINAL: &str = "The river remembers every crossing, and the border remembers every name it has taken from us.";

    #[test]
    fn faithful_translation_gets_affirmative_notes() {
        let translated = "El río recuerda cada cruce, y la frontera recuerda cada nombre que nos ha quitado.";
        let report = analyze_translation(ORIGINAL, translated, "en", "es");
        assert_eq!(report.quality, Quality::Good);
        assert_eq!(report.grammar, vec!["✓ Grammar appears consistent"]);
        assert_eq!(report.structure, vec!["✓ Structure maintained well"]);
        assert_eq!(report.meaning, vec!["✓ Meaning likely preserved"]);
    }

    #[test]
    fn very_short_translation_is_moderate() {
        let translated: String = ORIGINAL.chars().take(ORIGINAL.chars().count() / 10).collect();
        let report = analyze_translation(ORIGINAL, &translated, "en", "es");
        assert_eq!(report.quality, Quality::Moderate);
        assert!(
            report
                .structure
                .contains(&"Translation length differs significantly from original".to_string())
        );
        assert!(report.meaning[0].starts_with("Word count ratio: 0."));
    }

    #[test]
    fn repeated_prefix_is_poor() {
        let translated = format!("Traducción: {}", ORIGINAL.to_uppercase());
        let report = analyze_translation(ORIGINAL, &translated, "en", "es");
        assert_eq!(report.quality, Quality::Poor);
        assert_eq!(report.meaning, vec!["Some text may not have been translated"]);
    }

    #[test]
    fn unchanged_text_is_poor_even_between_same_languages() {
        let report = analyze_translation(ORIGINAL, ORIGINAL, "en", "en");
        assert_eq!(report.quality, Quality::Poor);
        assert_eq!(report.meaning, vec!["Some text may not have been translated"]);
    }

    #[test]
    fn marker_sequences_are_poor_even_after_moderate() {
        let report = analyze_translation("Hola.", "??? *** ??? *** ??? ***", "es", "en");
        assert_eq!(report.quality, Quality::Poor);
        assert_eq!(
            report.grammar,
            vec!["Unknown characters detected".to_string()]
        );
        assert!(report.structure[0].starts_with("Translation length"));
    }

    #[test]
    fn missing_punctuation_in_long_original_is_moderate() {
        let original = "we walked along the river until the night came down";
        let translated = "caminamos por el río hasta que cayó la noche";
        let report = analyze_translation(original, translated, "en", "es");
        assert_eq!(report.quality, Quality::Moderate);
        assert_eq!(report.grammar, vec!["Original text has no punctuation"]);
    }

    #[test]
    fn sentence_and_word_notes_do_not_change_the_score() {
        let original = "One. Two. Three. Four. Five.";
        let translated = "Uno dos tres cuatro cinco";
        let report = analyze_translation(original, translated, "en", "es");
        assert_eq!(report.quality, Quality::Good);
        assert_eq!(
            report.structure,
            vec!["Sentence structure differs from original"]
        );
        assert!(report.grammar.is_empty());
    }

    #[test]
    fn script_notes_for_rtl_and_cjk_targets() {
        let rtl = analyze_translation("Hello there.", "مرحبا هناك.", "en", "ar");
        assert_eq!(
            rtl.structure,
            vec!["Right-to-left language: ensure proper display direction"]
        );
        assert_eq!(rtl.quality, Quality::Good);
        assert!(rtl.grammar.is_empty());

        // Modern Hebrew code alongside the legacy "iw".
        let hebrew = analyze_translation("Hello there.", "שלום לך.", "en", "he");
        assert_eq!(hebrew.structure, rtl.structure);

        let cjk = analyze_translation("Hello.", "你好。", "en", "zh-CN");
        assert!(
            cjk.structure
                .iter()
                .any(|note| note.starts_with("CJK language"))
        );
    }
}

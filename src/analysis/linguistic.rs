use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

const MIN_COUNTED_LEN: usize = 4;
const TOP_WORDS: usize = 10;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("word pattern"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinguisticStats {
    pub word_count: usize,
    pub unique_words: usize,
    pub top_words: Vec<String>,
    pub average_word_length: f64,
}

pub fn analyze_linguistic(text: &str) -> LinguisticStats {
    let lower = text.to_lowercase();
    let words: Vec<&str> = WORD.find_iter(&lower).map(|m| m.as_str()).collect();

    // (word, count) in first-seen order so the stable sort keeps that order on ties.
    let mut frequencies: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for &word in &words {
        if word.chars().count() < MIN_COUNTED_LEN {
            continue;
        }
        match index.get(word) {
            Some(&slot) => frequencies[slot].1 += 1,
            None => {
                index.insert(word, frequencies.len());
                frequencies.push((word, 1));
            }
        }
    }

    let unique_words = frequencies.len();
    frequencies.sort_by(|a, b| b.1.cmp(&a.1));
    let top_words = frequencies
        .iter()
        .take(TOP_WORDS)
        .map(|(word, _)| word.to_string())
        .collect();

    let total_len: usize = words.iter().map(|word| word.chars().count()).sum();
    let average_word_length = if words.is_empty() {
        0.0
    } else {
        total_len as f64 / words.len() as f64
    };

    LinguisticStats {
        word_count: words.len(),
        unique_words,
        top_words,
        average_word_length,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_all_tokens_but_ranks_only_long_ones() {
        let stats = analyze_linguistic("The river, the RIVER and the sea. Rivers meet memory; memory stays.");
        assert_eq!(stats.word_count, 12);
        // river, rivers, meet, memory, stays
        assert_eq!(stats.unique_words, 5);
        assert_eq!(stats.top_words[0], "river");
        assert_eq!(stats.top_words[1], "memory");
        assert_eq!(&stats.top_words[2..], ["rivers", "meet", "stays"]);
    }

    #[test]
    fn average_covers_short_tokens() {
        let stats = analyze_linguistic("a bb cccc");
        assert_eq!(stats.word_count, 3);
        assert!((stats.average_word_length - 7.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_text_yields_zero_average() {
        let stats = analyze_linguistic("  ... !!! ");
        assert_eq!(stats.word_count, 0);
        assert_eq!(stats.unique_words, 0);
        assert!(stats.top_words.is_empty());
        assert_eq!(stats.average_word_length, 0.0);
    }

    #[test]
    fn top_words_are_capped_at_ten() {
        let text = (0..15)
            .map(|i| format!("word{:02}", i))
            .collect::<Vec<_>>()
            .join(" ");
        let stats = analyze_linguistic(&text);
        assert_eq!(stats.unique_words, 15);
        assert_eq!(stats.top_words.len(), 10);
        assert_eq!(stats.top_words[0], "word00");
    }

    #[test]
    fn accented_words_stay_whole() {
        let stats = analyze_linguistic("Corazón corazón canción");
        assert_eq!(stats.word_count, 3);
        assert_eq!(stats.top_words, vec!["corazón", "canción"]);
    }
}

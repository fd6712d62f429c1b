//! Rejoining translated chunks into normally punctuated text.
//!
//! [`rejoin`] glues chunks together and then runs [`normalize`], a fixed
//! sequence of rewriting passes: whitespace, closing punctuation, sentence
//! gaps, brackets and quotes, dashes and ellipses, then the rules of the
//! target language.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

use crate::languages::{Script, base_code, script_of};

/// Characters that attach to the previous chunk without a joining space.
const LEADING_PUNCTUATION: &[char] = &[
    '.', ',', '!', '?', ';', ':', ')', ']', '}', '»', '”', '’', '…', '%', '、', '。', '，', '！',
    '？', '；', '：', '」', '』', '）', '،', '؛', '؟',
];

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("normalization pattern")
}

static HORIZONTAL_SPACE: LazyLock<Regex> = LazyLock::new(|| re(r"[^\S\n]+"));
static SPACE_AROUND_NEWLINE: LazyLock<Regex> = LazyLock::new(|| re(r" *\n *"));
static SPACE_BEFORE_CLOSING: LazyLock<Regex> = LazyLock::new(|| re(r" +([.!?,:;)])"));
static MISSING_SENTENCE_GAP: LazyLock<Regex> =
    LazyLock::new(|| re(r"([\p{Ll}\p{N}][.!?]+)(\p{Lu})"));
static SPACE_AFTER_OPENING_BRACKET: LazyLock<Regex> = LazyLock::new(|| re(r"([(\[{]) +"));
static SPACE_BEFORE_CLOSING_BRACKET: LazyLock<Regex> = LazyLock::new(|| re(r" +([\]}])"));
static PADDED_STRAIGHT_QUOTES: LazyLock<Regex> = LazyLock::new(|| re(r#"" *([^"\n]*?) *""#));
static SPACE_AFTER_CURLY_OPEN: LazyLock<Regex> = LazyLock::new(|| re(r"([“‘]) +"));
static SPACE_BEFORE_CURLY_CLOSE: LazyLock<Regex> = LazyLock::new(|| re(r" +([”’])"));
static DOUBLE_HYPHEN: LazyLock<Regex> = LazyLock::new(|| re(r" *-- *"));
static EM_DASH: LazyLock<Regex> = LazyLock::new(|| re(r" *— *"));
static SPACED_EN_DASH: LazyLock<Regex> = LazyLock::new(|| re(r" +– *| *– +"));
static SPACE_BEFORE_ELLIPSIS: LazyLock<Regex> = LazyLock::new(|| re(r" +…"));

static FRENCH_HIGH_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| re(r"([^\s«]) *([!?:;]+)(\s|$|»)"));
static FRENCH_GUILLEMET_OPEN: LazyLock<Regex> = LazyLock::new(|| re(r"« *"));
static FRENCH_GUILLEMET_CLOSE: LazyLock<Regex> = LazyLock::new(|| re(r" *»"));

static SPANISH_INVERTED_INNER: LazyLock<Regex> = LazyLock::new(|| re(r"([¿¡]) +"));
static SPANISH_INVERTED_OUTER: LazyLock<Regex> =
    LazyLock::new(|| re(r#"([^\s¿¡(\["«“])([¿¡])"#));

static CJK_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| re(r"[ ]*([。，、！？；：「」『』（）《》〈〉【】・])[ ]*"));
static CJK_GAP: LazyLock<Regex> = LazyLock::new(|| {
    re(r"([\p{Han}\p{Hiragana}\p{Katakana}\p{Hangul}]) +([\p{Han}\p{Hiragana}\p{Katakana}\p{Hangul}])")
});

static RTL_SPACE_BEFORE_MARK: LazyLock<Regex> = LazyLock::new(|| re(r" +([،؛؟])"));
static RTL_MISSING_SPACE_AFTER_MARK: LazyLock<Regex> = LazyLock::new(|| re(r"([،؛؟])(\S)"));
static TIGHT_GUILLEMET_OPEN: LazyLock<Regex> = LazyLock::new(|| re(r"([«„]) +"));
static TIGHT_GUILLEMET_CLOSE: LazyLock<Regex> = LazyLock::new(|| re(r" +([»“])"));

/// Joins translated chunks for `target_lang` and normalizes the result.
/// Chinese, Japanese and Korean chunks are glued directly.
pub fn rejoin<S: AsRef<str>>(chunks: &[S], target_lang: &str) -> String {
    let no_space = script_of(target_lang) == Script::Cjk;
    let mut joined = String::new();
    for chunk in chunks {
        let chunk = chunk.as_ref().trim();
        if chunk.is_empty() {
            continue;
        }
        let attaches = chunk
            .chars()
            .next()
            .is_some_and(|first| LEADING_PUNCTUATION.contains(&first));
        if !joined.is_empty() && !no_space && !attaches {
            joined.push(' ');
        }
        joined.push_str(chunk);
    }
    normalize(&joined, target_lang)
}

pub fn normalize(text: &str, target_lang: &str) -> String {
    let text = collapse_whitespace(text);
    let text = SPACE_BEFORE_CLOSING.replace_all(&text, "$1");
    let text = MISSING_SENTENCE_GAP.replace_all(&text, "$1 $2");
    let text = tighten_brackets_and_quotes(&text);
    let text = normalize_dashes(&text);
    let text = apply_language_rules(&text, target_lang);
    text.trim().to_string()
}

fn collapse_whitespace(text: &str) -> String {
    let text = HORIZONTAL_SPACE.replace_all(text, " ");
    SPACE_AROUND_NEWLINE.replace_all(&text, "\n").into_owned()
}

fn tighten_brackets_and_quotes(text: &str) -> String {
    let text = SPACE_AFTER_OPENING_BRACKET.replace_all(text, "$1");
    let text = SPACE_BEFORE_CLOSING_BRACKET.replace_all(&text, "$1");
    let text = PADDED_STRAIGHT_QUOTES.replace_all(&text, "\"$1\"");
    let text = SPACE_AFTER_CURLY_OPEN.replace_all(&text, "$1");
    SPACE_BEFORE_CURLY_CLOSE.replace_all(&text, "$1").into_owned()
}

fn normalize_dashes(text: &str) -> String {
    let text = DOUBLE_HYPHEN.replace_all(text, "—");
    let text = EM_DASH.replace_all(&text, "—");
    let text = SPACED_EN_DASH.replace_all(&text, " – ");
    SPACE_BEFORE_ELLIPSIS.replace_all(&text, "…").into_owned()
}

fn apply_language_rules(text: &str, target_lang: &str) -> String {
    if script_of(target_lang) == Script::Cjk {
        return cjk_rules(text);
    }
    match base_code(target_lang).as_str() {
        "fr" => {
            let text = FRENCH_HIGH_PUNCTUATION.replace_all(text, "$1 $2$3");
            let text = FRENCH_GUILLEMET_OPEN.replace_all(&text, "« ");
            FRENCH_GUILLEMET_CLOSE.replace_all(&text, " »").into_owned()
        }
        "es" => {
            let text = SPANISH_INVERTED_INNER.replace_all(text, "$1");
            SPANISH_INVERTED_OUTER
                .replace_all(&text, "$1 $2")
                .into_owned()
        }
        "ar" | "fa" | "ur" | "iw" | "he" => {
            let text = RTL_SPACE_BEFORE_MARK.replace_all(text, "$1");
            let text = RTL_MISSING_SPACE_AFTER_MARK.replace_all(&text, "$1 $2");
            tight_quotes(&text)
        }
        "de" | "ru" | "uk" => tight_quotes(text),
        _ => text.to_string(),
    }
}

/// Guillemets and low-high quotes hug the quoted text.
fn tight_quotes(text: &str) -> String {
    let text = TIGHT_GUILLEMET_OPEN.replace_all(text, "$1");
    TIGHT_GUILLEMET_CLOSE.replace_all(&text, "$1").into_owned()
}

fn cjk_rules(text: &str) -> String {
    let mut current = CJK_PUNCTUATION.replace_all(text, "$1").into_owned();
    // Matches cannot overlap, so "一 二 三" needs a second pass.
    loop {
        let next = CJK_GAP.replace_all(&current, "$1$2");
        if matches!(next, Cow::Borrowed(_)) {
            return current;
        }
        current = next.into_owned();
    }
}

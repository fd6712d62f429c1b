//! Sentence-aware splitting of long text into request-sized chunks.

/// Per-request input limit of the translation endpoint, in characters.
pub const DEFAULT_CHUNK_LIMIT: usize = 500;

const TERMINATORS: [char; 7] = ['.', '!', '?', '。', '？', '！', '؟'];
/// Inverted Spanish marks open a sentence, so a unit boundary goes before them.
const OPENERS: [char; 2] = ['¿', '¡'];
/// Closers that stay glued to the terminator they follow.
const TRAILING_CLOSERS: [char; 8] = ['"', '\'', '”', '’', '»', ')', ']', '」'];

/// Splits `text` into trimmed, non-empty chunks of at most `limit` characters.
///
/// Sentences are packed greedily. Text without any sentence boundary, and
/// single sentences longer than the limit, fall back to packing whitespace
/// separated words; a single word longer than the limit is cut.
pub fn split_text(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    if char_len(text) <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    for unit in sentence_units(text) {
        if char_len(unit.trim()) > limit {
            flush(&mut chunks, &mut current);
            chunks.extend(split_words(&unit, limit));
            continue;
        }
        if current.trim().is_empty() || joined_len(&current, &unit) <= limit {
            current.push_str(&unit);
        } else {
            flush(&mut chunks, &mut current);
            current = unit;
        }
    }
    flush(&mut chunks, &mut current);
    chunks
}

/// Sentence-like units that concatenate back to the input exactly.
fn sentence_units(text: &str) -> Vec<String> {
    let mut units = Vec::new();
    let mut current = String::new();
    let mut after_terminator = false;

    for ch in text.chars() {
        if after_terminator {
            if TERMINATORS.contains(&ch) || TRAILING_CLOSERS.contains(&ch) {
                current.push(ch);
                continue;
            }
            units.push(std::mem::take(&mut current));
            after_terminator = false;
        }
        if OPENERS.contains(&ch) && !current.trim().is_empty() {
            units.push(std::mem::take(&mut current));
        }
        current.push(ch);
        if TERMINATORS.contains(&ch) {
            after_terminator = true;
        }
    }
    if !current.is_empty() {
        units.push(current);
    }
    units
}

fn split_words(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if char_len(word) > limit {
            flush(&mut chunks, &mut current);
            let chars: Vec<char> = word.chars().collect();
            chunks.extend(chars.chunks(limit).map(|piece| piece.iter().collect::<String>()));
            continue;
        }
        let needed = if current.is_empty() {
            char_len(word)
        } else {
            char_len(&current) + 1 + char_len(word)
        };
        if needed > limit {
            flush(&mut chunks, &mut current);
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    flush(&mut chunks, &mut current);
    chunks
}

fn flush(chunks: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
    current.clear();
}

fn joined_len(current: &str, unit: &str) -> usize {
    let joined = format!("{}{}", current, unit);
    char_len(joined.trim())
}

pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

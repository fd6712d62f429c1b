use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const AUTO: &str = "auto";
pub const SPANGLISH: &str = "spanglish";

const RTL_CODES: [&str; 5] = ["ar", "iw", "he", "fa", "ur"];
const CJK_BASES: [&str; 3] = ["zh", "ja", "ko"];

/// Static code → display name mapping, including the `auto` and `spanglish`
/// pseudo-codes.
#[derive(Debug, Clone)]
pub struct LanguageCatalog {
    codes: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageEntry {
    pub code: String,
    pub name: String,
}

impl LanguageCatalog {
    pub fn load() -> Result<Self> {
        let raw = include_str!("languages.json");
        let parsed: LanguageData =
            serde_json::from_str(raw).with_context(|| "failed to parse language catalog")?;
        Ok(LanguageCatalog {
            codes: parsed.codes,
        })
    }

    pub fn is_known(&self, code: &str) -> bool {
        self.lookup(code).is_some()
    }

    /// A known code that text can be translated into; `auto` and `spanglish`
    /// only work as sources.
    pub fn is_target(&self, code: &str) -> bool {
        let code = code.trim();
        self.is_known(code)
            && !code.eq_ignore_ascii_case(AUTO)
            && !code.eq_ignore_ascii_case(SPANGLISH)
    }

    /// Display name, or the code itself when unknown.
    pub fn name(&self, code: &str) -> String {
        self.lookup(code)
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }

    /// Every selectable language sorted by display name. `auto` is left out.
    pub fn all_sorted(&self) -> Vec<LanguageEntry> {
        let mut entries: Vec<LanguageEntry> = self
            .codes
            .iter()
            .filter(|(code, _)| code.as_str() != AUTO)
            .map(|(code, name)| LanguageEntry {
                code: code.clone(),
                name: name.clone(),
            })
            .collect();
        entries.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.code.cmp(&b.code))
        });
        entries
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    fn lookup(&self, code: &str) -> Option<&String> {
        let code = code.trim();
        self.codes.get(code).or_else(|| {
            self.codes
                .iter()
                .find(|(known, _)| known.eq_ignore_ascii_case(code))
                .map(|(_, name)| name)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    /// Space-separated scripts read left to right.
    Spaced,
    Cjk,
    Rtl,
}

pub fn script_of(code: &str) -> Script {
    let code = code.trim();
    if CJK_BASES.contains(&base_code(code).as_str()) {
        Script::Cjk
    } else if RTL_CODES.iter().any(|rtl| rtl.eq_ignore_ascii_case(code)) {
        Script::Rtl
    } else {
        Script::Spaced
    }
}

pub fn is_cjk(code: &str) -> bool {
    script_of(code) == Script::Cjk
}

pub fn is_rtl(code: &str) -> bool {
    script_of(code) == Script::Rtl
}

/// Lower-cased primary subtag: `es-MX` → `es`.
pub fn base_code(code: &str) -> String {
    code.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

#[derive(Debug, Deserialize)]
struct LanguageData {
    codes: HashMap<String, String>,
}

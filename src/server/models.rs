use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisOptions;
use crate::catalog::{Book, TimelinePeriod, TimelineStats};
use crate::history::HistoryEntry;

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct AnalyzeRequest {
    pub(crate) text: String,
    /// Replaces the current selection when present.
    pub(crate) books: Option<Vec<u64>>,
    pub(crate) options: Option<AnalysisOptions>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct TranslateRequest {
    pub(crate) text: String,
    pub(crate) source_lang: Option<String>,
    pub(crate) target_lang: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(crate) struct DetectRequest {
    pub(crate) text: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct DetectResponse {
    pub(crate) language: String,
    pub(crate) name: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct DraftRequest {
    pub(crate) text: String,
    pub(crate) books: Option<Vec<u64>>,
    /// Schedules an analysis once editing has paused.
    pub(crate) auto_generate: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct DraftResponse {
    pub(crate) draft: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(crate) struct LookupQuery {
    pub(crate) q: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TimelineResponse {
    pub(crate) periods: Vec<TimelinePeriod>,
    pub(crate) stats: TimelineStats,
}

#[derive(Debug, Serialize)]
pub(crate) struct SelectionResponse {
    pub(crate) books: Vec<Book>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ToggleResponse {
    pub(crate) selected: bool,
    pub(crate) books: Vec<Book>,
}

#[derive(Debug, Serialize)]
pub(crate) struct HistoryItemResponse {
    pub(crate) entry: HistoryEntry,
    pub(crate) books: Vec<Book>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RestoreResponse {
    pub(crate) text: String,
    pub(crate) books: Vec<Book>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}

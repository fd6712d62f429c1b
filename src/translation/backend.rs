use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use super::TranslateError;

pub const DEFAULT_ENDPOINT: &str = "https://api.mymemory.translated.net/get";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest slice of a non-JSON error body kept as the message.
const ERROR_BODY_PREVIEW: usize = 200;

/// One decoded reply of the translation endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiResponse {
    /// `responseStatus` when the body carries one, the HTTP status otherwise.
    pub status: u16,
    pub translated_text: Option<String>,
    pub message: Option<String>,
    pub detected_language: Option<String>,
}

impl ApiResponse {
    pub fn translated(text: impl Into<String>) -> Self {
        Self {
            status: 200,
            translated_text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn detected(code: impl Into<String>) -> Self {
        Self {
            status: 200,
            detected_language: Some(code.into()),
            ..Self::default()
        }
    }

    pub fn failure(status: u16, message: Option<&str>) -> Self {
        Self {
            status,
            message: message.map(str::to_string),
            ..Self::default()
        }
    }

    /// Classifies the reply: rate limits first, then a usable translation,
    /// then whatever message the server sent.
    pub fn into_translation(self) -> Result<String, TranslateError> {
        if is_rate_limited(self.status, self.message.as_deref()) {
            return Err(TranslateError::RateLimited);
        }
        let translated = self.translated_text.filter(|text| !text.trim().is_empty());
        if (200..300).contains(&self.status)
            && let Some(text) = translated
        {
            return Ok(text);
        }
        match self.message.filter(|message| !message.trim().is_empty()) {
            Some(message) => Err(TranslateError::Remote(message)),
            None => match translated {
                Some(text) if self.status >= 300 => Err(TranslateError::Remote(text)),
                _ => Err(TranslateError::Failed),
            },
        }
    }
}

pub(crate) fn is_rate_limited(status: u16, message: Option<&str>) -> bool {
    if status == 403 || status == 429 {
        return true;
    }
    let lower = message.unwrap_or_default().to_lowercase();
    lower.contains("rate limit") || lower.contains("too many requests")
}

pub type BackendFuture<'a> = Pin<Box<dyn Future<Output = Result<ApiResponse>> + Send + 'a>>;

/// A remote translation endpoint taking `q` and a `source|target` language pair.
pub trait TranslationBackend: Send + Sync {
    fn request<'a>(&'a self, text: &'a str, langpair: &'a str) -> BackendFuture<'a>;
}

/// The public MyMemory HTTP API.
#[derive(Debug, Clone)]
pub struct MyMemory {
    client: reqwest::Client,
    endpoint: String,
}

impl MyMemory {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .with_context(|| "failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl TranslationBackend for MyMemory {
    fn request<'a>(&'a self, text: &'a str, langpair: &'a str) -> BackendFuture<'a> {
        Box::pin(async move {
            let response = self
                .client
                .get(&self.endpoint)
                .query(&[("q", text), ("langpair", langpair)])
                .send()
                .await
                .with_context(|| format!("request to {} failed", self.endpoint))?;
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            parse_response(status, &body)
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResponse {
    response_data: Option<RawData>,
    response_status: Option<Value>,
    response_message: Option<String>,
    response_details: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawData {
    translated_text: Option<Value>,
    detected_language: Option<Value>,
}

pub fn parse_response(http_status: u16, body: &str) -> Result<ApiResponse> {
    let raw: RawResponse = match serde_json::from_str(body) {
        Ok(raw) => raw,
        Err(err) if (200..300).contains(&http_status) => {
            return Err(anyhow!("invalid translation response: {}", err));
        }
        Err(_) => {
            let preview: String = body.trim().chars().take(ERROR_BODY_PREVIEW).collect();
            let message = (!preview.is_empty()).then_some(preview);
            return Ok(ApiResponse::failure(http_status, message.as_deref()));
        }
    };

    let status = raw
        .response_status
        .as_ref()
        .and_then(status_code)
        .unwrap_or(http_status);
    let message = raw
        .response_message
        .or_else(|| raw.response_details.as_ref().and_then(non_empty_string));
    let (translated_text, detected_language) = match raw.response_data {
        Some(data) => (
            data.translated_text.as_ref().and_then(non_empty_string),
            data.detected_language.as_ref().and_then(non_empty_string),
        ),
        None => (None, None),
    };
    Ok(ApiResponse {
        status,
        translated_text,
        message,
        detected_language,
    })
}

/// `responseStatus` arrives as a number or as a numeric string.
fn status_code(value: &Value) -> Option<u16> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|code| u16::try_from(code).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn non_empty_string(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_successful_translation() {
        let body = r#"{"responseData":{"translatedText":"Hello world","match":0.98},
            "responseDetails":"","responseStatus":200,"matches":[]}"#;
        let response = parse_response(200, body).expect("response");
        assert_eq!(response.status, 200);
        assert_eq!(response.translated_text.as_deref(), Some("Hello world"));
        assert_eq!(response.message, None);
        assert_eq!(response.into_translation(), Ok("Hello world".to_string()));
    }

    #[test]
    fn body_status_wins_over_http_status() {
        let body = r#"{"responseData":{"translatedText":"MYMEMORY WARNING: YOU USED ALL AVAILABLE FREE TRANSLATIONS FOR TODAY"},
            "responseStatus":"429","responseDetails":"MYMEMORY WARNING"}"#;
        let response = parse_response(200, body).expect("response");
        assert_eq!(response.status, 429);
        assert_eq!(response.into_translation(), Err(TranslateError::RateLimited));
    }

    #[test]
    fn forbidden_is_a_rate_limit() {
        let response = parse_response(403, r#"{"responseStatus":403}"#).expect("response");
        assert_eq!(response.into_translation(), Err(TranslateError::RateLimited));
    }

    #[test]
    fn server_message_is_surfaced() {
        let body = r#"{"responseData":{"translatedText":null},"responseStatus":400,
            "responseMessage":"INVALID LANGUAGE PAIR SPECIFIED"}"#;
        let response = parse_response(200, body).expect("response");
        assert_eq!(
            response.into_translation(),
            Err(TranslateError::Remote(
                "INVALID LANGUAGE PAIR SPECIFIED".to_string()
            ))
        );
    }

    #[test]
    fn error_without_message_is_generic() {
        let response = parse_response(500, r#"{"responseData":{}}"#).expect("response");
        assert_eq!(response.into_translation(), Err(TranslateError::Failed));
    }

    #[test]
    fn non_json_error_body_becomes_message() {
        let response = parse_response(502, "Bad Gateway").expect("response");
        assert_eq!(
            response.into_translation(),
            Err(TranslateError::Remote("Bad Gateway".to_string()))
        );
        assert!(parse_response(200, "<html>").is_err());
    }

    #[test]
    fn detected_language_is_read() {
        let body = r#"{"responseData":{"translatedText":"Hello","detectedLanguage":"es"},"responseStatus":200}"#;
        let response = parse_response(200, body).expect("response");
        assert_eq!(response.detected_language.as_deref(), Some("es"));
    }
}

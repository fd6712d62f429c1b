use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::translation::backend::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT};
use crate::translation::{DEFAULT_CHUNK_LIMIT, DEFAULT_REQUEST_DELAY, TranslationConfig};

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");
const APP_DIR_NAME: &str = ".literary-lens";
pub const DEFAULT_AUTO_GENERATE_DELAY: Duration = Duration::from_millis(1500);
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:8787";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub history_limit: usize,
    pub catalog_path: Option<PathBuf>,
    pub auto_generate_delay: Duration,
    pub translation_endpoint: String,
    pub chunk_limit: usize,
    pub request_delay: Duration,
    pub request_timeout: Duration,
    pub server_addr: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            catalog_path: None,
            auto_generate_delay: DEFAULT_AUTO_GENERATE_DELAY,
            translation_endpoint: DEFAULT_ENDPOINT.to_string(),
            chunk_limit: DEFAULT_CHUNK_LIMIT,
            request_delay: DEFAULT_REQUEST_DELAY,
            request_timeout: DEFAULT_TIMEOUT,
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
        }
    }
}

impl Settings {
    pub fn translation_config(&self) -> TranslationConfig {
        TranslationConfig {
            chunk_limit: self.chunk_limit,
            request_delay: self.request_delay,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    system: Option<SystemSettings>,
    catalog: Option<CatalogSettings>,
    analysis: Option<AnalysisSettings>,
    translation: Option<TranslationSettings>,
    server: Option<ServerSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct SystemSettings {
    histories: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogSettings {
    path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AnalysisSettings {
    auto_generate_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct TranslationSettings {
    endpoint: Option<String>,
    chunk_limit: Option<usize>,
    request_delay_ms: Option<u64>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    addr: Option<String>,
}

/// Reads every settings layer in order; later files override earlier ones.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    ensure_home_settings_file()?;

    let mut ordered_paths = vec![
        PathBuf::from("settings.toml"),
        PathBuf::from("settings.local.toml"),
    ];
    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }
    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }
    load_layers(&ordered_paths)
}

/// Merges the existing files among `paths` over the defaults.
pub fn load_layers(paths: &[PathBuf]) -> Result<Settings> {
    let mut settings = Settings::default();
    for path in paths {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }
    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(system) = incoming.system
            && let Some(limit) = system.histories
            && limit > 0
        {
            self.history_limit = limit;
        }
        if let Some(catalog) = incoming.catalog
            && let Some(path) = catalog.path
            && !path.trim().is_empty()
        {
            self.catalog_path = Some(PathBuf::from(path));
        }
        if let Some(analysis) = incoming.analysis
            && let Some(delay) = analysis.auto_generate_delay_ms
        {
            self.auto_generate_delay = Duration::from_millis(delay);
        }
        if let Some(translation) = incoming.translation {
            if let Some(endpoint) = translation.endpoint
                && !endpoint.trim().is_empty()
            {
                self.translation_endpoint = endpoint;
            }
            if let Some(limit) = translation.chunk_limit
                && limit > 0
            {
                self.chunk_limit = limit;
            }
            if let Some(delay) = translation.request_delay_ms {
                self.request_delay = Duration::from_millis(delay);
            }
            if let Some(timeout) = translation.timeout_secs
                && timeout > 0
            {
                self.request_timeout = Duration::from_secs(timeout);
            }
        }
        if let Some(server) = incoming.server
            && let Some(addr) = server.addr
            && !addr.trim().is_empty()
        {
            self.server_addr = addr;
        }
    }
}

/// Per-user directory holding settings and saved state.
pub fn app_dir() -> PathBuf {
    home_dir().unwrap_or_else(|| PathBuf::from(APP_DIR_NAME))
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(APP_DIR_NAME))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn bundled_defaults_match_built_in_defaults() {
        let parsed: SettingsFile = toml::from_str(DEFAULT_SETTINGS_TOML).expect("settings");
        let mut settings = Settings::default();
        settings.merge(parsed);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn later_layers_override_earlier_ones() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path().join("settings.toml");
        let local = dir.path().join("settings.local.toml");
        fs::write(
            &base,
            "[system]\nhistories = 20\n[translation]\nchunk_limit = 250\nrequest_delay_ms = 100\n",
        )
        .expect("write");
        fs::write(
            &local,
            "[system]\nhistories = 0\n[translation]\nrequest_delay_ms = 0\n[catalog]\npath = \"books.json\"\n",
        )
        .expect("write");

        let missing = dir.path().join("absent.toml");
        let settings = load_layers(&[base, missing, local]).expect("settings");
        assert_eq!(settings.history_limit, 20);
        assert_eq!(settings.chunk_limit, 250);
        assert_eq!(settings.request_delay, Duration::ZERO);
        assert_eq!(settings.catalog_path, Some(PathBuf::from("books.json")));
        assert_eq!(settings.server_addr, DEFAULT_SERVER_ADDR);
        assert_eq!(settings.translation_config().chunk_limit, 250);
    }

    #[test]
    fn invalid_toml_names_the_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[system\nhistories = ").expect("write");
        let err = load_layers(&[path]).expect_err("parse error");
        assert!(err.to_string().contains("broken.toml"));
    }
}

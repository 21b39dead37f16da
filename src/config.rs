use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

use crate::error::{BlitzError, Result};
use crate::shortcuts::{Locale, Settings};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Language tag used instead of the one the page reports.
    pub language: Option<String>,
    pub chord_timeout_ms: u64,
    pub editor_deadline_ms: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            language: None,
            chord_timeout_ms: 400,
            editor_deadline_ms: 1500,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Where relative links point when opened in a real browser tab.
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
}

fn config_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("blitz").join("config.toml"))
}

impl Config {
    /// Load `path`, or the default location when `None`. A missing or
    /// unusable file yields the defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path.map(Path::to_path_buf).or_else(config_path) else {
            return Config::default();
        };
        if !path.exists() {
            return Config::default();
        }

        match Self::read(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), %err, "ignoring config file");
                Config::default()
            }
        }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|err| BlitzError::Config(err.to_string()))?;
        if config.general.chord_timeout_ms == 0 {
            return Err(BlitzError::Config(
                "chord_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }

    /// Shortcut settings, with `language` (from the command line) taking
    /// precedence over the configured language.
    pub fn settings(&self, language: Option<&str>) -> Settings {
        let language = language.or(self.general.language.as_deref());
        Settings {
            locale: language.map(Locale::from_tag),
            chord_timeout: Duration::from_millis(self.general.chord_timeout_ms),
            editor_deadline: Duration::from_millis(self.general.editor_deadline_ms),
        }
    }

    /// Absolute URL for opening `href` in the system browser, if a base URL
    /// is configured or the link is already absolute.
    pub fn browser_url(&self, href: &str) -> Option<String> {
        if href.starts_with("http://") || href.starts_with("https://") {
            return Some(href.to_string());
        }
        let base = self.browser.base_url.as_deref()?;
        Some(format!(
            "{}/{}",
            base.trim_end_matches('/'),
            href.trim_start_matches('/')
        ))
    }
}

//! Application config in `~/.config/tinymediamanager/config.toml`.
//!
//! Provider settings are not kept here; each provider stores its own
//! `scraper_<id>.conf` in the data folder (see [`crate::provider::config`]).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::compare::SearchResultSort;
use crate::entities::artwork::{FanartSize, PosterSize};
use crate::error::ConfigError;
use crate::provider::tmdb;
use crate::similarity::DEFAULT_TITLE_PREFIXES;

const APP_DIR: &str = "tinymediamanager";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Where provider settings live. Defaults to the platform data folder.
    pub data_dir: Option<String>,
    /// Articles moved to the end of a title when building its sort title.
    #[serde(default = "default_title_prefixes")]
    pub title_prefixes: Vec<String>,
}

fn default_title_prefixes() -> Vec<String> {
    DEFAULT_TITLE_PREFIXES.iter().map(|s| s.to_string()).collect()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            title_prefixes: default_title_prefixes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScraperConfig {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_provider")]
    pub movie_provider: String,
    /// Main provider for TV shows; empty when none is configured.
    #[serde(default)]
    pub tv_show_provider: String,
    #[serde(default)]
    pub fallback_providers: Vec<String>,
    #[serde(default = "default_providers")]
    pub artwork_providers: Vec<String>,
    #[serde(default = "default_providers")]
    pub trailer_providers: Vec<String>,
    #[serde(default = "default_poster_size")]
    pub poster_size: PosterSize,
    #[serde(default = "default_fanart_size")]
    pub fanart_size: FanartSize,
    #[serde(default)]
    pub result_sort: SearchResultSort,
}

fn default_language() -> String {
    "en".to_string()
}
fn default_country() -> String {
    "US".to_string()
}
fn default_provider() -> String {
    tmdb::PROVIDER_ID.to_string()
}
fn default_providers() -> Vec<String> {
    vec![tmdb::PROVIDER_ID.to_string()]
}
fn default_poster_size() -> PosterSize {
    PosterSize::Big
}
fn default_fanart_size() -> FanartSize {
    FanartSize::Large
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            country: default_country(),
            movie_provider: default_provider(),
            tv_show_provider: String::new(),
            fallback_providers: Vec::new(),
            artwork_providers: default_providers(),
            trailer_providers: default_providers(),
            poster_size: default_poster_size(),
            fanart_size: default_fanart_size(),
            result_sort: SearchResultSort::default(),
        }
    }
}

impl AppConfig {
    /// Folder for provider settings.
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = self.general.data_dir.as_deref().filter(|d| !d.trim().is_empty()) {
            return PathBuf::from(dir);
        }
        match dirs::data_dir() {
            Some(mut p) => {
                p.push(APP_DIR);
                p
            }
            None => PathBuf::from("data"),
        }
    }

    /// Set a value by dotted key, e.g. `scraper.language`. List values are
    /// comma separated.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let not_allowed = || ConfigError::NotAllowed {
            key: key.to_string(),
            value: value.to_string(),
        };
        let parts: Vec<&str> = key.splitn(2, '.').collect();
        match parts.as_slice() {
            ["general", "data_dir"] => {
                self.general.data_dir = Some(value.to_string()).filter(|v| !v.is_empty())
            }
            ["general", "title_prefixes"] => self.general.title_prefixes = split_list(value),
            ["scraper", sub] => match *sub {
                "language" => self.scraper.language = value.to_string(),
                "country" => self.scraper.country = value.to_ascii_uppercase(),
                "movie_provider" => self.scraper.movie_provider = value.to_string(),
                "tv_show_provider" => self.scraper.tv_show_provider = value.to_string(),
                "fallback_providers" => self.scraper.fallback_providers = split_list(value),
                "artwork_providers" => self.scraper.artwork_providers = split_list(value),
                "trailer_providers" => self.scraper.trailer_providers = split_list(value),
                "poster_size" => {
                    self.scraper.poster_size = value.parse::<PosterSize>().map_err(|_| not_allowed())?
                }
                "fanart_size" => {
                    self.scraper.fanart_size = value.parse::<FanartSize>().map_err(|_| not_allowed())?
                }
                "result_sort" => {
                    self.scraper.result_sort =
                        value.parse::<SearchResultSort>().map_err(|_| not_allowed())?
                }
                _ => return Err(ConfigError::UnknownKey(key.to_string())),
            },
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Default config file path (for init and show).
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut p| {
        p.push(APP_DIR);
        p.push("config.toml");
        p
    })
}

/// Load config from the default path. Any problem yields the defaults.
pub fn load_config() -> AppConfig {
    let Some(path) = config_path() else {
        return AppConfig::default();
    };
    match load_config_from(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("{} - using defaults", e);
            AppConfig::default()
        }
    }
}

/// Load config from `path`. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(AppConfig::default()),
        Err(e) => return Err(e.into()),
    };
    toml::from_str(&content).map_err(|e| ConfigError::Malformed {
        path: path.display().to_string(),
        detail: e.to_string(),
    })
}

pub fn save_config(cfg: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    let text = toml::to_string_pretty(cfg).map_err(|e| ConfigError::Malformed {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[scraper]\nlanguage = \"de\"\nposter_size = \"x_large\"\n").unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.scraper.language, "de");
        assert_eq!(cfg.scraper.poster_size, PosterSize::XLarge);
        assert_eq!(cfg.scraper.country, "US");
        assert_eq!(cfg.scraper.artwork_providers, vec!["tmdb"]);
        assert_eq!(cfg.general, GeneralConfig::default());
    }

    #[test]
    fn missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        assert_eq!(load_config_from(&path).unwrap(), AppConfig::default());

        fs::write(&path, "[scraper\nlanguage = ").unwrap();
        assert!(matches!(
            load_config_from(&path),
            Err(ConfigError::Malformed { .. })
        ));
    }

    #[test]
    fn set_and_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = AppConfig::default();
        cfg.set("scraper.country", "de").unwrap();
        cfg.set("scraper.artwork_providers", "tmdb, fanart ,").unwrap();
        cfg.set("scraper.fanart_size", "medium").unwrap();
        cfg.set("general.data_dir", "/srv/tmm").unwrap();
        save_config(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded, cfg);
        assert_eq!(loaded.scraper.country, "DE");
        assert_eq!(loaded.scraper.artwork_providers, vec!["tmdb", "fanart"]);
        assert_eq!(loaded.data_dir(), PathBuf::from("/srv/tmm"));
    }

    #[test]
    fn set_rejects_bad_keys_and_values() {
        let mut cfg = AppConfig::default();
        assert!(matches!(
            cfg.set("scraper.nope", "x"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(cfg.set("language", "x"), Err(ConfigError::UnknownKey(_))));
        assert!(matches!(
            cfg.set("scraper.poster_size", "huge"),
            Err(ConfigError::NotAllowed { .. })
        ));
        assert_eq!(cfg.scraper.poster_size, PosterSize::Big);
    }
}

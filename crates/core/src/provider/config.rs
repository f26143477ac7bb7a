//! Per-provider settings, persisted as `scraper_<id>.conf`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::crypto::{decrypt_field, encrypt_field};
use super::properties;
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigType {
    Bool,
    Text,
    /// One of the possible values.
    Select,
    /// One of the possible values, read back as its position in the list.
    SelectIndex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub key: String,
    pub config_type: ConfigType,
    pub value: String,
    pub default_value: String,
    pub possible_values: Vec<String>,
    /// Stored encrypted on disk.
    pub encrypt: bool,
}

impl ConfigEntry {
    fn new(key: &str, config_type: ConfigType, default_value: &str) -> Self {
        Self {
            key: key.to_string(),
            config_type,
            value: default_value.to_string(),
            default_value: default_value.to_string(),
            possible_values: Vec::new(),
            encrypt: false,
        }
    }

    /// Value for display; encrypted entries are masked.
    pub fn display_value(&self) -> String {
        if self.encrypt && !self.value.is_empty() {
            "*".repeat(8)
        } else {
            self.value.clone()
        }
    }
}

/// Settings of one provider: an ordered set of typed entries.
#[derive(Debug, Clone, Default)]
pub struct MediaProviderConfig {
    id: String,
    entries: Vec<ConfigEntry>,
}

impl MediaProviderConfig {
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            id: provider_id.into(),
            entries: Vec::new(),
        }
    }

    pub fn provider_id(&self) -> &str {
        &self.id
    }

    pub fn has_config(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ConfigEntry] {
        &self.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn entry(&self, key: &str) -> Option<&ConfigEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    fn entry_mut(&mut self, key: &str) -> Option<&mut ConfigEntry> {
        self.entries.iter_mut().find(|e| e.key == key)
    }

    fn put(&mut self, entry: ConfigEntry) {
        match self.entry_mut(&entry.key) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn add_bool(&mut self, key: &str, default_value: bool) {
        self.put(ConfigEntry::new(
            key,
            ConfigType::Bool,
            &default_value.to_string(),
        ));
    }

    pub fn add_text(&mut self, key: &str, default_value: &str) {
        self.add_text_with(key, default_value, false);
    }

    /// Text entry; with `encrypt` set the value is stored encrypted.
    pub fn add_text_with(&mut self, key: &str, default_value: &str, encrypt: bool) {
        let mut entry = ConfigEntry::new(key, ConfigType::Text, default_value);
        entry.encrypt = encrypt;
        self.put(entry);
    }

    pub fn add_select(&mut self, key: &str, possible_values: &[&str], default_value: &str) {
        self.add_choice(key, ConfigType::Select, possible_values, default_value);
    }

    pub fn add_select_index(&mut self, key: &str, possible_values: &[&str], default_value: &str) {
        self.add_choice(key, ConfigType::SelectIndex, possible_values, default_value);
    }

    fn add_choice(
        &mut self,
        key: &str,
        config_type: ConfigType,
        possible_values: &[&str],
        default_value: &str,
    ) {
        let mut entry = ConfigEntry::new(key, config_type, "");
        entry.possible_values = possible_values.iter().map(|v| v.to_string()).collect();
        if entry.possible_values.iter().any(|v| v == default_value) {
            entry.default_value = default_value.to_string();
            entry.value = default_value.to_string();
        } else {
            warn!(
                "Will not set default value '{}={}' - not in the list of possible values",
                key, default_value
            );
        }
        self.put(entry);
    }

    /// Current value of `key`; empty (with a warning) for undefined keys.
    pub fn value(&self, key: &str) -> String {
        match self.entry(key) {
            Some(e) => e.value.clone(),
            None => {
                warn!("Could not get value for key '{}' - key not defined", key);
                String::new()
            }
        }
    }

    /// `None` when the value is not `true`/`false`.
    pub fn value_as_bool(&self, key: &str) -> Option<bool> {
        let value = self.value(key);
        match value.to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => {
                warn!("Not a boolean '{}={}'", key, value);
                None
            }
        }
    }

    /// Position of the current value among the possible values.
    pub fn value_as_index(&self, key: &str) -> Option<usize> {
        let entry = self.entry(key)?;
        entry.possible_values.iter().position(|v| *v == entry.value)
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let Some(entry) = self.entry_mut(key) else {
            warn!("Could not set '{}={}' - key not defined", key, value);
            return Err(ConfigError::UnknownKey(key.to_string()));
        };
        let value = match entry.config_type {
            ConfigType::Bool => match value.to_ascii_lowercase().as_str() {
                v @ ("true" | "false") => v.to_string(),
                _ => {
                    warn!("Could not set '{}={}' - not a boolean", key, value);
                    return Err(ConfigError::NotBoolean {
                        key: key.to_string(),
                        value: value.to_string(),
                    });
                }
            },
            _ => value.to_string(),
        };
        if !entry.possible_values.is_empty() && !entry.possible_values.contains(&value) {
            warn!("Could not set '{}={}' - not in defined range", key, value);
            return Err(ConfigError::NotAllowed {
                key: key.to_string(),
                value,
            });
        }
        entry.value = value;
        Ok(())
    }

    pub fn set_bool(&mut self, key: &str, value: bool) -> Result<(), ConfigError> {
        self.set_value(key, &value.to_string())
    }

    pub fn reset(&mut self) {
        for entry in &mut self.entries {
            entry.value = entry.default_value.clone();
        }
    }

    pub fn file_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("scraper_{}.conf", self.id))
    }

    /// Load stored values from `dir`. Missing keys take their defaults; an
    /// unreadable file keeps all defaults.
    pub fn load_from_dir(&mut self, dir: &Path) {
        if self.entries.is_empty() {
            return;
        }
        let path = self.file_path(dir);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), "Cannot load settings ({}) - using defaults", e);
                return;
            }
        };
        let stored = properties::parse(&text);
        for entry in &mut self.entries {
            let raw = stored
                .iter()
                .rev()
                .find(|(k, _)| *k == entry.key)
                .map(|(_, v)| v.as_str());
            let value = match raw {
                Some(raw) if entry.encrypt && !raw.is_empty() => {
                    match decrypt_field(&entry.key, raw) {
                        Ok(plain) => Some(plain),
                        Err(e) => {
                            warn!("{} - using default", e);
                            None
                        }
                    }
                }
                Some(raw) => Some(raw.to_string()),
                None => None,
            };
            entry.value = value.unwrap_or_else(|| entry.default_value.clone());
        }
        debug!(provider = %self.id, path = %path.display(), "Loaded provider settings");
    }

    /// Write all values to `dir`, encrypting where requested.
    pub fn save_to_dir(&self, dir: &Path) -> Result<(), ConfigError> {
        if self.entries.is_empty() {
            return Ok(());
        }
        let mut pairs = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let value = if entry.encrypt && !entry.value.is_empty() {
                encrypt_field(&entry.key, &entry.value)?
            } else {
                entry.value.clone()
            };
            pairs.push((entry.key.clone(), value));
        }

        let path = self.file_path(dir);
        fs::create_dir_all(dir)?;
        fs::write(&path, properties::write(&pairs)).map_err(|e| {
            warn!(path = %path.display(), "Cannot write settings: {}", e);
            ConfigError::Io(e)
        })?;
        debug!(provider = %self.id, path = %path.display(), "Saved provider settings");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MediaProviderConfig {
        let mut c = MediaProviderConfig::new("tmdb");
        c.add_text_with("apiKey", "", true);
        c.add_text("language", "en");
        c.add_bool("includeAdult", false);
        c.add_select("imageSize", &["w342", "w500", "original"], "w500");
        c.add_select_index("quality", &["low", "mid", "high"], "mid");
        c
    }

    #[test]
    fn defaults_and_typed_getters() {
        let c = sample();
        assert_eq!(c.value("imageSize"), "w500");
        assert_eq!(c.value_as_bool("includeAdult"), Some(false));
        assert_eq!(c.value_as_bool("language"), None);
        assert_eq!(c.value_as_index("quality"), Some(1));
        assert_eq!(c.value("nope"), "");
        assert!(!c.entry("language").unwrap().encrypt);
        assert!(c.entry("apiKey").unwrap().encrypt);
    }

    #[test]
    fn set_value_validates() {
        let mut c = sample();
        assert!(matches!(c.set_value("nope", "x"), Err(ConfigError::UnknownKey(_))));
        assert!(matches!(
            c.set_value("imageSize", "w92"),
            Err(ConfigError::NotAllowed { .. })
        ));
        assert_eq!(c.value("imageSize"), "w500");
        assert!(matches!(
            c.set_value("includeAdult", "yes"),
            Err(ConfigError::NotBoolean { .. })
        ));

        c.set_value("imageSize", "original").unwrap();
        c.set_bool("includeAdult", true).unwrap();
        c.set_value("quality", "high").unwrap();
        assert_eq!(c.value("imageSize"), "original");
        assert_eq!(c.value_as_bool("includeAdult"), Some(true));
        assert_eq!(c.value_as_index("quality"), Some(2));
    }

    #[test]
    fn default_outside_possible_values_is_dropped() {
        let mut c = MediaProviderConfig::new("x");
        c.add_select("size", &["a", "b"], "c");
        assert_eq!(c.value("size"), "");
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = sample();
        c.set_value("apiKey", "my-secret").unwrap();
        c.set_value("imageSize", "original").unwrap();
        c.save_to_dir(dir.path()).unwrap();

        let text = fs::read_to_string(dir.path().join("scraper_tmdb.conf")).unwrap();
        assert!(!text.contains("my-secret"));
        assert!(text.contains("imageSize=original"));

        let mut loaded = sample();
        loaded.load_from_dir(dir.path());
        assert_eq!(loaded.value("apiKey"), "my-secret");
        assert_eq!(loaded.value("imageSize"), "original");
        assert_eq!(loaded.value("language"), "en");
    }

    #[test]
    fn missing_or_broken_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = sample();
        c.load_from_dir(dir.path());
        assert_eq!(c.value("imageSize"), "w500");

        fs::write(
            dir.path().join("scraper_tmdb.conf"),
            "apiKey=garbage\nlanguage=de\n",
        )
        .unwrap();
        c.load_from_dir(dir.path());
        assert_eq!(c.value("apiKey"), "");
        assert_eq!(c.value("language"), "de");
        assert_eq!(c.value("includeAdult"), "false");
    }

    #[test]
    fn display_masks_secrets() {
        let mut c = sample();
        c.set_value("apiKey", "abc").unwrap();
        assert_eq!(c.entry("apiKey").unwrap().display_value(), "********");
        assert_eq!(c.entry("language").unwrap().display_value(), "en");
    }
}

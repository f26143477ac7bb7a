//! Metadata providers: the common trait, capability traits and provider info.

pub mod config;
pub mod crypto;
pub mod properties;
pub mod registry;
pub mod tmdb;

use std::fmt;
use std::path::Path;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::entities::{MediaArtwork, MediaTrailer};
use crate::error::ScrapeError;
use crate::metadata::MediaMetadata;
use crate::options::{ScrapeOptions, SearchOptions};
use crate::search::MediaSearchResult;

pub use config::{ConfigEntry, ConfigType, MediaProviderConfig};
pub use registry::{MediaProviders, MediaScraper, ProviderEnv, ProviderFactory, ScraperType};

/// Static description of a provider plus its settings.
pub struct MediaProviderInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub version: String,
    config: RwLock<MediaProviderConfig>,
}

impl MediaProviderInfo {
    pub fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            config: RwLock::new(MediaProviderConfig::new(id)),
        }
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn with_config(self, config: MediaProviderConfig) -> Self {
        *self.config.write() = config;
        self
    }

    pub fn config(&self) -> RwLockReadGuard<'_, MediaProviderConfig> {
        self.config.read()
    }

    pub fn config_mut(&self) -> RwLockWriteGuard<'_, MediaProviderConfig> {
        self.config.write()
    }

    pub fn load_config(&self, data_dir: &Path) {
        self.config.write().load_from_dir(data_dir);
    }
}

impl fmt::Debug for MediaProviderInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaProviderInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("version", &self.version)
            .finish()
    }
}

/// Implemented by every provider. Capabilities are discovered through the
/// `as_*` accessors; a provider overrides the ones it supports.
pub trait MediaProvider: Send + Sync {
    fn info(&self) -> &MediaProviderInfo;

    fn id(&self) -> &str {
        &self.info().id
    }

    fn as_movie_metadata(&self) -> Option<&dyn MovieMetadataProvider> {
        None
    }

    fn as_tv_show_metadata(&self) -> Option<&dyn TvShowMetadataProvider> {
        None
    }

    fn as_artwork(&self) -> Option<&dyn ArtworkProvider> {
        None
    }

    fn as_trailer(&self) -> Option<&dyn TrailerProvider> {
        None
    }
}

pub trait MovieMetadataProvider: MediaProvider {
    fn search(&self, options: &SearchOptions) -> Result<Vec<MediaSearchResult>, ScrapeError>;
    fn get_metadata(&self, options: &ScrapeOptions) -> Result<MediaMetadata, ScrapeError>;
}

pub trait TvShowMetadataProvider: MediaProvider {
    fn search(&self, options: &SearchOptions) -> Result<Vec<MediaSearchResult>, ScrapeError>;
    fn get_metadata(&self, options: &ScrapeOptions) -> Result<MediaMetadata, ScrapeError>;
    fn get_episode_list(&self, options: &ScrapeOptions) -> Result<Vec<MediaMetadata>, ScrapeError>;
}

pub trait ArtworkProvider: MediaProvider {
    fn get_artwork(&self, options: &ScrapeOptions) -> Result<Vec<MediaArtwork>, ScrapeError>;
}

pub trait TrailerProvider: MediaProvider {
    fn get_trailers(&self, options: &ScrapeOptions) -> Result<Vec<MediaTrailer>, ScrapeError>;
}

/// Names of the capabilities `provider` offers, for listings.
pub fn capabilities(provider: &dyn MediaProvider) -> Vec<&'static str> {
    let mut caps = Vec::new();
    if provider.as_movie_metadata().is_some() {
        caps.push("movie");
    }
    if provider.as_tv_show_metadata().is_some() {
        caps.push("tvshow");
    }
    if provider.as_artwork().is_some() {
        caps.push("artwork");
    }
    if provider.as_trailer().is_some() {
        caps.push("trailer");
    }
    caps
}

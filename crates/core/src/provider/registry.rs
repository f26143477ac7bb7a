//! The set of available providers.
//!
//! Built once at startup from a list of factories and read afterwards. It is
//! handed around by reference (inside a `ScraperContext`) instead of living in
//! a global.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{
    ArtworkProvider, MediaProvider, MovieMetadataProvider, TrailerProvider,
    TvShowMetadataProvider,
};
use crate::error::{ParseNameError, ProviderError};
use crate::genres::GenreRegistry;

/// What a scraper is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScraperType {
    Movie,
    TvShow,
    MovieArtwork,
    TvShowArtwork,
    MovieTrailer,
}

impl ScraperType {
    pub const ALL: [ScraperType; 5] = [
        Self::Movie,
        Self::TvShow,
        Self::MovieArtwork,
        Self::TvShowArtwork,
        Self::MovieTrailer,
    ];

    /// Whether `provider` has the capability this scraper type needs.
    pub fn supported_by(self, provider: &dyn MediaProvider) -> bool {
        match self {
            Self::Movie => provider.as_movie_metadata().is_some(),
            Self::TvShow => provider.as_tv_show_metadata().is_some(),
            Self::MovieArtwork | Self::TvShowArtwork => provider.as_artwork().is_some(),
            Self::MovieTrailer => provider.as_trailer().is_some(),
        }
    }

    fn from_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "movie" => Some(Self::Movie),
            "tv_show" | "tvshow" => Some(Self::TvShow),
            "movie_artwork" => Some(Self::MovieArtwork),
            "tv_show_artwork" | "tvshow_artwork" => Some(Self::TvShowArtwork),
            "movie_trailer" | "trailer" => Some(Self::MovieTrailer),
            _ => None,
        }
    }
}

impl fmt::Display for ScraperType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Movie => "movie",
            Self::TvShow => "tv_show",
            Self::MovieArtwork => "movie_artwork",
            Self::TvShowArtwork => "tv_show_artwork",
            Self::MovieTrailer => "movie_trailer",
        };
        f.write_str(s)
    }
}

/// A provider viewed as a scraper of one type.
#[derive(Clone)]
pub struct MediaScraper {
    pub scraper_type: ScraperType,
    provider: Arc<dyn MediaProvider>,
}

impl MediaScraper {
    pub fn id(&self) -> &str {
        self.provider.id()
    }

    pub fn name(&self) -> &str {
        &self.provider.info().name
    }

    pub fn description(&self) -> &str {
        &self.provider.info().description
    }

    pub fn provider(&self) -> &Arc<dyn MediaProvider> {
        &self.provider
    }

    pub fn movie_metadata(&self) -> Option<&dyn MovieMetadataProvider> {
        self.provider.as_movie_metadata()
    }

    pub fn tv_show_metadata(&self) -> Option<&dyn TvShowMetadataProvider> {
        self.provider.as_tv_show_metadata()
    }

    pub fn artwork(&self) -> Option<&dyn ArtworkProvider> {
        self.provider.as_artwork()
    }

    pub fn trailer(&self) -> Option<&dyn TrailerProvider> {
        self.provider.as_trailer()
    }
}

impl fmt::Debug for MediaScraper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaScraper")
            .field("scraper_type", &self.scraper_type)
            .field("id", &self.id())
            .finish()
    }
}

/// What provider factories get to build a provider.
#[derive(Clone)]
pub struct ProviderEnv {
    pub genres: Arc<GenreRegistry>,
    /// Folder holding the `scraper_<id>.conf` files.
    pub data_dir: PathBuf,
}

pub type ProviderFactory =
    Box<dyn Fn(&ProviderEnv) -> Result<Arc<dyn MediaProvider>, ProviderError> + Send + Sync>;

#[derive(Default)]
pub struct MediaProviders {
    providers: RwLock<Vec<Arc<dyn MediaProvider>>>,
}

impl MediaProviders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from `factories`. A factory that fails is logged and
    /// its provider left out. Each provider's settings are loaded from the
    /// data folder.
    pub fn from_factories<I>(env: &ProviderEnv, factories: I) -> Self
    where
        I: IntoIterator<Item = ProviderFactory>,
    {
        let registry = Self::new();
        for factory in factories {
            let provider = match factory(env) {
                Ok(p) => p,
                Err(e) => {
                    warn!("Skipping provider: {}", e);
                    continue;
                }
            };
            provider.info().load_config(&env.data_dir);
            if let Err(e) = registry.register(provider) {
                warn!("Skipping provider: {}", e);
            }
        }
        info!(count = registry.len(), "Provider registry ready");
        registry
    }

    pub fn register(&self, provider: Arc<dyn MediaProvider>) -> Result<(), ProviderError> {
        let mut providers = self.providers.write();
        let id = provider.id().to_string();
        if providers.iter().any(|p| p.id() == id) {
            return Err(ProviderError::Duplicate(id));
        }
        debug!(provider = %id, "Registered provider");
        providers.push(provider);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn MediaProvider>> {
        self.providers.read().iter().find(|p| p.id() == id).cloned()
    }

    pub fn get_required(&self, id: &str) -> Result<Arc<dyn MediaProvider>, ProviderError> {
        self.get(id)
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))
    }

    /// All providers in registration order.
    pub fn all(&self) -> Vec<Arc<dyn MediaProvider>> {
        self.providers.read().clone()
    }

    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }

    /// Providers that can act as `scraper_type`.
    pub fn providers_for(&self, scraper_type: ScraperType) -> Vec<Arc<dyn MediaProvider>> {
        self.providers
            .read()
            .iter()
            .filter(|p| scraper_type.supported_by(p.as_ref()))
            .cloned()
            .collect()
    }

    pub fn scrapers(&self, scraper_type: ScraperType) -> Vec<MediaScraper> {
        self.providers_for(scraper_type)
            .into_iter()
            .map(|provider| MediaScraper {
                scraper_type,
                provider,
            })
            .collect()
    }

    /// The provider `id` as a scraper of `scraper_type`.
    pub fn scraper(&self, scraper_type: ScraperType, id: &str) -> Result<MediaScraper, ProviderError> {
        let provider = self.get_required(id)?;
        if !scraper_type.supported_by(provider.as_ref()) {
            return Err(ProviderError::MissingCapability {
                id: id.to_string(),
                capability: scraper_type.to_string(),
            });
        }
        Ok(MediaScraper {
            scraper_type,
            provider,
        })
    }
}

impl FromStr for ScraperType {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ParseNameError::new("scraper type", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubProvider;

    fn env() -> ProviderEnv {
        ProviderEnv {
            genres: GenreRegistry::new("en"),
            data_dir: std::env::temp_dir().join("tmm-registry-test-missing"),
        }
    }

    #[test]
    fn duplicates_are_rejected() {
        let reg = MediaProviders::new();
        reg.register(Arc::new(StubProvider::movie("a"))).unwrap();
        let err = reg.register(Arc::new(StubProvider::movie("a"))).unwrap_err();
        assert!(matches!(err, ProviderError::Duplicate(id) if id == "a"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn typed_lookups() {
        let reg = MediaProviders::new();
        reg.register(Arc::new(StubProvider::movie("meta"))).unwrap();
        reg.register(Arc::new(StubProvider::artwork("art"))).unwrap();

        let movie: Vec<_> = reg.scrapers(ScraperType::Movie).iter().map(|s| s.id().to_string()).collect();
        assert_eq!(movie, vec!["meta"]);
        let art: Vec<_> = reg.scrapers(ScraperType::MovieArtwork).iter().map(|s| s.id().to_string()).collect();
        assert_eq!(art, vec!["art"]);
        assert!(reg.scrapers(ScraperType::TvShow).is_empty());

        let s = reg.scraper(ScraperType::Movie, "meta").unwrap();
        assert!(s.movie_metadata().is_some());
        assert!(s.artwork().is_none());

        assert!(matches!(
            reg.scraper(ScraperType::MovieTrailer, "meta"),
            Err(ProviderError::MissingCapability { .. })
        ));
        assert!(matches!(
            reg.scraper(ScraperType::Movie, "nope"),
            Err(ProviderError::NotFound(_))
        ));
    }

    #[test]
    fn failing_factory_is_skipped() {
        fn ok() -> Result<Arc<dyn MediaProvider>, ProviderError> {
            Ok(Arc::new(StubProvider::movie("ok")))
        }
        let factories: Vec<ProviderFactory> = vec![
            Box::new(|_env: &ProviderEnv| ok()),
            Box::new(
                |_env: &ProviderEnv| -> Result<Arc<dyn MediaProvider>, ProviderError> {
                    Err(ProviderError::Init {
                        id: "broken".into(),
                        message: "no network".into(),
                    })
                },
            ),
            Box::new(|_env: &ProviderEnv| ok()),
        ];
        let reg = MediaProviders::from_factories(&env(), factories);
        assert_eq!(reg.len(), 1);
        assert!(reg.get("ok").is_some());
        assert!(reg.get("broken").is_none());
    }

    #[test]
    fn scraper_type_names() {
        for t in ScraperType::ALL {
            assert_eq!(t.to_string().parse::<ScraperType>(), Ok(t));
        }
    }
}

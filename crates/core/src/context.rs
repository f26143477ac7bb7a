//! Everything a search or scrape needs, built once at startup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::entities::MediaType;
use crate::error::{ProviderError, TmmError};
use crate::genres::GenreRegistry;
use crate::options::{ScrapeOptions, SearchOptions};
use crate::provider::{
    tmdb, MediaProviders, MediaScraper, ProviderEnv, ProviderFactory, ScraperType,
};
use crate::scrape::ScrapeJob;
use crate::search::MediaSearchResult;
use crate::similarity;

/// Providers compiled into this build.
pub fn default_factories() -> Vec<ProviderFactory> {
    vec![tmdb::factory()]
}

pub struct ScraperContext {
    pub config: AppConfig,
    pub genres: Arc<GenreRegistry>,
    pub providers: MediaProviders,
    data_dir: PathBuf,
}

impl ScraperContext {
    pub fn new(config: AppConfig) -> Self {
        Self::with_factories(config, default_factories())
    }

    pub fn with_factories<I>(config: AppConfig, factories: I) -> Self
    where
        I: IntoIterator<Item = ProviderFactory>,
    {
        let data_dir = config.data_dir();
        let genres = GenreRegistry::new(config.scraper.language.as_str());
        let env = ProviderEnv {
            genres: genres.clone(),
            data_dir: data_dir.clone(),
        };
        let providers = MediaProviders::from_factories(&env, factories);
        info!(data_dir = %data_dir.display(), "Scraper context ready");
        Self {
            config,
            genres,
            providers,
            data_dir,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn search_options(&self, media_type: MediaType, query: &str) -> SearchOptions {
        let mut options = SearchOptions::new(media_type, query);
        options.language = self.config.scraper.language.clone();
        options.country = self.config.scraper.country.clone();
        options
    }

    pub fn scrape_options(&self, result: &MediaSearchResult) -> ScrapeOptions {
        let mut options = ScrapeOptions::from_search_result(result);
        self.apply_scrape_settings(&mut options);
        options
    }

    /// Options for scraping by known ids, without a search.
    pub fn scrape_options_for(&self, media_type: MediaType) -> ScrapeOptions {
        let mut options = ScrapeOptions::new(media_type);
        self.apply_scrape_settings(&mut options);
        options
    }

    fn apply_scrape_settings(&self, options: &mut ScrapeOptions) {
        let s = &self.config.scraper;
        options.language = s.language.clone();
        options.country = s.country.clone();
        options.poster_size = s.poster_size;
        options.fanart_size = s.fanart_size;
    }

    /// The configured scrapers, with `metadata_provider` overriding the
    /// main provider. Secondary providers that are missing or lack the
    /// capability are logged and left out.
    pub fn scrape_job(&self, metadata_provider: Option<&str>) -> Result<ScrapeJob, ProviderError> {
        self.scrape_job_for(MediaType::Movie, metadata_provider)
    }

    /// Like [`scrape_job`](Self::scrape_job) for any media type. TV shows use
    /// `tv_show_provider` and the artwork providers that support TV; they
    /// have no fallback or trailer providers.
    pub fn scrape_job_for(
        &self,
        media_type: MediaType,
        metadata_provider: Option<&str>,
    ) -> Result<ScrapeJob, ProviderError> {
        let s = &self.config.scraper;
        if matches!(media_type, MediaType::TvShow | MediaType::TvEpisode) {
            let main_id = metadata_provider.unwrap_or(&s.tv_show_provider);
            let mut job = ScrapeJob::new(self.providers.scraper(ScraperType::TvShow, main_id)?);
            job.artwork = self.optional_scrapers(ScraperType::TvShowArtwork, &s.artwork_providers, "");
            return Ok(job);
        }

        let main_id = metadata_provider.unwrap_or(&s.movie_provider);
        let mut job = ScrapeJob::new(self.providers.scraper(ScraperType::Movie, main_id)?);
        job.fallback = self.optional_scrapers(ScraperType::Movie, &s.fallback_providers, main_id);
        job.artwork = self.optional_scrapers(ScraperType::MovieArtwork, &s.artwork_providers, "");
        job.trailers = self.optional_scrapers(ScraperType::MovieTrailer, &s.trailer_providers, "");
        Ok(job)
    }

    fn optional_scrapers(
        &self,
        scraper_type: ScraperType,
        ids: &[String],
        skip: &str,
    ) -> Vec<MediaScraper> {
        ids.iter()
            .filter(|id| id.as_str() != skip)
            .filter_map(|id| match self.providers.scraper(scraper_type, id) {
                Ok(s) => Some(s),
                Err(e) => {
                    warn!("Ignoring {} provider: {}", scraper_type, e);
                    None
                }
            })
            .collect()
    }

    /// Sort title using the configured prefixes ("Matrix, The").
    pub fn sortable_title(&self, title: &str) -> String {
        similarity::sortable_name(title, self.config.general.title_prefixes.as_slice())
    }

    /// Persist the settings of provider `id` to the data folder.
    pub fn save_provider_config(&self, id: &str) -> Result<(), TmmError> {
        let provider = self.providers.get_required(id)?;
        provider.info().config().save_to_dir(&self.data_dir)?;
        Ok(())
    }
}
